/*!
 * Tests for writing localized text back into pages
 */

use page_localizer::document::{DocumentModel, HtmlDocument};
use page_localizer::localization::{
    ExtractionOptions, LocalizationResult, ReplacementEngine, TextUnit, TextUnitExtractor,
};

use crate::common;

const LANDING_SPANISH: &[(&str, &str)] = &[
    ("TEXT_0", "Crea hoy el sitio web de tus sueños"),
    ("TEXT_1", "Diseño web rápido, cercano y accesible"),
    ("TEXT_2", "Por qué nos eligen nuestros clientes"),
    ("TEXT_3", "Consulta gratuita para cada proyecto"),
    ("TEXT_4", "Diseños adaptables a todos los dispositivos"),
    ("TEXT_5", "Empieza tu proyecto ahora"),
    ("ALT_6", "Nuestro equipo de diseño trabajando"),
];

fn extract(html: &str) -> Vec<TextUnit> {
    TextUnitExtractor::default().extract(&HtmlDocument::parse(html))
}

fn result(pairs: &[(&str, &str)]) -> LocalizationResult {
    pairs
        .iter()
        .map(|(id, text)| (id.to_string(), text.to_string()))
        .collect()
}

/// Test the two-element page from end to end
#[test]
fn test_apply_withIdAndClassLocators_shouldLocalizeBoth() {
    let html = r#"<h1 id="h">Welcome</h1><p class="intro">Visit us today.</p>"#;
    let extractor = TextUnitExtractor::new(ExtractionOptions {
        min_text_length: 3,
        ..Default::default()
    });
    let mut doc = HtmlDocument::parse(html);
    let units = extractor.extract(&doc);
    assert_eq!(units.len(), 2);

    let report = ReplacementEngine::new().apply(
        &mut doc,
        &units,
        &result(&[("TEXT_0", "Bienvenido"), ("TEXT_1", "Visítanos hoy.")]),
    );

    assert_eq!(
        doc.serialize().unwrap(),
        r#"<h1 id="h">Bienvenido</h1><p class="intro">Visítanos hoy.</p>"#
    );
    assert_eq!(report.applied.len(), 2);
    assert_eq!(report.nodes_written, 2);
}

/// Test that every landing page unit lands and markup survives
#[test]
fn test_apply_withLandingPage_shouldLocalizeEveryUnitAndKeepMarkup() {
    let units = extract(common::LANDING_PAGE);
    let mut doc = HtmlDocument::parse(common::LANDING_PAGE);
    let elements_before = doc.elements().len();

    let report = ReplacementEngine::new().apply(&mut doc, &units, &result(LANDING_SPANISH));
    let output = doc.serialize().unwrap();

    let mut applied = report.applied.clone();
    applied.sort();
    let mut expected: Vec<&str> = LANDING_SPANISH.iter().map(|(id, _)| *id).collect();
    expected.sort();
    assert_eq!(applied, expected);
    assert!(report.skipped.is_empty());
    assert!(report.untouched.is_empty());

    for (_, localized) in LANDING_SPANISH {
        assert!(output.contains(localized), "missing {:?} in {}", localized, output);
    }
    assert!(output.contains(r#"<a class="btn btn-primary" href="/start">"#));
    assert!(output.contains(r#"var greeting = "Build your dream website today";"#));
    assert_eq!(HtmlDocument::parse(&output).elements().len(), elements_before);
}

/// Test that an empty result leaves the page byte-identical
#[test]
fn test_apply_withEmptyResult_shouldChangeNothing() {
    for html in [common::LANDING_PAGE, common::FULL_DOCUMENT] {
        let units = extract(html);
        let mut doc = HtmlDocument::parse(html);

        let report = ReplacementEngine::new().apply(&mut doc, &units, &LocalizationResult::new());

        assert_eq!(doc.serialize().unwrap(), html);
        assert_eq!(report.nodes_written, 0);
        assert_eq!(report.untouched.len(), units.len());
    }
}

/// Test that a partial result only rewrites its own units
#[test]
fn test_apply_withPartialResult_shouldLeaveOthersUntouched() {
    let units = extract(common::LANDING_PAGE);
    let mut doc = HtmlDocument::parse(common::LANDING_PAGE);

    let report = ReplacementEngine::new().apply(
        &mut doc,
        &units,
        &result(&[("TEXT_3", "Consulta gratuita para cada proyecto")]),
    );
    let output = doc.serialize().unwrap();

    assert_eq!(report.applied, vec!["TEXT_3"]);
    assert_eq!(report.untouched.len(), units.len() - 1);
    assert!(output.contains("<li>Consulta gratuita para cada proyecto</li><li>Responsive designs on all devices</li>"));
    assert!(output.contains("Build your dream website today</h1>"));
}

/// Test that a unit whose node vanished is reported as skipped
#[test]
fn test_apply_withChangedDocument_shouldSkipMissingNodes() {
    let units = extract(common::LANDING_PAGE);
    let edited = common::LANDING_PAGE.replace("Why customers choose us", "Something else entirely");
    let mut doc = HtmlDocument::parse(&edited);

    let report = ReplacementEngine::new().apply(&mut doc, &units, &result(LANDING_SPANISH));

    assert_eq!(report.skipped, vec!["TEXT_2"]);
    assert_eq!(report.applied.len(), LANDING_SPANISH.len() - 1);
    assert!(doc.serialize().unwrap().contains("<h2>Something else entirely</h2>"));
}

/// Test that a full document keeps its head and style untouched
#[test]
fn test_apply_withFullDocument_shouldKeepHeadAndStyle() {
    let units = extract(common::FULL_DOCUMENT);
    let mut doc = HtmlDocument::parse(common::FULL_DOCUMENT);

    let localized: LocalizationResult = units
        .iter()
        .map(|u| (u.id.clone(), format!("ES: {}", u.original_text)))
        .collect();
    ReplacementEngine::new().apply(&mut doc, &units, &localized);
    let output = doc.serialize().unwrap();

    assert!(output.starts_with("<!DOCTYPE html><html lang=\"en\"><head><title>Acme</title>"));
    assert!(output.contains("<style>h1 { color: red; }</style>"));
    assert!(output.contains("<h1 id=\"t\">ES: Welcome to Acme Industries</h1>"));
    assert!(output.contains("<p>ES: We make everything you could need.</p>"));
}
