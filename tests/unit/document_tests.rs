/*!
 * Tests for the html5ever document model
 */

use page_localizer::document::{DocumentModel, HtmlDocument, TextMatch};

use crate::common;

/// Test that fragments and full documents serialize back unchanged
#[test]
fn test_serialize_withUntouchedDocuments_shouldBeByteIdentical() {
    for html in [common::LANDING_PAGE, common::FULL_DOCUMENT] {
        let doc = HtmlDocument::parse(html);
        assert_eq!(doc.serialize().unwrap(), html);
    }
}

/// Test selection by id, tag and class
#[test]
fn test_selectors_withLandingPage_shouldFindElements() {
    let doc = HtmlDocument::parse(common::LANDING_PAGE);

    let hero = doc.select_by_id("hero-title").expect("hero title should exist");
    assert_eq!(doc.tag_name(hero).as_deref(), Some("h1"));

    let buttons = doc.select_by_tag_and_class("a", "btn-primary");
    assert_eq!(buttons.len(), 1);
    assert_eq!(doc.first_class(buttons[0]).as_deref(), Some("btn"));

    assert_eq!(doc.select_by_tag("li").len(), 2);
    assert!(doc.select_by_id("missing").is_none());
}

/// Test that replacing direct text leaves element count and attributes alone
#[test]
fn test_replaceDirectText_withNestedMarkup_shouldPreserveStructure() {
    let html = r#"<p id="p" class="lead">Call us <strong>today</strong> for a quote</p>"#;
    let mut doc = HtmlDocument::parse(html);
    let p = doc.select_by_id("p").unwrap();
    let elements_before = doc.elements().len();

    let written = doc.replace_direct_text(p, "for a quote", "para una cotización", TextMatch::Contains);

    assert_eq!(written, 1);
    assert_eq!(doc.elements().len(), elements_before);
    assert_eq!(doc.attribute(p, "class").as_deref(), Some("lead"));
    assert_eq!(
        doc.serialize().unwrap(),
        r#"<p id="p" class="lead">Call us <strong>today</strong> para una cotización</p>"#
    );
}

/// Test that protected tags are never rewritten
#[test]
fn test_replaceDirectText_onScript_shouldWriteNothing() {
    let mut doc = HtmlDocument::parse("<script>var x = 'hello world';</script>");
    let script = doc.select_by_tag("script")[0];

    assert_eq!(
        doc.replace_direct_text(script, "var x = 'hello world';", "nope", TextMatch::Exact),
        0
    );
}

/// Test that attributes are only overwritten when present
#[test]
fn test_setAttribute_withMissingAttribute_shouldNotAddIt() {
    let mut doc = HtmlDocument::parse(r#"<img src="a.png" alt="A photo of the office">"#);
    let img = doc.select_by_tag("img")[0];

    assert!(doc.set_attribute(img, "alt", "Una foto de la oficina"));
    assert!(!doc.set_attribute(img, "title", "Nuevo"));
    assert_eq!(
        doc.serialize().unwrap(),
        r#"<img src="a.png" alt="Una foto de la oficina">"#
    );
}
