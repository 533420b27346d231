/*!
 * Tests for response parsing
 */

use page_localizer::errors::LocalizationError;
use page_localizer::localization::parser::{
    self, DOCUMENT_STRATEGIES, ParsedPayload, ResponseMode, UNIT_STRATEGIES,
};

/// Literal inputs and the `TEXT_0` value each must yield
const RECOVERABLE_CASES: &[(&str, &str)] = &[
    ("```json\n[{\"id\":\"TEXT_0\",\"localized\":\"Hola\"}]\n```", "Hola"),
    ("Here is the result:\n[{\"id\":\"TEXT_0\",\"localized\":\"Hola\"}]", "Hola"),
    ("garbage [{\"id\":\"TEXT_0\",\"localized\":\"Hola\"}] trailing", "Hola"),
    ("[{\"id\":\"TEXT_0\",\"localized\":\"Hola [mundo]\"}]", "Hola [mundo]"),
    ("```\n[\n  {\"id\": \"TEXT_0\", \"localized\": \"Hola\"}\n]\n```\nLet me know if you need changes.", "Hola"),
];

/// Test the recoverable response table
#[test]
fn test_parseUnits_withWrappedPayloads_shouldRecoverThem() {
    for (raw, expected) in RECOVERABLE_CASES {
        let result = parser::parse_units(raw)
            .unwrap_or_else(|e| panic!("failed to parse {:?}: {}", raw, e));
        assert_eq!(result.len(), 1, "input: {:?}", raw);
        assert_eq!(result.get("TEXT_0"), Some(*expected), "input: {:?}", raw);
    }
}

/// Test that an unparseable response fails loudly
#[test]
fn test_parseUnits_withNoBrackets_shouldFailWithParseFailed() {
    let error = parser::parse_units("no brackets at all").unwrap_err();

    match &error {
        LocalizationError::ParseFailed { strategies, response_len } => {
            let expected: Vec<&str> = UNIT_STRATEGIES.iter().map(|(name, _)| *name).collect();
            assert_eq!(strategies, &expected);
            assert_eq!(*response_len, "no brackets at all".len());
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(error.to_string().contains("direct-array"));
}

/// Test that a syntactically broken array is not silently accepted
#[test]
fn test_parseUnits_withTruncatedJson_shouldFail() {
    let result = parser::parse_units("[{\"id\":\"TEXT_0\",\"localized\":\"Hol");
    assert!(matches!(result, Err(LocalizationError::ParseFailed { .. })));
}

/// Test that several units come back together
#[test]
fn test_parseUnits_withManyItems_shouldKeepEveryId() {
    let raw = r#"[{"id":"TEXT_0","localized":"Uno"},{"id":"TEXT_1","localized":"Dos"},{"id":"ALT_2","localized":"Tres"}]"#;
    let result = parser::parse_units(raw).unwrap();

    let ids: Vec<&str> = result.iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec!["ALT_2", "TEXT_0", "TEXT_1"]);
}

/// Test the document search order
#[test]
fn test_parseDocument_withDoctypeInProse_shouldPreferDoctypeSpan() {
    let raw = "Sure, here it is:\n<!DOCTYPE html>\n<html lang=\"es\"><head></head><body><h1>Hola</h1></body></html>\nHope this helps!";

    let document = parser::parse_document(raw).unwrap();

    assert!(document.starts_with("<!DOCTYPE html>"));
    assert!(document.ends_with("</html>"));
    assert_eq!(DOCUMENT_STRATEGIES[0].0, "output-tag");
}

/// Test that an incomplete document is rejected, never substituted
#[test]
fn test_parse_withBodylessDocument_shouldFailValidation() {
    let result = parser::parse("<!DOCTYPE html><html><head></head></html>", ResponseMode::Document);
    assert!(matches!(result, Err(LocalizationError::InvalidDocumentStructure(_))));
}

/// Test validation markers directly
#[test]
fn test_validateDocument_withCompleteDocument_shouldPass() {
    assert!(parser::validate_document("<HTML><BODY></BODY></HTML>").is_ok());
    assert!(parser::validate_document("<body></body>").is_err());
}

/// Test dispatch on response mode
#[test]
fn test_parse_withUnitMode_shouldReturnUnits() {
    match parser::parse("[{\"id\":\"TEXT_0\",\"localized\":\"Hola\"}]", ResponseMode::Units).unwrap() {
        ParsedPayload::Units(result) => assert_eq!(result.get("TEXT_0"), Some("Hola")),
        other => panic!("unexpected payload: {:?}", other),
    }
}
