/*!
 * Tests for language utilities
 */

use page_localizer::language_utils::{display_name, is_rtl, normalize_to_part3};
use page_localizer::localization::LocalizationRequest;

/// Test normalization of ISO 639 codes
#[test]
fn test_normalizeToPart3_withVariousCodes_shouldNormalize() {
    assert_eq!(normalize_to_part3("es").unwrap(), "spa");
    assert_eq!(normalize_to_part3(" FR ").unwrap(), "fra");
    assert_eq!(normalize_to_part3("deu").unwrap(), "deu");
    assert_eq!(normalize_to_part3("ger").unwrap(), "deu");
    assert!(normalize_to_part3("xx").is_err());
    assert!(normalize_to_part3("Spanish").is_err());
}

/// Test that prompts get English names for codes and verbatim free-form names
#[test]
fn test_displayName_withCodesAndNames_shouldResolve() {
    assert_eq!(display_name("es"), "Spanish");
    assert_eq!(display_name("jpn"), "Japanese");
    assert_eq!(display_name("Brazilian Portuguese"), "Brazilian Portuguese");
    assert_eq!(LocalizationRequest::new("de", "Austria").language_name(), "German");
}

/// Test right-to-left detection
#[test]
fn test_isRtl_withRtlAndLtrLanguages_shouldDetect() {
    assert!(is_rtl("ar"));
    assert!(is_rtl("heb"));
    assert!(is_rtl("Hebrew"));
    assert!(!is_rtl("en"));
    assert!(!is_rtl("Spanish"));
}
