/*!
 * Language utilities for prompt construction.
 *
 * Target languages arrive either as ISO 639 codes ("es", "spa") or as
 * plain names ("Spanish"). Prompts always carry the English name.
 */

use anyhow::{Result, anyhow};
use isolang::Language;

/// Normalize a language code to ISO 639-3 (3-letter) format
pub fn normalize_to_part3(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    if normalized_code.len() == 2 {
        if let Some(lang) = Language::from_639_1(&normalized_code) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if normalized_code.len() == 3 {
        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(normalized_code);
        }

        // ISO 639-2/B codes that differ from their terminology form
        let part2t = match normalized_code.as_str() {
            "fre" => "fra",
            "ger" => "deu",
            "dut" => "nld",
            "gre" => "ell",
            "chi" => "zho",
            "cze" => "ces",
            "per" => "fas",
            "rum" => "ron",
            "slo" => "slk",
            _ => "",
        };
        if !part2t.is_empty() {
            return Ok(part2t.to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Get the English language name for a code, or pass a free-form name through
pub fn display_name(language: &str) -> String {
    match normalize_to_part3(language).ok().and_then(|code| Language::from_639_3(&code)) {
        Some(lang) => lang.to_name().to_string(),
        None => language.trim().to_string(),
    }
}

/// Whether the language is written right to left
pub fn is_rtl(language: &str) -> bool {
    let code = normalize_to_part3(language).ok().or_else(|| {
        Language::from_name(language.trim()).map(|lang| lang.to_639_3().to_string())
    });

    matches!(code.as_deref(), Some("ara" | "heb" | "fas" | "urd" | "pus" | "yid"))
}
