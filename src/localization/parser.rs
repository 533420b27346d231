/*!
 * Response parsing.
 *
 * Backends wrap their payload inconsistently: bare JSON, markdown fences,
 * chatty lead-ins, or a document buried in prose. Each extraction strategy
 * is a pure function from the raw response to an optional candidate, and
 * the cascade takes the first candidate that actually decodes.
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::LocalizationError;

use super::prompts::LocalizedPayload;
use super::units::LocalizationResult;

/// Candidate extractor: raw response to an optional payload text
pub type Strategy = fn(&str) -> Option<String>;

static OPENING_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^```(?:json|html)?\s*").unwrap());
static CLOSING_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*```\s*$").unwrap());
static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```(?:json)?\s*(.*?)\s*```").unwrap());
static LEAD_IN_PHRASES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?is)(?:here'?s? the|here is the|output|result|localized content).*?\n*(\[.*\])")
            .unwrap(),
        Regex::new(r"(?is)(?:begin|start).*?\n*(\[.*\])").unwrap(),
        Regex::new(r"(?s)\n\s*(\[.*\])").unwrap(),
    ]
});

static OUTPUT_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<output>(.*?)</output>").unwrap());
static DOCTYPE_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<!DOCTYPE.*?</html>").unwrap());
static HTML_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<html.*?</html>").unwrap());
static GREEDY_DOCTYPE_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<!DOCTYPE.+</html>").unwrap());

/// Unit mode strategies, in cascade order
pub const UNIT_STRATEGIES: &[(&str, Strategy)] = &[
    ("direct-array", direct_array),
    ("strip-fences", strip_fences),
    ("fenced-block", fenced_block),
    ("nuclear", nuclear),
    ("lead-in-phrase", lead_in_phrase),
];

/// Document mode strategies, in cascade order
pub const DOCUMENT_STRATEGIES: &[(&str, Strategy)] = &[
    ("output-tag", output_tag),
    ("doctype-span", doctype_span),
    ("html-span", html_span),
    ("whole-response", whole_response),
    ("greedy-doctype", greedy_doctype_span),
    ("index-scan", index_scan),
];

/// Shape of payload expected from the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// JSON array of `{id, localized}` objects
    Units,
    /// Complete HTML document
    Document,
}

/// Payload recovered from a response
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedPayload {
    Units(LocalizationResult),
    Document(String),
}

/// Parse a raw response according to `mode`
pub fn parse(raw: &str, mode: ResponseMode) -> Result<ParsedPayload, LocalizationError> {
    match mode {
        ResponseMode::Units => parse_units(raw).map(ParsedPayload::Units),
        ResponseMode::Document => parse_document(raw).map(ParsedPayload::Document),
    }
}

/// Recover the `id -> localized` map from a unit mode response.
///
/// Items without an id or a non-blank localized value are dropped; a candidate
/// that yields nothing counts as a failed strategy.
pub fn parse_units(raw: &str) -> Result<LocalizationResult, LocalizationError> {
    let mut attempted = Vec::with_capacity(UNIT_STRATEGIES.len());

    for (name, strategy) in UNIT_STRATEGIES {
        attempted.push(name.to_string());
        let Some(candidate) = strategy(raw) else {
            debug!("Strategy {} found no candidate", name);
            continue;
        };

        match serde_json::from_str::<Vec<LocalizedPayload>>(&candidate) {
            Ok(items) => {
                let result: LocalizationResult = items
                    .into_iter()
                    .filter_map(|item| Some((item.id?, item.localized?)))
                    .collect();
                if result.is_empty() {
                    debug!("Strategy {} decoded an array without usable items", name);
                    continue;
                }
                debug!("Strategy {} recovered {} item(s)", name, result.len());
                return Ok(result);
            }
            Err(e) => debug!("Strategy {} candidate is not a payload array: {}", name, e),
        }
    }

    warn!(
        "All parsing strategies failed for a {} char response: {}",
        raw.chars().count(),
        preview(raw)
    );
    Err(LocalizationError::ParseFailed {
        strategies: attempted,
        response_len: raw.chars().count(),
    })
}

/// Recover a complete, structurally valid document from a document mode response
pub fn parse_document(raw: &str) -> Result<String, LocalizationError> {
    let cleaned = strip_fence_markers(raw.trim());
    let mut attempted = Vec::with_capacity(DOCUMENT_STRATEGIES.len());

    for (name, strategy) in DOCUMENT_STRATEGIES {
        attempted.push(name.to_string());
        if let Some(candidate) = strategy(&cleaned) {
            debug!("Strategy {} found a {} char document", name, candidate.len());
            validate_document(&candidate)?;
            return Ok(candidate);
        }
    }

    warn!(
        "No document found in a {} char response: {}",
        raw.chars().count(),
        preview(raw)
    );
    Err(LocalizationError::ParseFailed {
        strategies: attempted,
        response_len: raw.chars().count(),
    })
}

/// Require opening and closing root and body markers
pub fn validate_document(html: &str) -> Result<(), LocalizationError> {
    let lower = html.to_ascii_lowercase();
    let missing: Vec<&str> = ["<html", "<body", "</body>", "</html>"]
        .into_iter()
        .filter(|marker| !lower.contains(marker))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(LocalizationError::InvalidDocumentStructure(format!(
            "missing {}",
            missing.join(", ")
        )))
    }
}

fn preview(raw: &str) -> String {
    raw.chars().take(200).collect()
}

fn strip_fence_markers(text: &str) -> String {
    let text = OPENING_FENCE.replace(text, "");
    CLOSING_FENCE.replace(&text, "").trim().to_string()
}

/// Span from the first `[` to the last `]`
fn bracket_span(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

fn direct_array(raw: &str) -> Option<String> {
    bracket_span(raw).map(str::to_string)
}

fn strip_fences(raw: &str) -> Option<String> {
    bracket_span(&strip_fence_markers(raw.trim())).map(str::to_string)
}

fn fenced_block(raw: &str) -> Option<String> {
    let inner = FENCED_BLOCK.captures(raw)?.get(1)?.as_str().trim();
    (inner.starts_with('[') && inner.contains(']')).then(|| inner.to_string())
}

fn nuclear(raw: &str) -> Option<String> {
    bracket_span(raw)
        .filter(|span| span.contains('"') && span.contains('{'))
        .map(str::to_string)
}

fn lead_in_phrase(raw: &str) -> Option<String> {
    LEAD_IN_PHRASES
        .iter()
        .find_map(|pattern| pattern.captures(raw)?.get(1).map(|m| m.as_str().to_string()))
}

fn output_tag(text: &str) -> Option<String> {
    OUTPUT_TAG
        .captures(text)?
        .get(1)
        .map(|m| m.as_str().trim().to_string())
}

fn doctype_span(text: &str) -> Option<String> {
    DOCTYPE_SPAN.find(text).map(|m| m.as_str().trim().to_string())
}

fn html_span(text: &str) -> Option<String> {
    HTML_SPAN.find(text).map(|m| m.as_str().trim().to_string())
}

fn whole_response(text: &str) -> Option<String> {
    let lower = text.trim_start().to_ascii_lowercase();
    (lower.starts_with("<!doctype") || lower.starts_with("<html")).then(|| text.trim().to_string())
}

fn greedy_doctype_span(text: &str) -> Option<String> {
    GREEDY_DOCTYPE_SPAN
        .find(text)
        .map(|m| m.as_str().trim().to_string())
}

fn index_scan(text: &str) -> Option<String> {
    let lower = text.to_ascii_lowercase();
    let end = lower.rfind("</html>")? + "</html>".len();
    let start = lower.find("<!doctype").or_else(|| lower.find("<html"))?;
    (start < end).then(|| text[start..end].trim().to_string())
}
