/*!
 * Absolutizing relative URLs.
 *
 * A localized page is served from somewhere other than the page it was
 * crawled from, so relative links, sources and CSS `url(...)` references
 * are resolved against the crawled page's URL.
 */

use anyhow::{Context, Result};
use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use url::Url;

use crate::document::{DocumentModel, HtmlDocument};

/// Attributes holding a single URL
const URL_ATTRIBUTES: &[&str] = &["href", "src", "action", "data-src", "data-href"];

/// Schemes and prefixes that are never rewritten
const SKIPPED_PREFIXES: &[&str] = &["#", "data:", "javascript:", "mailto:", "tel:", "about:", "blob:"];

static CSS_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"url\(\s*(['"]?)([^'")]+?)(['"]?)\s*\)"#).unwrap());

/// Resolve `value` against `base` if it is relative
pub fn resolve_url(base: &Url, value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if SKIPPED_PREFIXES.iter().any(|prefix| lower.starts_with(prefix)) {
        return None;
    }
    if Url::parse(trimmed).is_ok() {
        return None;
    }
    base.join(trimmed).ok().map(String::from)
}

fn rewrite_css_urls(base: &Url, style: &str) -> Option<String> {
    let mut changed = false;
    let rewritten = CSS_URL.replace_all(style, |caps: &Captures| match resolve_url(base, &caps[2]) {
        Some(absolute) => {
            changed = true;
            format!("url({}{}{})", &caps[1], absolute, &caps[3])
        }
        None => caps[0].to_string(),
    });
    changed.then(|| rewritten.into_owned())
}

/// Rewrite relative URL attributes and inline style references in place.
///
/// Returns the number of attributes written.
pub fn absolutize_urls<D: DocumentModel + ?Sized>(doc: &mut D, base: &Url) -> usize {
    let mut rewritten = 0;
    for element in doc.elements() {
        for name in URL_ATTRIBUTES {
            let Some(value) = doc.attribute(element, name) else {
                continue;
            };
            if let Some(absolute) = resolve_url(base, &value) {
                if doc.set_attribute(element, name, &absolute) {
                    rewritten += 1;
                }
            }
        }

        if let Some(style) = doc.attribute(element, "style") {
            if let Some(updated) = rewrite_css_urls(base, &style) {
                if doc.set_attribute(element, "style", &updated) {
                    rewritten += 1;
                }
            }
        }
    }
    rewritten
}

/// Rewrite relative URLs of serialized markup against `base_url`
pub fn rewrite_relative_urls(html: &str, base_url: &str) -> Result<String> {
    let base = Url::parse(base_url).with_context(|| format!("Invalid base URL: {}", base_url))?;
    let mut doc = HtmlDocument::parse(html);
    let rewritten = absolutize_urls(&mut doc, &base);
    debug!("Absolutized {} URL attribute(s) against {}", rewritten, base);
    if rewritten == 0 {
        return Ok(html.to_string());
    }
    doc.serialize().context("Failed to serialize document")
}
