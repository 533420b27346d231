/*!
 * Prompt templates for page localization.
 *
 * Unit mode sends a JSON array of `{id, text, context}` items and expects
 * `[{id, localized}]` back. Document mode sends the whole serialized page
 * and expects the complete page back.
 */

use serde::{Deserialize, Serialize};

use super::units::LocalizationRequest;

/// System message for unit mode
pub const UNIT_SYSTEM_PROMPT: &str =
    "You are a localization expert. Return ONLY a JSON array with no additional text.";

/// System message for document mode
pub const DOCUMENT_SYSTEM_PROMPT: &str =
    "You are an HTML localization system. Return ONLY the complete HTML document with no additional text.";

/// Prompt template with `{placeholder}` variables
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Unit mode user prompt.
    pub const UNIT_LOCALIZER: &'static str = r#"You are a professional content localization expert.

## Localization Task
Target Language: {target_language}
Target Country: {target_country}
Writing Style: {writing_style}
Target Audience: {audience}
{instructions}
## Text Content To Localize
{units}

## Output Format
Return a JSON array with localized text for each ID:

[
  {"id": "TEXT_0", "localized": "Your localized text here"},
  {"id": "TEXT_1", "localized": "Another localized text"}
]

IMPORTANT:
- Return ONLY the JSON array (no markdown, no explanations)
- Keep the same IDs
- Localize all text to {target_language}
- Adapt cultural references, names, currencies, dates
- Maintain the tone and style
- Items of type section-group are outlines: keep one line per item, **bold** headings, [bracketed] buttons and • bullets, separated by blank lines
- Start with [ and end with ]

BEGIN:"#;

    /// Document mode user prompt.
    pub const DOCUMENT_LOCALIZER: &'static str = r#"You are a professional content localization system.

## HTML Document To Localize
{document}

## Localization Requirements
Target Language: {target_language}
Target Country: {target_country}
Writing Style: {writing_style}
Target Audience: {audience}
{instructions}
## Critical Rules
1. Change ONLY textual content - preserve exact HTML structure
2. Keep all IDs, classes, attributes unchanged
3. Preserve all formatting and indentation
4. Keep all functionality - only text changes
5. Keep code comments in original language
6. Adapt dates, currencies, phone numbers to target country
7. Adapt names, addresses, businesses to local market
8. Keep <title>, <meta description> tags in target language
9. Do NOT modify <script> tags or JavaScript code
{rtl_rule}
## Output Format
Return ONLY the complete updated HTML document.
Start with <!DOCTYPE html> and end with </html>
Do NOT add any explanations, commentary, or markdown formatting.

BEGIN - Return the HTML now:"#;

    pub fn new(template: &str) -> Self {
        Self { template: template.to_string() }
    }

    pub fn unit_localizer() -> Self {
        Self::new(Self::UNIT_LOCALIZER)
    }

    pub fn document_localizer() -> Self {
        Self::new(Self::DOCUMENT_LOCALIZER)
    }

    /// Render the localization parameters shared by both templates
    fn render_request(&self, request: &LocalizationRequest) -> String {
        let instructions = request
            .instructions()
            .map(|text| format!("\nAdditional Instructions:\n{}\n", text))
            .unwrap_or_default();

        self.template
            .replace("{target_language}", &request.language_name())
            .replace("{target_country}", request.target_country())
            .replace("{writing_style}", request.writing_style())
            .replace("{audience}", request.audience())
            .replace("{instructions}", &instructions)
    }

    /// Render a unit mode prompt around the JSON unit list
    pub fn render_units(&self, request: &LocalizationRequest, units_json: &str) -> String {
        self.render_request(request).replace("{units}", units_json)
    }

    /// Render a document mode prompt around the serialized page
    pub fn render_document(&self, request: &LocalizationRequest, document: &str) -> String {
        let rtl_rule = if crate::language_utils::is_rtl(request.target_language()) {
            "10. The target language is written right to left: add dir=\"rtl\" to the <html> element\n"
        } else {
            ""
        };
        self.render_request(request)
            .replace("{rtl_rule}", rtl_rule)
            .replace("{document}", document)
    }
}

/// Unit as sent to the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitPayload {
    pub id: String,
    pub text: String,
    pub context: String,
}

/// Unit as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalizedPayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub localized: Option<String>,
}
