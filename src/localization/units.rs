/*!
 * Text units and the request/result types that travel with them.
 */

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::{Deserialize, Serialize};

/// Kind of localizable text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitKind {
    Heading,
    Paragraph,
    Button,
    ListItem,
    Link,
    Label,
    AttributeAlt,
    AttributeTitle,
    AttributePlaceholder,
    SectionGroup,
}

impl UnitKind {
    /// Prefix of the synthetic unit id
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::AttributeAlt => "ALT",
            Self::AttributeTitle => "TITLE",
            Self::AttributePlaceholder => "PLACEHOLDER",
            Self::SectionGroup => "SECTION",
            _ => "TEXT",
        }
    }

    /// Attribute written back for attribute units
    pub fn attribute_name(&self) -> Option<&'static str> {
        match self {
            Self::AttributeAlt => Some("alt"),
            Self::AttributeTitle => Some("title"),
            Self::AttributePlaceholder => Some("placeholder"),
            _ => None,
        }
    }

    /// Kind of text an element carries, by tag
    pub fn for_tag(tag: &str) -> Option<Self> {
        match tag {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Some(Self::Heading),
            "p" => Some(Self::Paragraph),
            "button" => Some(Self::Button),
            "li" => Some(Self::ListItem),
            "a" => Some(Self::Link),
            "label" => Some(Self::Label),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heading => "heading",
            Self::Paragraph => "paragraph",
            Self::Button => "button",
            Self::ListItem => "list-item",
            Self::Link => "link",
            Self::Label => "label",
            Self::AttributeAlt => "image-alt",
            Self::AttributeTitle => "title-attr",
            Self::AttributePlaceholder => "placeholder",
            Self::SectionGroup => "section-group",
        }
    }
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a unit's origin node is found again at replacement time.
///
/// Variants are ordered from most to least reliable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Locator {
    /// Value of the element's `id` attribute
    NodeId(String),
    /// Tag name plus first class token
    TagClass { tag: String, class: String },
    /// Tag name plus the literal original text
    Literal { tag: String, text: String },
}

impl Locator {
    /// Tag name carried by the locator, if any
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::NodeId(_) => None,
            Self::TagClass { tag, .. } | Self::Literal { tag, .. } => Some(tag),
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeId(id) => write!(f, "#{}", id),
            Self::TagClass { tag, class } => write!(f, "{}.{}", tag, class),
            Self::Literal { tag, text } => write!(f, "{}:\"{}\"", tag, text),
        }
    }
}

/// One constituent of a grouped section unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMember {
    pub kind: UnitKind,
    pub original_text: String,
    pub locator: Locator,
    pub tag: String,
}

impl GroupMember {
    /// Line of the typed outline sent to the backend
    pub fn outline_line(&self) -> String {
        match self.kind {
            UnitKind::Heading => format!("**{}**", self.original_text),
            UnitKind::Button => format!("[{}]", self.original_text),
            UnitKind::ListItem => format!("• {}", self.original_text),
            _ => self.original_text.clone(),
        }
    }

    /// Strip the outline decoration of a localized line
    pub fn strip_outline(kind: UnitKind, line: &str) -> String {
        let line = line.trim();
        let stripped = match kind {
            UnitKind::Heading => line
                .strip_prefix("**")
                .and_then(|l| l.strip_suffix("**"))
                .unwrap_or(line),
            UnitKind::Button => line
                .strip_prefix('[')
                .and_then(|l| l.strip_suffix(']'))
                .unwrap_or(line),
            UnitKind::ListItem => line.strip_prefix('•').unwrap_or(line),
            _ => line,
        };
        stripped.trim().to_string()
    }

    /// Strip whichever outline decoration a localized line carries
    pub fn strip_any_outline(line: &str) -> String {
        [UnitKind::Heading, UnitKind::Button, UnitKind::ListItem]
            .into_iter()
            .map(|kind| Self::strip_outline(kind, line))
            .find(|stripped| stripped.as_str() != line.trim())
            .unwrap_or_else(|| line.trim().to_string())
    }
}

/// Separator between outline lines of a grouped unit
pub const OUTLINE_SEPARATOR: &str = "\n\n";

/// Addressable piece of localizable text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextUnit {
    /// Synthetic id, `KIND_<n>`
    pub id: String,
    /// Text at extraction time
    pub original_text: String,
    pub locator: Locator,
    pub kind: UnitKind,
    /// Tag name of the origin element
    pub tag: String,
    /// Short hint for the backend, usually the parent tag
    pub context: String,
    /// Members of a grouped section, in document order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_members: Vec<GroupMember>,
}

impl TextUnit {
    pub fn is_group(&self) -> bool {
        self.kind == UnitKind::SectionGroup
    }
}

/// Localization parameters of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalizationRequest {
    target_language: String,
    target_country: String,
    writing_style: String,
    audience: String,
    instructions: Option<String>,
}

impl LocalizationRequest {
    pub fn new(target_language: impl Into<String>, target_country: impl Into<String>) -> Self {
        Self {
            target_language: target_language.into(),
            target_country: target_country.into(),
            writing_style: "professional and friendly".to_string(),
            audience: "general users".to_string(),
            instructions: None,
        }
    }

    pub fn with_writing_style(mut self, style: impl Into<String>) -> Self {
        self.writing_style = style.into();
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        let instructions = instructions.into();
        self.instructions = (!instructions.trim().is_empty()).then_some(instructions);
        self
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    pub fn target_country(&self) -> &str {
        &self.target_country
    }

    pub fn writing_style(&self) -> &str {
        &self.writing_style
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    /// English name of the target language
    pub fn language_name(&self) -> String {
        crate::language_utils::display_name(&self.target_language)
    }
}

/// Localized text keyed by unit id.
///
/// Append-only: an id, once set, is never overwritten.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalizationResult {
    entries: BTreeMap<String, String>,
}

impl LocalizationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value. Returns false if the id already had one or the value is blank.
    pub fn insert(&mut self, id: impl Into<String>, localized: impl Into<String>) -> bool {
        let localized = localized.into();
        if localized.trim().is_empty() {
            return false;
        }
        match self.entries.entry(id.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(localized);
                true
            }
        }
    }

    /// Merge another result. Returns the ids that were rejected as duplicates.
    pub fn merge(&mut self, other: LocalizationResult) -> Vec<String> {
        let mut rejected = Vec::new();
        for (id, localized) in other.entries {
            if !self.insert(id.clone(), localized) {
                rejected.push(id);
            }
        }
        rejected
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for LocalizationResult {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut result = Self::new();
        for (id, localized) in iter {
            result.insert(id, localized);
        }
        result
    }
}
