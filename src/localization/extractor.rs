/*!
 * Text unit extraction.
 *
 * Walks a document in order and produces the text units that make up its
 * localizable surface: headings, paragraphs, buttons, list items, links and
 * labels, plus the `alt`, `title` and `placeholder` attributes. Extraction
 * is a pure read and never fails; candidates with missing or unworthy text
 * simply produce no unit.
 */

use std::collections::HashSet;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::app_config::{DEFAULT_SKIP_PATTERNS, ExtractionConfig};
use crate::document::{DocumentModel, ElementId};

use super::units::{GroupMember, Locator, OUTLINE_SEPARATOR, TextUnit, UnitKind};

static NUMERIC_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d\s\.,:;\(\)\{\}\[\]]+$").unwrap());

/// Tags that open a groupable page section
const SECTION_TAGS: &[&str] = &["header", "main", "article", "section", "footer", "aside", "form"];

/// ARIA roles equivalent to a section tag
const SECTION_ROLES: &[&str] = &["banner", "main", "contentinfo", "complementary"];

/// Attributes that carry user-visible strings
const TEXT_ATTRIBUTES: &[(&str, UnitKind)] = &[
    ("alt", UnitKind::AttributeAlt),
    ("title", UnitKind::AttributeTitle),
    ("placeholder", UnitKind::AttributePlaceholder),
];

/// Minimum number of members for a section to be grouped
const MIN_GROUP_MEMBERS: usize = 2;

/// Tunables of the extractor
#[derive(Debug, Clone)]
pub struct ExtractionOptions {
    pub min_text_length: usize,
    pub skip_patterns: Vec<String>,
    pub group_sections: bool,
    pub include_attributes: bool,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            min_text_length: 10,
            skip_patterns: DEFAULT_SKIP_PATTERNS.iter().map(|p| p.to_string()).collect(),
            group_sections: false,
            include_attributes: true,
        }
    }
}

impl From<&ExtractionConfig> for ExtractionOptions {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            min_text_length: config.min_text_length,
            skip_patterns: config.skip_patterns.iter().map(|p| p.to_lowercase()).collect(),
            group_sections: config.group_sections,
            include_attributes: config.include_attributes,
        }
    }
}

/// Produces text units from a document
#[derive(Debug, Clone, Default)]
pub struct TextUnitExtractor {
    options: ExtractionOptions,
}

impl TextUnitExtractor {
    pub fn new(options: ExtractionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExtractionOptions {
        &self.options
    }

    /// Content-worthiness test applied to every candidate
    pub fn is_worthy(&self, text: &str) -> bool {
        let text = text.trim();
        if text.chars().count() < self.options.min_text_length.max(1) {
            return false;
        }
        if NUMERIC_ONLY.is_match(text) {
            return false;
        }
        let lower = text.to_lowercase();
        !self
            .options
            .skip_patterns
            .iter()
            .any(|pattern| !pattern.is_empty() && lower.contains(pattern.as_str()))
    }

    /// Extract units in document order
    pub fn extract<D: DocumentModel + ?Sized>(&self, doc: &D) -> Vec<TextUnit> {
        let mut units = Vec::new();
        let mut counter = 0usize;
        let mut grouped: HashSet<ElementId> = HashSet::new();

        if self.options.group_sections {
            for container in self.section_containers(doc) {
                let members = self.group_members(doc, container);
                if members.len() < MIN_GROUP_MEMBERS {
                    continue;
                }

                let outline = members
                    .iter()
                    .map(|(_, member)| member.outline_line())
                    .collect::<Vec<_>>()
                    .join(OUTLINE_SEPARATOR);
                let tag = doc.tag_name(container).unwrap_or_default();
                grouped.extend(members.iter().map(|(el, _)| *el));

                units.push(TextUnit {
                    id: next_id(UnitKind::SectionGroup, &mut counter),
                    locator: locator_for(doc, container, &tag, &outline),
                    original_text: outline,
                    kind: UnitKind::SectionGroup,
                    context: tag.clone(),
                    tag,
                    group_members: members.into_iter().map(|(_, member)| member).collect(),
                });
            }
        }

        for element in doc.elements() {
            let Some(tag) = doc.tag_name(element) else {
                continue;
            };

            if !grouped.contains(&element) {
                if let Some(kind) = element_kind(doc, element, &tag) {
                    let context = doc
                        .parent(element)
                        .and_then(|p| doc.tag_name(p))
                        .unwrap_or_else(|| "unknown".to_string());
                    // Text split by inline children yields one unit per text node
                    for text in doc.direct_text_segments(element) {
                        if !self.is_worthy(&text) {
                            continue;
                        }
                        units.push(TextUnit {
                            id: next_id(kind, &mut counter),
                            locator: locator_for(doc, element, &tag, &text),
                            original_text: text,
                            kind,
                            context: context.clone(),
                            tag: tag.clone(),
                            group_members: Vec::new(),
                        });
                    }
                }
            }

            if self.options.include_attributes {
                for (name, kind) in TEXT_ATTRIBUTES {
                    let Some(value) = doc.attribute(element, name) else {
                        continue;
                    };
                    let value = value.trim().to_string();
                    if !self.is_worthy(&value) {
                        continue;
                    }
                    units.push(TextUnit {
                        id: next_id(*kind, &mut counter),
                        locator: locator_for(doc, element, &tag, &value),
                        original_text: value,
                        kind: *kind,
                        context: kind.as_str().to_string(),
                        tag: tag.clone(),
                        group_members: Vec::new(),
                    });
                }
            }
        }

        debug!(
            "Extracted {} text unit(s) ({} grouped element(s))",
            units.len(),
            grouped.len()
        );
        units
    }

    /// Outermost section containers in document order
    fn section_containers<D: DocumentModel + ?Sized>(&self, doc: &D) -> Vec<ElementId> {
        let candidates: Vec<ElementId> = doc
            .elements()
            .into_iter()
            .filter(|&el| is_section(doc, el))
            .collect();

        candidates
            .iter()
            .copied()
            .filter(|&el| !candidates.iter().any(|&other| doc.is_descendant_of(el, other)))
            .collect()
    }

    fn group_members<D: DocumentModel + ?Sized>(
        &self,
        doc: &D,
        container: ElementId,
    ) -> Vec<(ElementId, GroupMember)> {
        doc.elements()
            .into_iter()
            .filter(|&el| doc.is_descendant_of(el, container))
            .flat_map(|el| {
                let tag = doc.tag_name(el).unwrap_or_default();
                let kind = element_kind(doc, el, &tag).filter(|kind| {
                    matches!(
                        kind,
                        UnitKind::Heading | UnitKind::Paragraph | UnitKind::Button | UnitKind::ListItem
                    )
                });
                let Some(kind) = kind else {
                    return Vec::new();
                };
                doc.direct_text_segments(el)
                    .into_iter()
                    .filter(|text| self.is_worthy(text))
                    .map(|text| {
                        (
                            el,
                            GroupMember {
                                kind,
                                locator: locator_for(doc, el, &tag, &text),
                                original_text: text,
                                tag: tag.clone(),
                            },
                        )
                    })
                    .collect()
            })
            .collect()
    }
}

fn next_id(kind: UnitKind, counter: &mut usize) -> String {
    let id = format!("{}_{}", kind.id_prefix(), counter);
    *counter += 1;
    id
}

/// Kind of an element, treating button-styled anchors as buttons
fn element_kind<D: DocumentModel + ?Sized>(doc: &D, element: ElementId, tag: &str) -> Option<UnitKind> {
    let kind = UnitKind::for_tag(tag)?;
    if kind == UnitKind::Link
        && doc
            .classes(element)
            .iter()
            .any(|c| c == "button" || c.contains("btn"))
    {
        return Some(UnitKind::Button);
    }
    Some(kind)
}

fn is_section<D: DocumentModel + ?Sized>(doc: &D, element: ElementId) -> bool {
    let tag_match = doc
        .tag_name(element)
        .is_some_and(|tag| SECTION_TAGS.contains(&tag.as_str()));
    let role_match = doc
        .attribute(element, "role")
        .is_some_and(|role| SECTION_ROLES.contains(&role.trim()));
    tag_match || role_match
}

/// Most reliable locator available for an element
fn locator_for<D: DocumentModel + ?Sized>(
    doc: &D,
    element: ElementId,
    tag: &str,
    text: &str,
) -> Locator {
    if let Some(id) = doc.attribute(element, "id").filter(|id| !id.trim().is_empty()) {
        return Locator::NodeId(id);
    }
    if let Some(class) = doc.first_class(element) {
        return Locator::TagClass { tag: tag.to_string(), class };
    }
    Locator::Literal { tag: tag.to_string(), text: text.to_string() }
}
