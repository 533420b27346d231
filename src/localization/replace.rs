/*!
 * Replacement engine.
 *
 * Writing happens in two passes. Planning resolves every unit to concrete
 * element edits without touching the document; applying then performs the
 * edits in order. Planning runs tier by tier (id, then tag and class, then
 * literal text) over all units, so a node claimed by a stronger tier is never
 * handed to a weaker one. Grouped section edits are applied last.
 */

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use serde::Serialize;

use crate::document::{DocumentModel, ElementId, TextMatch};

use super::units::{GroupMember, LocalizationResult, Locator, OUTLINE_SEPARATOR, TextUnit};

/// What an edit writes
#[derive(Debug, Clone, PartialEq)]
pub enum EditAction {
    /// Rewrite direct text children matching `original`
    Text {
        original: String,
        replacement: String,
        mode: TextMatch,
    },
    /// Overwrite an attribute whose current value is `original`
    Attribute {
        name: &'static str,
        original: String,
        replacement: String,
    },
    /// Replace the whole content of a section container
    Container { text: String },
}

/// One planned write against one element
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub unit_id: String,
    pub element: ElementId,
    pub action: EditAction,
}

/// Edits resolved for a set of units
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplacementPlan {
    /// Edits in application order
    pub edits: Vec<Edit>,
    /// Units with a localized value but no matching node
    pub unmatched: Vec<String>,
    /// Units without a localized value
    pub untouched: Vec<String>,
}

/// Outcome of applying localized text to a document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReplacementReport {
    /// Units written to at least one node
    pub applied: Vec<String>,
    /// Units that had a localized value but could not be written
    pub skipped: Vec<String>,
    /// Units without a localized value, left as original text
    pub untouched: Vec<String>,
    /// Individual node writes
    pub nodes_written: usize,
}

/// Slot a unit can claim: one direct text segment or one attribute of an element
type Slot<'a> = (ElementId, Option<&'static str>, &'a str);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Id,
    TagClass,
    Literal,
}

/// A unit, or one member of a grouped unit, waiting to be located
#[derive(Debug)]
struct Target<'a> {
    unit_id: &'a str,
    locator: &'a Locator,
    tag: &'a str,
    original: &'a str,
    replacement: String,
    attribute: Option<&'static str>,
    grouped: bool,
}

impl Target<'_> {
    fn tier(&self) -> Tier {
        match self.locator {
            Locator::NodeId(_) => Tier::Id,
            Locator::TagClass { .. } => Tier::TagClass,
            Locator::Literal { .. } => Tier::Literal,
        }
    }
}

/// Writes localized text back into a document
#[derive(Debug, Clone, Default)]
pub struct ReplacementEngine;

impl ReplacementEngine {
    pub fn new() -> Self {
        Self
    }

    /// Resolve every unit with a localized value to element edits
    pub fn plan<D: DocumentModel + ?Sized>(
        &self,
        doc: &D,
        units: &[TextUnit],
        result: &LocalizationResult,
    ) -> ReplacementPlan {
        let mut plan = ReplacementPlan::default();
        let mut targets = Vec::new();
        let mut group_edits = Vec::new();

        for unit in units {
            let Some(localized) = result.get(&unit.id) else {
                plan.untouched.push(unit.id.clone());
                continue;
            };

            if !unit.is_group() {
                targets.push(Target {
                    unit_id: &unit.id,
                    locator: &unit.locator,
                    tag: &unit.tag,
                    original: &unit.original_text,
                    replacement: localized.to_string(),
                    attribute: unit.kind.attribute_name(),
                    grouped: false,
                });
                continue;
            }

            if let Locator::NodeId(id) = &unit.locator {
                match doc.select_by_id(id) {
                    Some(element) => group_edits.push(Edit {
                        unit_id: unit.id.clone(),
                        element,
                        action: EditAction::Container {
                            text: container_text(&unit.group_members, localized),
                        },
                    }),
                    None => plan.unmatched.push(unit.id.clone()),
                }
                continue;
            }

            match split_group(&unit.group_members, localized) {
                Some(lines) => {
                    for (member, line) in unit.group_members.iter().zip(lines) {
                        targets.push(Target {
                            unit_id: &unit.id,
                            locator: &member.locator,
                            tag: &member.tag,
                            original: &member.original_text,
                            replacement: line,
                            attribute: None,
                            grouped: true,
                        });
                    }
                }
                None => {
                    warn!(
                        "Group {} came back with a different number of blocks than its {} member(s), skipping",
                        unit.id,
                        unit.group_members.len()
                    );
                    plan.unmatched.push(unit.id.clone());
                }
            }
        }

        let mut consumed: HashSet<Slot<'_>> = HashSet::new();
        let mut resolved: HashSet<&str> = HashSet::new();
        let mut failed: Vec<&str> = Vec::new();
        let mut grouped_member_edits = Vec::new();

        for tier in [Tier::Id, Tier::TagClass, Tier::Literal] {
            for target in targets.iter().filter(|t| t.tier() == tier) {
                let elements = resolve(doc, target, &consumed);
                if elements.is_empty() {
                    debug!("No node for {} at {}", target.unit_id, target.locator);
                    failed.push(target.unit_id);
                    continue;
                }

                resolved.insert(target.unit_id);
                for element in elements {
                    consumed.insert((element, target.attribute, target.original));
                    let edit = Edit {
                        unit_id: target.unit_id.to_string(),
                        element,
                        action: action_for(target),
                    };
                    if target.grouped {
                        grouped_member_edits.push(edit);
                    } else {
                        plan.edits.push(edit);
                    }
                }
            }
        }

        for unit_id in failed {
            if !resolved.contains(unit_id) && !plan.unmatched.iter().any(|id| id == unit_id) {
                plan.unmatched.push(unit_id.to_string());
            }
        }

        plan.edits.extend(grouped_member_edits);
        plan.edits.extend(group_edits);
        plan
    }

    /// Apply a plan. Each node is written in one step.
    pub fn apply_plan<D: DocumentModel + ?Sized>(&self, doc: &mut D, plan: ReplacementPlan) -> ReplacementReport {
        let mut written: HashMap<String, usize> = HashMap::new();
        let mut order: Vec<String> = Vec::new();
        let mut nodes_written = 0;

        for edit in plan.edits {
            let count = match &edit.action {
                EditAction::Text { original, replacement, mode } => {
                    doc.replace_direct_text(edit.element, original, replacement, *mode)
                }
                EditAction::Attribute { name, original, replacement } => {
                    let current = doc.attribute(edit.element, name);
                    if current.as_deref().map(str::trim) == Some(original.as_str())
                        && doc.set_attribute(edit.element, name, replacement)
                    {
                        1
                    } else {
                        0
                    }
                }
                EditAction::Container { text } => usize::from(doc.set_text(edit.element, text)),
            };

            if !written.contains_key(&edit.unit_id) {
                order.push(edit.unit_id.clone());
            }
            *written.entry(edit.unit_id).or_default() += count;
            nodes_written += count;
        }

        let mut report = ReplacementReport {
            untouched: plan.untouched,
            skipped: plan.unmatched,
            nodes_written,
            ..Default::default()
        };
        for unit_id in order {
            let count = written.get(&unit_id).copied().unwrap_or(0);
            if count > 0 {
                report.applied.push(unit_id);
            } else if !report.skipped.contains(&unit_id) {
                report.skipped.push(unit_id);
            }
        }

        debug!(
            "Replacement: {} applied, {} skipped, {} untouched, {} node write(s)",
            report.applied.len(),
            report.skipped.len(),
            report.untouched.len(),
            report.nodes_written
        );
        report
    }

    /// Plan and apply in one call
    pub fn apply<D: DocumentModel + ?Sized>(
        &self,
        doc: &mut D,
        units: &[TextUnit],
        result: &LocalizationResult,
    ) -> ReplacementReport {
        let plan = self.plan(doc, units, result);
        self.apply_plan(doc, plan)
    }
}

/// Split a localized outline into one line per member, or None on a count mismatch
fn split_group(members: &[GroupMember], localized: &str) -> Option<Vec<String>> {
    let blocks: Vec<&str> = localized
        .split(OUTLINE_SEPARATOR)
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .collect();
    if blocks.len() != members.len() {
        return None;
    }
    Some(
        members
            .iter()
            .zip(blocks)
            .map(|(member, block)| GroupMember::strip_outline(member.kind, block))
            .collect(),
    )
}

/// Plain text for a whole container, with each block's outline decoration removed
fn container_text(members: &[GroupMember], localized: &str) -> String {
    let blocks: Vec<&str> = localized
        .split(OUTLINE_SEPARATOR)
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .collect();
    let aligned = blocks.len() == members.len();

    blocks
        .iter()
        .enumerate()
        .map(|(i, block)| match aligned {
            true => GroupMember::strip_outline(members[i].kind, block),
            false => GroupMember::strip_any_outline(block),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn action_for(target: &Target<'_>) -> EditAction {
    match target.attribute {
        Some(name) => EditAction::Attribute {
            name,
            original: target.original.to_string(),
            replacement: target.replacement.clone(),
        },
        None => EditAction::Text {
            original: target.original.to_string(),
            replacement: target.replacement.clone(),
            mode: match target.tier() {
                Tier::Id => TextMatch::Contains,
                Tier::TagClass | Tier::Literal => TextMatch::Exact,
            },
        },
    }
}

/// Whether the element currently carries the target's original text
fn carries_original<D: DocumentModel + ?Sized>(doc: &D, element: ElementId, target: &Target<'_>) -> bool {
    match target.attribute {
        Some(name) => doc
            .attribute(element, name)
            .is_some_and(|value| value.trim() == target.original),
        None => doc
            .direct_text_segments(element)
            .iter()
            .any(|segment| segment == target.original),
    }
}

/// Elements a target should be written to
fn resolve<'a, D: DocumentModel + ?Sized>(
    doc: &D,
    target: &Target<'a>,
    consumed: &HashSet<Slot<'a>>,
) -> Vec<ElementId> {
    let free = |element: ElementId| !consumed.contains(&(element, target.attribute, target.original));

    match target.locator {
        Locator::NodeId(id) => doc
            .select_by_id(id)
            .filter(|&element| free(element))
            .filter(|&element| match target.attribute {
                Some(_) => carries_original(doc, element, target),
                None => true,
            })
            .into_iter()
            .collect(),
        Locator::TagClass { tag, class } => doc
            .select_by_tag_and_class(tag, class)
            .into_iter()
            .find(|&element| free(element) && carries_original(doc, element, target))
            .into_iter()
            .collect(),
        Locator::Literal { tag, .. } => {
            let tag = if tag.is_empty() { target.tag } else { tag.as_str() };
            doc.select_by_tag(tag)
                .into_iter()
                .find(|&element| {
                    free(element)
                        && doc.attribute(element, "id").is_none()
                        && doc.classes(element).is_empty()
                        && carries_original(doc, element, target)
                })
                .into_iter()
                .collect()
        }
    }
}
