/*!
 * html5ever-backed document model.
 *
 * Elements are collected into an arena at parse time so that callers can
 * address them with plain [`ElementId`] handles. The `html`, `head` and
 * `body` wrappers the parser adds on its own are left out of the serialized
 * output, so fragments and pages with optional tags omitted come back in the
 * shape they were written.
 */

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use html5ever::parse_document;
use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::{StrTendril, TendrilSink};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};
use once_cell::sync::Lazy;
use regex::Regex;

use super::{DocumentModel, ElementId, TextMatch};

/// Tags whose content is never rewritten
const PROTECTED_TAGS: &[&str] = &["script", "style"];

static WRAPPER_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(html|head|body)[\s/>]").unwrap());

/// Document wrappers written out in the source markup
#[derive(Debug, Clone, Copy, Default)]
struct ExplicitTags {
    html: bool,
    head: bool,
    body: bool,
}

impl ExplicitTags {
    fn scan(html: &str) -> Self {
        let mut tags = Self::default();
        for caps in WRAPPER_TAG.captures_iter(html) {
            match caps[1].to_ascii_lowercase().as_str() {
                "html" => tags.html = true,
                "head" => tags.head = true,
                _ => tags.body = true,
            }
        }
        tags
    }
}

/// Parsed HTML document
pub struct HtmlDocument {
    dom: RcDom,
    elements: Vec<Handle>,
    index: HashMap<usize, usize>,
    explicit: ExplicitTags,
}

impl std::fmt::Debug for HtmlDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlDocument")
            .field("elements", &self.elements.len())
            .field("is_fragment", &self.is_fragment())
            .finish()
    }
}

impl HtmlDocument {
    /// Parse markup into a document
    pub fn parse(html: &str) -> Self {
        let dom = parse_document(RcDom::default(), Default::default()).one(html);
        let explicit = ExplicitTags::scan(html);

        let mut elements = Vec::new();
        collect_elements(&dom.document, &mut elements);
        let index = elements
            .iter()
            .enumerate()
            .map(|(i, handle)| (node_key(handle), i))
            .collect();

        Self { dom, elements, index, explicit }
    }

    /// Whether the input had no doctype and no `html`, `head` or `body` tag
    pub fn is_fragment(&self) -> bool {
        let has_doctype = self
            .dom
            .document
            .children
            .borrow()
            .iter()
            .any(|child| matches!(child.data, NodeData::Doctype { .. }));
        !(has_doctype || self.explicit.html || self.explicit.head || self.explicit.body)
    }

    fn handle(&self, element: ElementId) -> Option<&Handle> {
        self.elements.get(element.0)
    }

    fn child_element(&self, parent: &Handle, tag: &str) -> Option<Handle> {
        parent
            .children
            .borrow()
            .iter()
            .find(|child| element_name(child).as_deref() == Some(tag))
            .cloned()
    }

    fn serialize_children(handle: &Handle, buf: &mut Vec<u8>) -> std::io::Result<()> {
        Self::serialize_scoped(handle, TraversalScope::ChildrenOnly(None), buf)
    }

    fn serialize_node(handle: &Handle, buf: &mut Vec<u8>) -> std::io::Result<()> {
        Self::serialize_scoped(handle, TraversalScope::IncludeNode, buf)
    }

    fn serialize_scoped(handle: &Handle, scope: TraversalScope, buf: &mut Vec<u8>) -> std::io::Result<()> {
        let serializable: SerializableHandle = handle.clone().into();
        serialize(
            buf,
            &serializable,
            SerializeOpts {
                traversal_scope: scope,
                ..Default::default()
            },
        )
    }

    /// Serialize the children of an implied `html` element, unwrapping implied sections
    fn serialize_implied_html(&self, html: &Handle, buf: &mut Vec<u8>) -> std::io::Result<()> {
        for child in html.children.borrow().iter() {
            let explicit = match element_name(child).as_deref() {
                Some("head") => self.explicit.head,
                Some("body") => self.explicit.body,
                _ => true,
            };
            if explicit {
                Self::serialize_node(child, buf)?;
            } else {
                Self::serialize_children(child, buf)?;
            }
        }
        Ok(())
    }
}

impl DocumentModel for HtmlDocument {
    fn elements(&self) -> Vec<ElementId> {
        (0..self.elements.len())
            .map(ElementId)
            .filter(|&el| self.is_attached(el))
            .collect()
    }

    fn tag_name(&self, element: ElementId) -> Option<String> {
        self.handle(element).and_then(element_name)
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        let handle = self.handle(element)?;
        match &handle.data {
            NodeData::Element { attrs, .. } => attrs
                .borrow()
                .iter()
                .find(|attr| &*attr.name.local == name)
                .map(|attr| attr.value.to_string()),
            _ => None,
        }
    }

    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) -> bool {
        let Some(handle) = self.handle(element) else {
            return false;
        };
        if let NodeData::Element { attrs, .. } = &handle.data {
            let mut attrs = attrs.borrow_mut();
            if let Some(attr) = attrs.iter_mut().find(|attr| &*attr.name.local == name) {
                attr.value = StrTendril::from_slice(value);
                return true;
            }
        }
        false
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        let handle = self.handle(element)?;
        let parent = parent_of(handle)?;
        self.index.get(&node_key(&parent)).map(|&i| ElementId(i))
    }

    fn is_attached(&self, element: ElementId) -> bool {
        let Some(handle) = self.handle(element) else {
            return false;
        };
        let mut current = handle.clone();
        loop {
            if Rc::ptr_eq(&current, &self.dom.document) {
                return true;
            }
            match parent_of(&current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn direct_text_segments(&self, element: ElementId) -> Vec<String> {
        let Some(handle) = self.handle(element) else {
            return Vec::new();
        };
        let mut segments: Vec<String> = Vec::new();
        for child in handle.children.borrow().iter() {
            if let NodeData::Text { contents } = &child.data {
                let text = contents.borrow().trim().to_string();
                if !text.is_empty() && !segments.contains(&text) {
                    segments.push(text);
                }
            }
        }
        segments
    }

    fn replace_direct_text(
        &mut self,
        element: ElementId,
        original: &str,
        replacement: &str,
        mode: TextMatch,
    ) -> usize {
        let Some(handle) = self.handle(element) else {
            return 0;
        };
        if self.tag_name(element).is_some_and(|tag| PROTECTED_TAGS.contains(&tag.as_str())) {
            return 0;
        }

        let children = handle.children.borrow();
        let exact_hit = mode == TextMatch::Contains
            && children.iter().any(|child| match &child.data {
                NodeData::Text { contents } => TextMatch::Exact.matches(&contents.borrow(), original),
                _ => false,
            });
        let mode = if exact_hit { TextMatch::Exact } else { mode };

        let mut written = 0;
        for child in children.iter() {
            if let NodeData::Text { contents } = &child.data {
                let current = contents.borrow().to_string();
                if !mode.matches(&current, original) {
                    continue;
                }
                let leading = &current[..current.len() - current.trim_start().len()];
                let trailing = &current[current.trim_end().len()..];
                let updated = format!("{leading}{replacement}{trailing}");
                *contents.borrow_mut() = StrTendril::from_slice(&updated);
                written += 1;
            }
        }
        written
    }

    fn set_text(&mut self, element: ElementId, text: &str) -> bool {
        let Some(handle) = self.handle(element).cloned() else {
            return false;
        };
        if !matches!(handle.data, NodeData::Element { .. }) {
            return false;
        }

        let text_node = Node::new(NodeData::Text {
            contents: RefCell::new(StrTendril::from_slice(text)),
        });
        text_node.parent.set(Some(Rc::downgrade(&handle)));

        let mut children = handle.children.borrow_mut();
        let mut kept = Vec::with_capacity(children.len());
        let mut inserted = false;
        for child in children.drain(..) {
            let protected = element_name(&child)
                .is_some_and(|tag| PROTECTED_TAGS.contains(&tag.as_str()));
            if protected {
                kept.push(child);
                continue;
            }
            if !inserted {
                kept.push(text_node.clone());
                inserted = true;
            }
            child.parent.set(None);
        }
        if !inserted {
            kept.push(text_node);
        }
        *children = kept;
        true
    }

    fn serialize(&self) -> std::io::Result<String> {
        let mut buf = Vec::new();

        if self.explicit.html {
            Self::serialize_children(&self.dom.document, &mut buf)?;
        } else {
            for child in self.dom.document.children.borrow().iter() {
                if element_name(child).as_deref() == Some("html") {
                    self.serialize_implied_html(child, &mut buf)?;
                } else {
                    Self::serialize_node(child, &mut buf)?;
                }
            }
        }

        String::from_utf8(buf)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

fn node_key(handle: &Handle) -> usize {
    Rc::as_ptr(handle) as usize
}

fn element_name(handle: &Handle) -> Option<String> {
    match &handle.data {
        NodeData::Element { name, .. } => Some(name.local.to_string()),
        _ => None,
    }
}

/// Read the parent pointer without consuming it
fn parent_of(handle: &Handle) -> Option<Handle> {
    let weak = handle.parent.take();
    let parent = weak.as_ref().and_then(|w| w.upgrade());
    handle.parent.set(weak);
    parent
}

fn collect_elements(handle: &Handle, out: &mut Vec<Handle>) {
    if matches!(handle.data, NodeData::Element { .. }) {
        out.push(handle.clone());
    }
    for child in handle.children.borrow().iter() {
        collect_elements(child, out);
    }
}
