/*!
 * Document model adapter.
 *
 * The localization engine never touches a concrete tree library directly.
 * It reads and writes documents through [`DocumentModel`], which exposes
 * element enumeration, attribute access, direct text read/write and
 * serialization. [`HtmlDocument`] implements it on top of html5ever.
 */

pub mod html;

pub use html::HtmlDocument;

/// Handle to an element inside one document.
///
/// Handles are assigned in document order at parse time and stay valid for
/// the lifetime of the document, even if the element is later detached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub usize);

/// How a text node is compared against the text it should replace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch {
    /// Trimmed node text must equal the original
    Exact,
    /// Trimmed node text must equal or contain the original
    Contains,
}

impl TextMatch {
    /// Compare a raw node text against the original
    pub fn matches(&self, node_text: &str, original: &str) -> bool {
        let trimmed = node_text.trim();
        if trimmed.is_empty() {
            return false;
        }
        match self {
            Self::Exact => trimmed == original,
            Self::Contains => trimmed == original || trimmed.contains(original),
        }
    }
}

/// Read/write view over a parsed markup tree
pub trait DocumentModel {
    /// All attached elements in document order
    fn elements(&self) -> Vec<ElementId>;

    /// Lowercase tag name
    fn tag_name(&self, element: ElementId) -> Option<String>;

    /// Attribute value, if present
    fn attribute(&self, element: ElementId, name: &str) -> Option<String>;

    /// Overwrite an existing attribute. Returns false if the element or attribute is missing.
    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) -> bool;

    /// Nearest element ancestor
    fn parent(&self, element: ElementId) -> Option<ElementId>;

    /// Whether the element is still reachable from the document root
    fn is_attached(&self, element: ElementId) -> bool;

    /// Trimmed, non-blank direct text children in document order, without repeats
    fn direct_text_segments(&self, element: ElementId) -> Vec<String>;

    /// Replace every direct text child that matches `original` with `replacement`.
    ///
    /// Under [`TextMatch::Contains`], nodes that equal `original` exactly win
    /// over nodes that merely contain it. Whitespace surrounding the matched
    /// node text is kept. Each node is
    /// written in a single step. Returns the number of nodes written.
    fn replace_direct_text(
        &mut self,
        element: ElementId,
        original: &str,
        replacement: &str,
        mode: TextMatch,
    ) -> usize;

    /// Replace the element's content with a single text node.
    ///
    /// Direct `script` and `style` children survive.
    fn set_text(&mut self, element: ElementId, text: &str) -> bool;

    /// Serialize back to markup
    fn serialize(&self) -> std::io::Result<String>;

    /// Tokens of the `class` attribute
    fn classes(&self, element: ElementId) -> Vec<String> {
        self.attribute(element, "class")
            .map(|value| value.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// First token of the `class` attribute
    fn first_class(&self, element: ElementId) -> Option<String> {
        self.classes(element).into_iter().next()
    }

    /// Whether `ancestor` encloses `element`
    fn is_descendant_of(&self, element: ElementId, ancestor: ElementId) -> bool {
        let mut current = self.parent(element);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// First attached element carrying `id`
    fn select_by_id(&self, id: &str) -> Option<ElementId> {
        self.elements()
            .into_iter()
            .find(|&el| self.attribute(el, "id").as_deref() == Some(id))
    }

    /// Attached elements with `tag` whose class list contains `class`
    fn select_by_tag_and_class(&self, tag: &str, class: &str) -> Vec<ElementId> {
        self.elements()
            .into_iter()
            .filter(|&el| {
                self.tag_name(el).as_deref() == Some(tag)
                    && self.classes(el).iter().any(|c| c == class)
            })
            .collect()
    }

    /// Attached elements with `tag`
    fn select_by_tag(&self, tag: &str) -> Vec<ElementId> {
        self.elements()
            .into_iter()
            .filter(|&el| self.tag_name(el).as_deref() == Some(tag))
            .collect()
    }
}
