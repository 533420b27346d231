/*!
 * Prompt batching.
 *
 * Splits text units into fixed-size chunks in document order and renders
 * one outbound prompt per chunk. Document mode renders a single prompt
 * around the whole serialized page.
 */

use super::prompts::{DOCUMENT_SYSTEM_PROMPT, PromptTemplate, UNIT_SYSTEM_PROMPT, UnitPayload};
use super::units::{LocalizationRequest, TextUnit};

/// Contiguous slice of units processed independently
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Position of the chunk in the run, starting at 0
    pub index: usize,
    pub units: Vec<TextUnit>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn unit_ids(&self) -> Vec<String> {
        self.units.iter().map(|u| u.id.clone()).collect()
    }
}

/// Rendered unit mode request
#[derive(Debug, Clone)]
pub struct UnitPrompt {
    pub chunk_index: usize,
    pub system: String,
    pub user: String,
    pub unit_ids: Vec<String>,
}

/// Rendered document mode request
#[derive(Debug, Clone)]
pub struct DocumentPrompt {
    pub system: String,
    pub user: String,
    /// Size of the serialized document in bytes
    pub document_bytes: usize,
    /// Rough token estimate of the whole prompt
    pub estimated_tokens: usize,
}

/// Rough token estimate used for logging and reporting
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

/// Turns units and localization parameters into outbound prompts
#[derive(Debug, Clone)]
pub struct PromptBatcher {
    chunk_size: usize,
    unit_template: PromptTemplate,
    document_template: PromptTemplate,
}

impl PromptBatcher {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            unit_template: PromptTemplate::unit_localizer(),
            document_template: PromptTemplate::document_localizer(),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Split units into chunks, keeping document order
    pub fn chunk(&self, units: &[TextUnit]) -> Vec<Chunk> {
        units
            .chunks(self.chunk_size)
            .enumerate()
            .map(|(index, slice)| Chunk { index, units: slice.to_vec() })
            .collect()
    }

    /// Render the prompt of one chunk
    pub fn unit_prompt(&self, chunk: &Chunk, request: &LocalizationRequest) -> UnitPrompt {
        let payload: Vec<UnitPayload> = chunk
            .units
            .iter()
            .map(|unit| UnitPayload {
                id: unit.id.clone(),
                text: unit.original_text.clone(),
                context: unit.context.clone(),
            })
            .collect();
        let units_json = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| "[]".to_string());

        UnitPrompt {
            chunk_index: chunk.index,
            system: UNIT_SYSTEM_PROMPT.to_string(),
            user: self.unit_template.render_units(request, &units_json),
            unit_ids: chunk.unit_ids(),
        }
    }

    /// Render the single prompt of document mode
    pub fn document_prompt(&self, document: &str, request: &LocalizationRequest) -> DocumentPrompt {
        let user = self.document_template.render_document(request, document);
        DocumentPrompt {
            system: DOCUMENT_SYSTEM_PROMPT.to_string(),
            estimated_tokens: estimate_tokens(&user),
            user,
            document_bytes: document.len(),
        }
    }
}

impl Default for PromptBatcher {
    fn default() -> Self {
        Self::new(200)
    }
}
