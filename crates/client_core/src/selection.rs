use serde::Serialize;
use shared::domain::{Term, TermId};

/// Payload handed to the editor when a term is picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermAnnotation {
    pub id: TermId,
    pub term: Term,
    pub tags: Vec<String>,
    /// Text to place in the document: the editor's selection when there is
    /// one, otherwise the term itself.
    pub text: String,
}

impl TermAnnotation {
    pub fn new(term: Term, selected_text: &str) -> Self {
        let text = if selected_text.is_empty() {
            term.term.clone()
        } else {
            selected_text.to_string()
        };
        Self {
            id: term.id,
            tags: term.tags.clone(),
            term,
            text,
        }
    }
}
