//! Data types for documents and scored search results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Free-form metadata attached to a [`Document`].
pub type Metadata = HashMap<String, Value>;

/// A unit of text content plus metadata.
///
/// Documents carry no identity of their own; the backend assigns an
/// opaque id when the document is upserted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// The text content of the document.
    pub page_content: String,
    /// Key-value metadata associated with the document.
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    /// Create a document with the given content and no metadata.
    pub fn new(page_content: impl Into<String>) -> Self {
        Self { page_content: page_content.into(), metadata: Metadata::new() }
    }

    /// Attach a metadata entry, replacing any previous value for `key`.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A retrieved [`Document`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredDocument {
    /// The retrieved document.
    pub document: Document,
    /// The relevance score, normalized so that 1.0 means identical.
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_metadata_overwrites_existing_key() {
        let doc = Document::new("hello").with_metadata("lang", "en").with_metadata("lang", "fr");
        assert_eq!(doc.metadata.len(), 1);
        assert_eq!(doc.metadata["lang"], Value::from("fr"));
    }

    #[test]
    fn metadata_defaults_when_missing_in_json() {
        let doc: Document = serde_json::from_str(r#"{"page_content":"x"}"#).unwrap();
        assert!(doc.metadata.is_empty());
    }
}
