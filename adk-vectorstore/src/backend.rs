//! Backend index trait for persisting vectors and answering kNN queries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::filter::MetadataFilter;
use crate::relevance::RelevanceScoring;

/// Payload stored alongside each vector: document text plus metadata.
pub type Payload = Map<String, Value>;

/// A vector to upsert. `id: None` lets the backend assign one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Caller-chosen id, or `None` for a backend-assigned id.
    pub id: Option<String>,
    /// The embedding vector.
    pub vector: Vec<f32>,
    /// Text and metadata stored with the vector.
    pub payload: Payload,
}

/// A k-nearest-neighbor request.
#[derive(Debug, Clone, Copy)]
pub struct IndexQuery<'a> {
    /// The query vector.
    pub vector: &'a [f32],
    /// Maximum number of matches to return.
    pub top_k: usize,
    /// Optional payload filter.
    pub filter: Option<&'a MetadataFilter>,
    /// Optional partition to search in.
    pub namespace: Option<&'a str>,
    /// Whether matches must carry their stored vectors.
    pub include_vectors: bool,
}

/// One match returned by [`BackendIndex::query`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMatch {
    /// The backend id of the entry.
    pub id: String,
    /// The stored payload.
    pub payload: Payload,
    /// The native score (distance or similarity, see
    /// [`BackendIndex::relevance_scoring`]).
    pub score: f32,
    /// The stored vector, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
}

/// A storage backend for vectors with nearest-neighbor search.
///
/// Implementations assume the underlying index already exists; creating
/// and provisioning it is covered separately by
/// [`IndexLifecycle`](crate::lifecycle::IndexLifecycle).
///
/// # Example
///
/// ```rust,ignore
/// use adk_vectorstore::{BackendIndex, InMemoryIndex, IndexEntry, IndexQuery};
///
/// let index = InMemoryIndex::new(384);
/// let ids = index.upsert(entries, None).await?;
/// let matches = index
///     .query(&IndexQuery { vector: &q, top_k: 5, filter: None, namespace: None, include_vectors: false })
///     .await?;
/// ```
#[async_trait]
pub trait BackendIndex: Send + Sync {
    /// A short name used in logs and error messages.
    fn name(&self) -> &str;

    /// How native scores map onto `[0, 1]` relevance.
    fn relevance_scoring(&self) -> RelevanceScoring;

    /// Insert or replace entries. Returns ids in input order.
    async fn upsert(&self, entries: Vec<IndexEntry>, namespace: Option<&str>)
    -> Result<Vec<String>>;

    /// Delete entries by id. Unknown ids are ignored.
    ///
    /// Returns whether the backend confirms that something was removed.
    async fn delete(&self, ids: &[String], namespace: Option<&str>) -> Result<bool>;

    /// Return up to `top_k` matches ordered best-first by the native metric.
    async fn query(&self, request: &IndexQuery<'_>) -> Result<Vec<QueryMatch>>;
}
