//! In-memory backend index.
//!
//! This module provides [`InMemoryIndex`], a zero-dependency [`BackendIndex`]
//! backed by `HashMap`s protected by a `tokio::sync::RwLock`. It is suitable
//! for development, testing, and small-scale use cases.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::backend::{BackendIndex, IndexEntry, IndexQuery, Payload, QueryMatch};
use crate::error::{Result, VectorStoreError};
use crate::mmr::cosine_similarity;
use crate::relevance::RelevanceScoring;

const BACKEND: &str = "InMemory";

/// Native metric used by [`InMemoryIndex`] to rank entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Cosine distance `1 - cos(a, b)`, lower is better.
    #[default]
    Cosine,
    /// Euclidean (L2) distance, lower is better.
    ///
    /// Relevance scores stay in `[0, 1]` for unit-length vectors.
    Euclidean,
    /// Dot product, higher is better.
    ///
    /// Relevance scores stay in `[0, 1]` for unit-length vectors only.
    DotProduct,
}

impl DistanceMetric {
    fn score(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Cosine => 1.0 - cosine_similarity(a, b),
            Self::Euclidean => {
                a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum::<f32>().sqrt()
            }
            Self::DotProduct => a.iter().zip(b.iter()).map(|(x, y)| x * y).sum(),
        }
    }

    /// Order two native scores best-first.
    fn rank(self, a: f32, b: f32) -> Ordering {
        match self {
            Self::Cosine | Self::Euclidean => a.partial_cmp(&b),
            Self::DotProduct => b.partial_cmp(&a),
        }
        .unwrap_or(Ordering::Equal)
    }

    fn relevance_scoring(self) -> RelevanceScoring {
        match self {
            Self::Cosine => RelevanceScoring::COSINE_DISTANCE,
            Self::Euclidean => RelevanceScoring::EUCLIDEAN_UNIT,
            Self::DotProduct => RelevanceScoring::InnerProduct,
        }
    }
}

#[derive(Debug, Clone)]
struct StoredEntry {
    /// Insertion sequence, used to break score ties deterministically.
    seq: u64,
    vector: Vec<f32>,
    payload: Payload,
}

#[derive(Debug, Default)]
struct State {
    /// namespace → entry id → entry. The default namespace is `""`.
    namespaces: HashMap<String, HashMap<String, StoredEntry>>,
    next_seq: u64,
}

/// An in-memory index with a fixed dimensionality.
///
/// Entries are partitioned by namespace. All operations are async-safe via
/// `tokio::sync::RwLock`.
///
/// # Example
///
/// ```rust,ignore
/// use adk_vectorstore::{DistanceMetric, InMemoryIndex};
///
/// let index = InMemoryIndex::new(384).with_metric(DistanceMetric::Euclidean);
/// ```
#[derive(Debug)]
pub struct InMemoryIndex {
    dimensions: usize,
    metric: DistanceMetric,
    state: RwLock<State>,
}

impl InMemoryIndex {
    /// Create a new empty index accepting vectors of `dimensions` components.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, metric: DistanceMetric::default(), state: RwLock::default() }
    }

    /// Use a different native metric.
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// The dimensionality this index accepts.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// The native metric used for ranking.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Number of entries stored in a namespace.
    pub async fn len(&self, namespace: Option<&str>) -> usize {
        let state = self.state.read().await;
        state.namespaces.get(namespace.unwrap_or_default()).map_or(0, HashMap::len)
    }

    /// Whether a namespace holds no entries.
    pub async fn is_empty(&self, namespace: Option<&str>) -> bool {
        self.len(namespace).await == 0
    }

    fn check_dimensions(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(VectorStoreError::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BackendIndex for InMemoryIndex {
    fn name(&self) -> &str {
        BACKEND
    }

    fn relevance_scoring(&self) -> RelevanceScoring {
        self.metric.relevance_scoring()
    }

    async fn upsert(
        &self,
        entries: Vec<IndexEntry>,
        namespace: Option<&str>,
    ) -> Result<Vec<String>> {
        for entry in &entries {
            self.check_dimensions(&entry.vector)?;
        }

        let mut state = self.state.write().await;
        let State { namespaces, next_seq } = &mut *state;
        let partition = namespaces.entry(namespace.unwrap_or_default().to_string()).or_default();

        let mut ids = Vec::with_capacity(entries.len());
        for entry in entries {
            let id = entry.id.unwrap_or_else(|| Uuid::new_v4().to_string());
            let seq = match partition.get(&id) {
                Some(existing) => existing.seq,
                None => {
                    *next_seq += 1;
                    *next_seq
                }
            };
            partition.insert(id.clone(), StoredEntry { seq, vector: entry.vector, payload: entry.payload });
            ids.push(id);
        }

        debug!(backend = BACKEND, namespace, count = ids.len(), "upserted entries");
        Ok(ids)
    }

    async fn delete(&self, ids: &[String], namespace: Option<&str>) -> Result<bool> {
        let mut state = self.state.write().await;
        let Some(partition) = state.namespaces.get_mut(namespace.unwrap_or_default()) else {
            return Ok(false);
        };

        let removed = ids.iter().filter(|id| partition.remove(id.as_str()).is_some()).count();
        debug!(backend = BACKEND, namespace, requested = ids.len(), removed, "deleted entries");
        Ok(removed > 0)
    }

    async fn query(&self, request: &IndexQuery<'_>) -> Result<Vec<QueryMatch>> {
        self.check_dimensions(request.vector)?;

        let state = self.state.read().await;
        let Some(partition) = state.namespaces.get(request.namespace.unwrap_or_default()) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<(f32, &String, &StoredEntry)> = partition
            .iter()
            .filter(|(_, entry)| request.filter.is_none_or(|f| f.matches(&entry.payload)))
            .map(|(id, entry)| (self.metric.score(&entry.vector, request.vector), id, entry))
            .collect();

        scored.sort_by(|a, b| self.metric.rank(a.0, b.0).then(a.2.seq.cmp(&b.2.seq)));
        scored.truncate(request.top_k);

        Ok(scored
            .into_iter()
            .map(|(score, id, entry)| QueryMatch {
                id: id.clone(),
                payload: entry.payload.clone(),
                score,
                vector: request.include_vectors.then(|| entry.vector.clone()),
            })
            .collect())
    }
}
