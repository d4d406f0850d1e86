//! Vector store orchestration over an embedding provider and a backend index.
//!
//! [`EmbeddingVectorStore`] is stateless: every persisted byte lives in the
//! [`BackendIndex`]. It turns text into vectors on the way in and vectors
//! back into [`Document`]s on the way out, applying score normalization and
//! MMR selection in between.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use adk_vectorstore::{EmbeddingVectorStore, HashingEmbeddingProvider, InMemoryIndex};
//!
//! let store = EmbeddingVectorStore::builder()
//!     .embedding_provider(Arc::new(HashingEmbeddingProvider::new(256)?))
//!     .backend(Arc::new(InMemoryIndex::new(256)))
//!     .build()?;
//!
//! store.add_texts(&["hello world"], &[], &AddOptions::default()).await?;
//! let docs = store.similarity_search("hello", 4, &SearchOptions::default()).await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::backend::{BackendIndex, IndexEntry, IndexQuery, Payload, QueryMatch};
use crate::config::{AddOptions, DeleteOptions, SearchOptions, VectorStoreConfig};
use crate::document::{Document, Metadata, ScoredDocument};
use crate::embedding::EmbeddingProvider;
use crate::error::{Result, VectorStoreError};
use crate::mmr::{MmrParams, MmrSelector};
use crate::vectorstore::VectorStore;

/// A [`VectorStore`] that embeds with an [`EmbeddingProvider`] and persists
/// into a [`BackendIndex`].
///
/// Construct one via [`EmbeddingVectorStore::builder()`]. Concurrent calls
/// are safe whenever the provider and backend are.
pub struct EmbeddingVectorStore {
    config: VectorStoreConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    backend: Arc<dyn BackendIndex>,
}

impl EmbeddingVectorStore {
    /// Create a new [`EmbeddingVectorStoreBuilder`].
    pub fn builder() -> EmbeddingVectorStoreBuilder {
        EmbeddingVectorStoreBuilder::default()
    }

    /// Return a reference to the store configuration.
    pub fn config(&self) -> &VectorStoreConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the backend index.
    pub fn backend(&self) -> &Arc<dyn BackendIndex> {
        &self.backend
    }

    /// The dimensionality every vector in this store must have.
    pub fn dimensions(&self) -> usize {
        self.embedding_provider.dimensions()
    }

    fn check_dimensions(&self, vector: &[f32]) -> Result<()> {
        let expected = self.dimensions();
        if vector.len() != expected {
            return Err(VectorStoreError::DimensionMismatch { expected, actual: vector.len() });
        }
        Ok(())
    }

    fn namespace<'a>(&'a self, requested: Option<&'a String>) -> Option<&'a str> {
        requested.or(self.config.namespace.as_ref()).map(String::as_str)
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let embedding = self.embedding_provider.embed_query(query).await?;
        self.check_dimensions(&embedding)?;
        Ok(embedding)
    }

    fn payload(&self, text: &str, metadata: Option<&Metadata>) -> Payload {
        let mut payload: Payload = metadata
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        payload.insert(self.config.text_key.clone(), text.into());
        payload
    }

    /// Rebuild a document from a payload; `None` if the text field is missing.
    fn to_document(&self, id: &str, mut payload: Payload) -> Option<Document> {
        match payload.remove(&self.config.text_key) {
            Some(serde_json::Value::String(page_content)) => {
                Some(Document { page_content, metadata: payload.into_iter().collect() })
            }
            _ => {
                warn!(
                    backend = self.backend.name(),
                    id,
                    text_key = %self.config.text_key,
                    "found entry without text field, skipping"
                );
                None
            }
        }
    }

    async fn query_backend(
        &self,
        vector: &[f32],
        top_k: usize,
        options: &SearchOptions,
        include_vectors: bool,
    ) -> Result<Vec<QueryMatch>> {
        let request = IndexQuery {
            vector,
            top_k,
            filter: options.filter.as_ref(),
            namespace: self.namespace(options.namespace.as_ref()),
            include_vectors,
        };
        let matches = self.backend.query(&request).await?;
        debug!(backend = self.backend.name(), top_k, returned = matches.len(), "backend query");
        Ok(matches)
    }

    async fn scored_search_by_vector(
        &self,
        embedding: &[f32],
        k: usize,
        options: &SearchOptions,
    ) -> Result<Vec<ScoredDocument>> {
        let scoring = self.backend.relevance_scoring();
        let matches = self.query_backend(embedding, k, options, false).await?;
        Ok(matches
            .into_iter()
            .filter_map(|m| {
                let score = scoring.normalize(m.score);
                self.to_document(&m.id, m.payload).map(|document| ScoredDocument { document, score })
            })
            .collect())
    }
}

fn check_k(k: usize) -> Result<()> {
    if k == 0 {
        return Err(VectorStoreError::invalid("k must be at least 1"));
    }
    Ok(())
}

#[async_trait]
impl VectorStore for EmbeddingVectorStore {
    async fn add_texts(
        &self,
        texts: &[&str],
        metadatas: &[Metadata],
        options: &AddOptions,
    ) -> Result<Vec<String>> {
        if !metadatas.is_empty() && metadatas.len() != texts.len() {
            return Err(VectorStoreError::invalid(format!(
                "got {} metadatas for {} texts",
                metadatas.len(),
                texts.len()
            )));
        }
        if let Some(ids) = &options.ids {
            if ids.len() != texts.len() {
                return Err(VectorStoreError::invalid(format!(
                    "got {} ids for {} texts",
                    ids.len(),
                    texts.len()
                )));
            }
        }
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let namespace = self.namespace(options.namespace.as_ref());
        let batch_size = self.config.batch_size;

        // Every batch is embedded and checked before anything reaches the backend.
        let mut batches: Vec<Vec<IndexEntry>> =
            Vec::with_capacity(texts.len().div_ceil(batch_size));
        for (batch_index, batch) in texts.chunks(batch_size).enumerate() {
            let offset = batch_index * batch_size;

            let embeddings = self.embedding_provider.embed_documents(batch).await?;
            if embeddings.len() != batch.len() {
                return Err(VectorStoreError::EmbeddingError {
                    provider: self.embedding_provider.name().to_string(),
                    message: format!(
                        "returned {} embeddings for {} texts",
                        embeddings.len(),
                        batch.len()
                    ),
                });
            }
            for embedding in &embeddings {
                self.check_dimensions(embedding)?;
            }

            batches.push(
                batch
                    .iter()
                    .zip(embeddings)
                    .enumerate()
                    .map(|(i, (text, vector))| IndexEntry {
                        id: options.ids.as_ref().map(|ids| ids[offset + i].clone()),
                        vector,
                        payload: self.payload(text, metadatas.get(offset + i)),
                    })
                    .collect(),
            );
        }

        let mut all_ids = Vec::with_capacity(texts.len());
        for (batch_index, entries) in batches.into_iter().enumerate() {
            let ids = self.backend.upsert(entries, namespace).await?;
            debug!(backend = self.backend.name(), batch_index, count = ids.len(), "upserted batch");
            all_ids.extend(ids);
        }

        info!(
            backend = self.backend.name(),
            provider = self.embedding_provider.name(),
            namespace,
            count = all_ids.len(),
            "added texts"
        );
        Ok(all_ids)
    }

    async fn delete(&self, ids: &[String], options: &DeleteOptions) -> Result<bool> {
        if ids.is_empty() {
            return Ok(false);
        }
        let namespace = self.namespace(options.namespace.as_ref());
        let removed = self.backend.delete(ids, namespace).await?;
        info!(
            backend = self.backend.name(),
            namespace,
            requested = ids.len(),
            removed,
            "deleted entries"
        );
        Ok(removed)
    }

    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        options: &SearchOptions,
    ) -> Result<Vec<Document>> {
        check_k(k)?;
        let embedding = self.embed_query(query).await?;
        self.similarity_search_by_vector(&embedding, k, options).await
    }

    async fn scored_similarity_search(
        &self,
        query: &str,
        k: usize,
        options: &SearchOptions,
    ) -> Result<Vec<ScoredDocument>> {
        check_k(k)?;
        let embedding = self.embed_query(query).await?;
        self.scored_search_by_vector(&embedding, k, options).await
    }

    async fn similarity_search_by_vector(
        &self,
        embedding: &[f32],
        k: usize,
        options: &SearchOptions,
    ) -> Result<Vec<Document>> {
        check_k(k)?;
        self.check_dimensions(embedding)?;
        let matches = self.query_backend(embedding, k, options, false).await?;
        Ok(matches.into_iter().filter_map(|m| self.to_document(&m.id, m.payload)).collect())
    }

    async fn max_marginal_relevance_search(
        &self,
        query: &str,
        params: &MmrParams,
        options: &SearchOptions,
    ) -> Result<Vec<Document>> {
        params.validate()?;
        let embedding = self.embed_query(query).await?;
        self.max_marginal_relevance_search_by_vector(&embedding, params, options).await
    }

    async fn max_marginal_relevance_search_by_vector(
        &self,
        embedding: &[f32],
        params: &MmrParams,
        options: &SearchOptions,
    ) -> Result<Vec<Document>> {
        let selector = MmrSelector::new(*params)?;
        self.check_dimensions(embedding)?;

        let matches = self.query_backend(embedding, params.fetch_k, options, true).await?;
        // Textless entries are dropped before selection so they never take a slot.
        let mut documents = Vec::with_capacity(matches.len());
        let mut vectors = Vec::with_capacity(matches.len());
        for m in matches {
            let vector = m.vector.ok_or_else(|| {
                VectorStoreError::backend(self.backend.name(), "query did not return vectors for MMR")
            })?;
            if let Some(document) = self.to_document(&m.id, m.payload) {
                vectors.push(vector);
                documents.push(document);
            }
        }

        let selected = selector.select(embedding, &vectors);
        debug!(candidates = vectors.len(), selected = selected.len(), "mmr selection");

        let mut slots: Vec<Option<Document>> = documents.into_iter().map(Some).collect();
        Ok(selected.into_iter().filter_map(|i| slots.get_mut(i).and_then(Option::take)).collect())
    }
}

/// Builder for constructing an [`EmbeddingVectorStore`].
///
/// The embedding provider and backend are required; the configuration
/// defaults to [`VectorStoreConfig::default()`].
#[derive(Default)]
pub struct EmbeddingVectorStoreBuilder {
    config: Option<VectorStoreConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    backend: Option<Arc<dyn BackendIndex>>,
}

impl EmbeddingVectorStoreBuilder {
    /// Set the store configuration.
    pub fn config(mut self, config: VectorStoreConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the backend index.
    pub fn backend(mut self, backend: Arc<dyn BackendIndex>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Build the [`EmbeddingVectorStore`].
    ///
    /// # Errors
    ///
    /// Returns [`VectorStoreError::ConfigError`] if a required field is
    /// missing, the configuration is invalid, or the provider reports zero
    /// dimensions.
    pub fn build(self) -> Result<EmbeddingVectorStore> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| VectorStoreError::ConfigError("embedding_provider is required".to_string()))?;
        let backend = self
            .backend
            .ok_or_else(|| VectorStoreError::ConfigError("backend is required".to_string()))?;
        if embedding_provider.dimensions() == 0 {
            return Err(VectorStoreError::ConfigError(
                "embedding provider reports zero dimensions".to_string(),
            ));
        }

        Ok(EmbeddingVectorStore { config, embedding_provider, backend })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::HashingEmbeddingProvider;
    use crate::inmemory::InMemoryIndex;

    fn store() -> EmbeddingVectorStore {
        EmbeddingVectorStore::builder()
            .embedding_provider(Arc::new(HashingEmbeddingProvider::new(32).unwrap()))
            .backend(Arc::new(InMemoryIndex::new(32)))
            .build()
            .unwrap()
    }

    #[test]
    fn builder_requires_provider_and_backend() {
        let err = EmbeddingVectorStore::builder().build().err().unwrap();
        assert!(err.to_string().contains("embedding_provider is required"));
        let err = EmbeddingVectorStore::builder()
            .embedding_provider(Arc::new(HashingEmbeddingProvider::new(4).unwrap()))
            .build()
            .err()
            .unwrap();
        assert!(err.to_string().contains("backend is required"));
    }

    #[test]
    fn payload_holds_text_and_metadata() {
        let store = store();
        let metadata = Metadata::from([("topic".to_string(), "rust".into())]);
        let payload = store.payload("body", Some(&metadata));
        assert_eq!(payload["text"], "body");
        assert_eq!(payload["topic"], "rust");

        let doc = store.to_document("id-1", payload).unwrap();
        assert_eq!(doc.page_content, "body");
        assert_eq!(doc.metadata.len(), 1);
    }

    #[test]
    fn payload_without_text_is_skipped() {
        assert!(store().to_document("id-1", Payload::new()).is_none());
    }

    #[test]
    fn per_call_namespace_overrides_default() {
        let store = EmbeddingVectorStore::builder()
            .config(VectorStoreConfig::builder().namespace("default-ns").build().unwrap())
            .embedding_provider(Arc::new(HashingEmbeddingProvider::new(4).unwrap()))
            .backend(Arc::new(InMemoryIndex::new(4)))
            .build()
            .unwrap();
        let call = "call-ns".to_string();
        assert_eq!(store.namespace(Some(&call)), Some("call-ns"));
        assert_eq!(store.namespace(None), Some("default-ns"));
    }

    #[tokio::test]
    async fn zero_k_is_invalid() {
        let err = store().similarity_search("q", 0, &SearchOptions::default()).await.unwrap_err();
        assert!(matches!(err, VectorStoreError::InvalidArgument(_)));
    }
}
