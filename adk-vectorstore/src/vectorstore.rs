//! Vector store trait and the convenience layer composed over it.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{AddOptions, DEFAULT_K, DeleteOptions, SearchOptions, SearchParams};
use crate::document::{Document, Metadata, ScoredDocument};
use crate::error::{Result, VectorStoreError};
use crate::mmr::MmrParams;
use crate::relevance::audit_relevance_scores;
use crate::retriever::VectorStoreRetriever;

/// How a query is turned into documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    /// Plain nearest-neighbor search.
    #[default]
    Similarity,
    /// Maximal marginal relevance re-ranking.
    Mmr,
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Similarity => f.write_str("similarity"),
            Self::Mmr => f.write_str("mmr"),
        }
    }
}

impl FromStr for SearchType {
    type Err = VectorStoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "similarity" => Ok(Self::Similarity),
            "mmr" => Ok(Self::Mmr),
            _ => Err(VectorStoreError::UnsupportedSearchType(s.to_string())),
        }
    }
}

/// A store of embedded documents supporting similarity and MMR search.
///
/// Ingestion calls mutate backend state; search calls are read-only.
/// Implementations validate request shape before any embedding or backend
/// call and pass collaborator errors through unchanged.
///
/// # Example
///
/// ```rust,ignore
/// use adk_vectorstore::{AddOptions, SearchOptions, VectorStore};
///
/// let ids = store.add_texts(&["doc1", "doc2"], &[], &AddOptions::default()).await?;
/// let docs = store.similarity_search("query text", 4, &SearchOptions::default()).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Embed `texts` and upsert them with their metadata.
    ///
    /// `metadatas` must be empty or have one entry per text. Returns ids in
    /// input order.
    async fn add_texts(
        &self,
        texts: &[&str],
        metadatas: &[Metadata],
        options: &AddOptions,
    ) -> Result<Vec<String>>;

    /// Delete entries by id. Unknown ids are not an error.
    ///
    /// Ids are resolved in the namespace they were added to, so callers that
    /// ingested with [`AddOptions::namespace`] pass the same namespace here.
    async fn delete(&self, ids: &[String], options: &DeleteOptions) -> Result<bool>;

    /// Return the `k` documents most similar to `query`, best first.
    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
        options: &SearchOptions,
    ) -> Result<Vec<Document>>;

    /// Like [`similarity_search`](VectorStore::similarity_search), keeping
    /// the backend-normalized relevance score of each document.
    ///
    /// Scores are not audited here; use
    /// [`VectorStoreExt::similarity_search_with_relevance_scores`].
    async fn scored_similarity_search(
        &self,
        query: &str,
        k: usize,
        options: &SearchOptions,
    ) -> Result<Vec<ScoredDocument>>;

    /// Return the `k` documents most similar to an existing embedding.
    async fn similarity_search_by_vector(
        &self,
        embedding: &[f32],
        k: usize,
        options: &SearchOptions,
    ) -> Result<Vec<Document>>;

    /// Select documents by maximal marginal relevance to `query`.
    async fn max_marginal_relevance_search(
        &self,
        query: &str,
        params: &MmrParams,
        options: &SearchOptions,
    ) -> Result<Vec<Document>>;

    /// Select documents by maximal marginal relevance to an existing embedding.
    async fn max_marginal_relevance_search_by_vector(
        &self,
        embedding: &[f32],
        params: &MmrParams,
        options: &SearchOptions,
    ) -> Result<Vec<Document>>;
}

/// Convenience operations available on every [`VectorStore`].
#[async_trait]
pub trait VectorStoreExt: VectorStore {
    /// Ingest documents; delegates to [`VectorStore::add_texts`].
    async fn add_documents(
        &self,
        documents: &[Document],
        options: &AddOptions,
    ) -> Result<Vec<String>> {
        let texts: Vec<&str> = documents.iter().map(|d| d.page_content.as_str()).collect();
        let metadatas: Vec<Metadata> = documents.iter().map(|d| d.metadata.clone()).collect();
        self.add_texts(&texts, &metadatas, options).await
    }

    /// Ingest texts and return how many were stored.
    async fn from_texts(&self, texts: &[&str], metadatas: &[Metadata]) -> Result<usize> {
        let ids = self.add_texts(texts, metadatas, &AddOptions::default()).await?;
        Ok(ids.len())
    }

    /// Ingest documents and return how many were stored.
    async fn from_documents(&self, documents: &[Document]) -> Result<usize> {
        let ids = self.add_documents(documents, &AddOptions::default()).await?;
        Ok(ids.len())
    }

    /// Similarity search with relevance scores in `[0, 1]`.
    ///
    /// Out-of-range scores are returned as-is and reported through
    /// [`audit_relevance_scores`].
    async fn similarity_search_with_relevance_scores(
        &self,
        query: &str,
        k: usize,
        options: &SearchOptions,
    ) -> Result<Vec<ScoredDocument>> {
        let results = self.scored_similarity_search(query, k, options).await?;
        audit_relevance_scores(&results);
        Ok(results)
    }

    /// Search with default parameters for the given `search_type`.
    async fn search(&self, query: &str, search_type: SearchType) -> Result<Vec<Document>> {
        match search_type {
            SearchType::Similarity => {
                self.similarity_search(query, DEFAULT_K, &SearchOptions::default()).await
            }
            SearchType::Mmr => {
                self.max_marginal_relevance_search(
                    query,
                    &MmrParams::default(),
                    &SearchOptions::default(),
                )
                .await
            }
        }
    }

    /// Search with explicit parameters for the given `search_type`.
    ///
    /// With `score_threshold` set, similarity search keeps only documents
    /// whose relevance score reaches the threshold.
    async fn search_with_params(
        &self,
        query: &str,
        search_type: SearchType,
        params: &SearchParams,
    ) -> Result<Vec<Document>> {
        match (search_type, params.score_threshold) {
            (SearchType::Similarity, None) => {
                self.similarity_search(query, params.k, &params.options).await
            }
            (SearchType::Similarity, Some(threshold)) => {
                let scored = self
                    .similarity_search_with_relevance_scores(query, params.k, &params.options)
                    .await?;
                let total = scored.len();
                let kept: Vec<Document> = scored
                    .into_iter()
                    .filter(|s| s.score >= threshold)
                    .map(|s| s.document)
                    .collect();
                debug!(threshold, total, kept = kept.len(), "applied score threshold");
                Ok(kept)
            }
            (SearchType::Mmr, _) => {
                self.max_marginal_relevance_search(query, &params.mmr(), &params.options).await
            }
        }
    }

    /// Bind this store and a search type into a retriever.
    fn as_retriever(self: Arc<Self>, search_type: SearchType) -> VectorStoreRetriever
    where
        Self: Sized + 'static,
    {
        VectorStoreRetriever::new(self, search_type)
    }
}

impl<T: VectorStore + ?Sized> VectorStoreExt for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_type_parses_known_modes() {
        assert_eq!("similarity".parse::<SearchType>().unwrap(), SearchType::Similarity);
        assert_eq!(" MMR ".parse::<SearchType>().unwrap(), SearchType::Mmr);
    }

    #[test]
    fn unknown_search_type_is_rejected() {
        let err = "similarity_score_threshold".parse::<SearchType>().unwrap_err();
        assert!(matches!(err, VectorStoreError::UnsupportedSearchType(ref s) if s == "similarity_score_threshold"));
    }

    #[test]
    fn search_type_round_trips_through_display() {
        for mode in [SearchType::Similarity, SearchType::Mmr] {
            assert_eq!(mode.to_string().parse::<SearchType>().unwrap(), mode);
        }
        assert_eq!(serde_json::to_string(&SearchType::Mmr).unwrap(), "\"mmr\"");
    }
}
