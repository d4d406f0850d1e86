//! Retrievers: single-operation "query → documents" facades.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::config::SearchParams;
use crate::document::Document;
use crate::error::Result;
use crate::vectorstore::{SearchType, VectorStore, VectorStoreExt};

/// Anything that can turn a query into relevant documents.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return documents relevant to `query`.
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>>;
}

/// A [`Retriever`] bound to one [`VectorStore`] and one [`SearchType`].
///
/// Holds no per-call state; errors from the store are returned unchanged.
///
/// # Example
///
/// ```rust,ignore
/// use adk_vectorstore::{Retriever, SearchParams, SearchType, VectorStoreRetriever};
///
/// let retriever = VectorStoreRetriever::new(store, SearchType::Mmr)
///     .with_params(SearchParams::builder().k(3).fetch_k(12).build()?);
/// let docs = retriever.retrieve("what is ownership?").await?;
/// ```
#[derive(Clone)]
pub struct VectorStoreRetriever {
    store: Arc<dyn VectorStore>,
    search_type: SearchType,
    params: SearchParams,
}

impl VectorStoreRetriever {
    /// Create a retriever using default [`SearchParams`].
    pub fn new(store: Arc<dyn VectorStore>, search_type: SearchType) -> Self {
        Self { store, search_type, params: SearchParams::default() }
    }

    /// Replace the search parameters.
    pub fn with_params(mut self, params: SearchParams) -> Self {
        self.params = params;
        self
    }

    /// The bound search type.
    pub fn search_type(&self) -> SearchType {
        self.search_type
    }

    /// The bound search parameters.
    pub fn params(&self) -> &SearchParams {
        &self.params
    }
}

#[async_trait]
impl Retriever for VectorStoreRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<Document>> {
        debug!(search_type = %self.search_type, k = self.params.k, "retrieving");
        self.store.search_with_params(query, self.search_type, &self.params).await
    }
}
