//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that maps text to dense vectors of a fixed dimensionality.
///
/// Implementations wrap specific embedding backends (OpenAI, local models, etc.)
/// behind a unified async interface. The default
/// [`embed_documents`](EmbeddingProvider::embed_documents) implementation calls
/// [`embed_query`](EmbeddingProvider::embed_query) sequentially; backends that
/// support native batching should override it. Both paths must produce
/// identical vectors for the same input.
///
/// # Example
///
/// ```rust,ignore
/// use adk_vectorstore::EmbeddingProvider;
///
/// let provider = MyEmbeddingProvider::new();
/// let embedding = provider.embed_query("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single query text.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate one embedding vector per input text, preserving order.
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed_query(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// A short name used in logs and error messages.
    fn name(&self) -> &str {
        "custom"
    }
}
