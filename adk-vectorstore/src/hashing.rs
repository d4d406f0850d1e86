//! Deterministic, dependency-free embedding provider.
//!
//! [`HashingEmbeddingProvider`] projects word and character-trigram features
//! into a fixed number of buckets and L2-normalizes the result. It carries
//! no semantic knowledge, but identical texts always map to identical
//! vectors and texts sharing vocabulary land close together, which is
//! enough for demos, tests, and offline development.

use async_trait::async_trait;

use crate::embedding::EmbeddingProvider;
use crate::error::{Result, VectorStoreError};

/// Hashing-trick embedding provider with a configurable dimensionality.
///
/// # Example
///
/// ```rust,ignore
/// use adk_vectorstore::{EmbeddingProvider, HashingEmbeddingProvider};
///
/// let provider = HashingEmbeddingProvider::new(256)?;
/// let a = provider.embed_query("ownership and borrowing").await?;
/// let b = provider.embed_query("ownership and borrowing").await?;
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone)]
pub struct HashingEmbeddingProvider {
    dimensions: usize,
}

impl HashingEmbeddingProvider {
    /// Create a provider producing vectors of `dimensions` components.
    ///
    /// # Errors
    ///
    /// Returns [`VectorStoreError::ConfigError`] if `dimensions` is zero.
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(VectorStoreError::ConfigError(
                "embedding dimensions must be greater than zero".to_string(),
            ));
        }
        Ok(Self { dimensions })
    }

    fn bucket(&self, feature: &str, seed: u64) -> usize {
        let hash = feature
            .bytes()
            .fold(seed, |acc, b| (acc ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3));
        (hash % self.dimensions as u64) as usize
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];
        let lower = text.to_lowercase();

        for word in lower.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            embedding[self.bucket(word, 0xcbf2_9ce4_8422_2325)] += 1.0;

            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                embedding[self.bucket(&trigram, 0x8422_2325_cbf2_9ce4)] += 0.5;
            }
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|x| *x /= norm);
        }
        embedding
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mmr::cosine_similarity;

    #[test]
    fn rejects_zero_dimensions() {
        assert!(matches!(
            HashingEmbeddingProvider::new(0),
            Err(VectorStoreError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn batch_and_single_paths_agree() {
        let provider = HashingEmbeddingProvider::new(64).unwrap();
        let texts = ["memory safety without garbage collection", "interpreted language"];
        let batch = provider.embed_documents(&texts).await.unwrap();
        for (text, vector) in texts.iter().zip(&batch) {
            assert_eq!(&provider.embed_query(text).await.unwrap(), vector);
        }
    }

    #[tokio::test]
    async fn vectors_are_unit_length() {
        let provider = HashingEmbeddingProvider::new(32).unwrap();
        let v = provider.embed_query("Vector databases store embeddings").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn empty_text_yields_zero_vector() {
        let provider = HashingEmbeddingProvider::new(16).unwrap();
        let v = provider.embed_query("  ").await.unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[tokio::test]
    async fn shared_vocabulary_is_closer() {
        let provider = HashingEmbeddingProvider::new(256).unwrap();
        let query = provider.embed_query("rust ownership").await.unwrap();
        let near = provider.embed_query("ownership rules in rust").await.unwrap();
        let far = provider.embed_query("baking sourdough bread").await.unwrap();
        assert!(cosine_similarity(&query, &near) > cosine_similarity(&query, &far));
    }
}
