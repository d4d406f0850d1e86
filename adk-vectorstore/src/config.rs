//! Configuration for vector stores and per-call options.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VectorStoreError};
use crate::filter::MetadataFilter;
use crate::mmr::{DEFAULT_FETCH_K, DEFAULT_LAMBDA_MULT, MmrParams};

/// Default number of documents returned by similarity search.
pub const DEFAULT_K: usize = 4;

/// Store-level configuration for [`EmbeddingVectorStore`](crate::EmbeddingVectorStore).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VectorStoreConfig {
    /// Payload key under which document text is stored.
    pub text_key: String,
    /// Default namespace for ingestion, search, and deletion.
    pub namespace: Option<String>,
    /// Number of texts sent to the embedding provider per call.
    pub batch_size: usize,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self { text_key: "text".to_string(), namespace: None, batch_size: 32 }
    }
}

impl VectorStoreConfig {
    /// Create a new builder for constructing a [`VectorStoreConfig`].
    pub fn builder() -> VectorStoreConfigBuilder {
        VectorStoreConfigBuilder::default()
    }

    /// Check that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`VectorStoreError::ConfigError`] if:
    /// - `text_key` is empty
    /// - `batch_size == 0`
    pub fn validate(&self) -> Result<()> {
        if self.text_key.is_empty() {
            return Err(VectorStoreError::ConfigError("text_key must not be empty".to_string()));
        }
        if self.batch_size == 0 {
            return Err(VectorStoreError::ConfigError(
                "batch_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`VectorStoreConfig`].
#[derive(Debug, Clone, Default)]
pub struct VectorStoreConfigBuilder {
    config: VectorStoreConfig,
}

impl VectorStoreConfigBuilder {
    /// Set the payload key holding document text.
    pub fn text_key(mut self, key: impl Into<String>) -> Self {
        self.config.text_key = key.into();
        self
    }

    /// Set the default namespace.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = Some(namespace.into());
        self
    }

    /// Set the embedding batch size.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// Build the [`VectorStoreConfig`].
    ///
    /// # Errors
    ///
    /// See [`VectorStoreConfig::validate`].
    pub fn build(self) -> Result<VectorStoreConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Options for an ingestion call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddOptions {
    /// Ids to use instead of backend-assigned ones; one per text.
    pub ids: Option<Vec<String>>,
    /// Namespace override for this call.
    pub namespace: Option<String>,
}

impl AddOptions {
    /// Use caller-chosen ids.
    pub fn with_ids(mut self, ids: Vec<String>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Ingest into `namespace` instead of the store default.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

/// Options for a delete call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteOptions {
    /// Namespace override for this call.
    pub namespace: Option<String>,
}

impl DeleteOptions {
    /// Delete from `namespace` instead of the store default.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

/// Options for a search call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Payload filter applied by the backend.
    pub filter: Option<MetadataFilter>,
    /// Namespace override for this call.
    pub namespace: Option<String>,
}

impl SearchOptions {
    /// Restrict results with a metadata filter.
    pub fn with_filter(mut self, filter: MetadataFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Search `namespace` instead of the store default.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

/// Search parameters bound into a retriever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// Number of documents to return.
    pub k: usize,
    /// Candidate window for MMR.
    pub fetch_k: usize,
    /// MMR relevance/diversity trade-off.
    pub lambda_mult: f32,
    /// Minimum relevance score for similarity results.
    pub score_threshold: Option<f32>,
    /// Backend filter and namespace.
    pub options: SearchOptions,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            fetch_k: DEFAULT_FETCH_K,
            lambda_mult: DEFAULT_LAMBDA_MULT,
            score_threshold: None,
            options: SearchOptions::default(),
        }
    }
}

impl SearchParams {
    /// Create a new builder for constructing [`SearchParams`].
    pub fn builder() -> SearchParamsBuilder {
        SearchParamsBuilder::default()
    }

    /// The MMR view of these parameters.
    pub fn mmr(&self) -> MmrParams {
        MmrParams::new(self.k, self.fetch_k, self.lambda_mult)
    }

    /// Check the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`VectorStoreError::ConfigError`] if the MMR parameters are
    /// inconsistent or `score_threshold` is outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        self.mmr().validate().map_err(|e| VectorStoreError::ConfigError(e.to_string()))?;
        if let Some(threshold) = self.score_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(VectorStoreError::ConfigError(format!(
                    "score_threshold ({threshold}) must be between 0 and 1"
                )));
            }
        }
        Ok(())
    }
}

/// Builder for constructing validated [`SearchParams`].
#[derive(Debug, Clone, Default)]
pub struct SearchParamsBuilder {
    params: SearchParams,
}

impl SearchParamsBuilder {
    /// Set the number of documents to return.
    pub fn k(mut self, k: usize) -> Self {
        self.params.k = k;
        self
    }

    /// Set the MMR candidate window.
    pub fn fetch_k(mut self, fetch_k: usize) -> Self {
        self.params.fetch_k = fetch_k;
        self
    }

    /// Set the MMR relevance/diversity trade-off.
    pub fn lambda_mult(mut self, lambda_mult: f32) -> Self {
        self.params.lambda_mult = lambda_mult;
        self
    }

    /// Drop similarity results whose relevance is below `threshold`.
    pub fn score_threshold(mut self, threshold: f32) -> Self {
        self.params.score_threshold = Some(threshold);
        self
    }

    /// Restrict results with a metadata filter.
    pub fn filter(mut self, filter: MetadataFilter) -> Self {
        self.params.options.filter = Some(filter);
        self
    }

    /// Search a specific namespace.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.params.options.namespace = Some(namespace.into());
        self
    }

    /// Build the [`SearchParams`].
    ///
    /// # Errors
    ///
    /// See [`SearchParams::validate`].
    pub fn build(self) -> Result<SearchParams> {
        self.params.validate()?;
        Ok(self.params)
    }
}
