//! # adk-vectorstore
//!
//! Vector store abstraction for ADK-Rust agents: ingest text with metadata,
//! then retrieve it by similarity or by maximal marginal relevance (MMR).
//!
//! ## Overview
//!
//! - [`VectorStore`] - ingestion, deletion, similarity and MMR search
//! - [`VectorStoreExt`] - document ingestion, scored search, search-type dispatch
//! - [`EmbeddingVectorStore`] - a [`VectorStore`] over an [`EmbeddingProvider`]
//!   and a [`BackendIndex`]
//! - [`VectorStoreRetriever`] - a [`Retriever`] bound to one store and search type
//! - [`InMemoryIndex`] - an in-process [`BackendIndex`]
//! - [`HashingEmbeddingProvider`] - a deterministic, offline embedder
//!
//! Remote backends sit behind features:
//!
//! | Feature  | Provides |
//! |----------|----------|
//! | `openai` | `OpenAIEmbeddingProvider` |
//! | `qdrant` | `QdrantIndex` (also implements [`IndexLifecycle`]) |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use adk_vectorstore::{
//!     EmbeddingVectorStore, HashingEmbeddingProvider, InMemoryIndex, Retriever, SearchType,
//!     VectorStoreExt,
//! };
//!
//! let store = Arc::new(
//!     EmbeddingVectorStore::builder()
//!         .embedding_provider(Arc::new(HashingEmbeddingProvider::new(256)?))
//!         .backend(Arc::new(InMemoryIndex::new(256)))
//!         .build()?,
//! );
//! store.from_texts(&["Rust has ownership", "Go has goroutines"], &[]).await?;
//!
//! let retriever = store.as_retriever(SearchType::Mmr);
//! let docs = retriever.retrieve("memory safety").await?;
//! ```

pub mod backend;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod filter;
pub mod hashing;
pub mod inmemory;
pub mod lifecycle;
pub mod mmr;
pub mod relevance;
pub mod retriever;
pub mod store;
pub mod vectorstore;

#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "qdrant")]
pub mod qdrant;

pub use backend::{BackendIndex, IndexEntry, IndexQuery, Payload, QueryMatch};
pub use config::{
    AddOptions, DEFAULT_K, DeleteOptions, SearchOptions, SearchParams, SearchParamsBuilder,
    VectorStoreConfig, VectorStoreConfigBuilder,
};
pub use document::{Document, Metadata, ScoredDocument};
pub use embedding::EmbeddingProvider;
pub use error::{Result, VectorStoreError};
pub use filter::{FieldCondition, FieldFilter, MetadataFilter};
pub use hashing::HashingEmbeddingProvider;
pub use inmemory::{DistanceMetric, InMemoryIndex};
pub use lifecycle::{
    IndexDescription, IndexLifecycle, ReadinessPolicy, ensure_index, wait_until_ready,
};
pub use mmr::{
    DEFAULT_FETCH_K, DEFAULT_LAMBDA_MULT, DEFAULT_MMR_K, MmrParams, MmrSelector,
    cosine_similarity,
};
pub use relevance::{DataQualityWarning, RelevanceScoring, audit_relevance_scores};
pub use retriever::{Retriever, VectorStoreRetriever};
pub use store::{EmbeddingVectorStore, EmbeddingVectorStoreBuilder};
pub use vectorstore::{SearchType, VectorStore, VectorStoreExt};

#[cfg(feature = "openai")]
pub use openai::OpenAIEmbeddingProvider;
#[cfg(feature = "qdrant")]
pub use qdrant::QdrantIndex;
