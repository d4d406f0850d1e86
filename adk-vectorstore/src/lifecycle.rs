//! Index provisioning: create, describe, and wait until ready.
//!
//! Ingestion and search assume the index exists and is ready. Backends that
//! provision indexes asynchronously implement [`IndexLifecycle`];
//! [`wait_until_ready`] polls with a fixed interval and gives up with
//! [`VectorStoreError::BackendNotReady`] once the timeout is spent.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use crate::error::{Result, VectorStoreError};

/// Snapshot of a backend index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDescription {
    /// The index name.
    pub name: String,
    /// Vector dimensionality, when the backend reports it.
    pub dimensions: Option<usize>,
    /// Whether the index accepts reads and writes.
    pub ready: bool,
}

/// Provisioning operations of a backend.
#[async_trait]
pub trait IndexLifecycle: Send + Sync {
    /// Names of existing indexes.
    async fn list_indexes(&self) -> Result<Vec<String>>;

    /// Request creation of an index. May return before it is ready.
    async fn create_index(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Describe an index, or `None` if it does not exist.
    async fn describe_index(&self, name: &str) -> Result<Option<IndexDescription>>;
}

/// Polling schedule for [`wait_until_ready`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessPolicy {
    /// Delay between two describe calls.
    pub poll_interval: Duration,
    /// Total time budget.
    pub timeout: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self { poll_interval: Duration::from_secs(5), timeout: Duration::from_secs(120) }
    }
}

/// Poll `describe_index` until the index reports ready.
///
/// # Errors
///
/// Returns [`VectorStoreError::BackendNotReady`] when the timeout elapses,
/// or the backend's own error if a describe call fails.
pub async fn wait_until_ready(
    lifecycle: &dyn IndexLifecycle,
    name: &str,
    policy: ReadinessPolicy,
) -> Result<IndexDescription> {
    let started = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        if let Some(description) = lifecycle.describe_index(name).await? {
            if description.ready {
                info!(index = name, attempts, "index ready");
                return Ok(description);
            }
        }

        let waited = started.elapsed();
        if waited + policy.poll_interval > policy.timeout {
            return Err(VectorStoreError::BackendNotReady { index: name.to_string(), waited });
        }
        debug!(index = name, attempts, ?waited, "index not ready yet");
        sleep(policy.poll_interval).await;
    }
}

/// Create the index if it does not exist, then wait until it is ready.
pub async fn ensure_index(
    lifecycle: &dyn IndexLifecycle,
    name: &str,
    dimensions: usize,
    policy: ReadinessPolicy,
) -> Result<IndexDescription> {
    let existing = lifecycle.list_indexes().await?;
    if !existing.iter().any(|n| n == name) {
        info!(index = name, dimensions, "creating index");
        lifecycle.create_index(name, dimensions).await?;
    }
    wait_until_ready(lifecycle, name, policy).await
}
