//! Maximal Marginal Relevance (MMR) selection.
//!
//! MMR re-ranks an over-fetched candidate window so that the selected set is
//! both relevant to the query and diverse within itself. Selection is greedy:
//! the most query-similar candidate is taken first, then each step takes the
//! candidate maximizing
//!
//! ```text
//! lambda_mult * sim(query, c) - (1 - lambda_mult) * max(sim(c, s) for s in selected)
//! ```
//!
//! Ties resolve to the lowest candidate index, so selection is deterministic.
//! The cost is `O(fetch_k * k)` similarity evaluations, which is intended for
//! candidate windows of tens of items, not whole corpora.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VectorStoreError};

/// Default number of documents returned by an MMR search.
pub const DEFAULT_MMR_K: usize = 4;
/// Default size of the candidate window fetched before MMR selection.
pub const DEFAULT_FETCH_K: usize = 20;
/// Default relevance/diversity trade-off.
pub const DEFAULT_LAMBDA_MULT: f32 = 0.5;

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Parameters of a maximal marginal relevance search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MmrParams {
    /// Number of documents to return.
    pub k: usize,
    /// Number of nearest candidates fetched from the backend.
    pub fetch_k: usize,
    /// Between 0 (maximum diversity) and 1 (pure relevance).
    pub lambda_mult: f32,
}

impl Default for MmrParams {
    fn default() -> Self {
        Self { k: DEFAULT_MMR_K, fetch_k: DEFAULT_FETCH_K, lambda_mult: DEFAULT_LAMBDA_MULT }
    }
}

impl MmrParams {
    /// Create parameters with the given `k`, `fetch_k`, and `lambda_mult`.
    pub fn new(k: usize, fetch_k: usize, lambda_mult: f32) -> Self {
        Self { k, fetch_k, lambda_mult }
    }

    /// Check the request shape.
    ///
    /// # Errors
    ///
    /// Returns [`VectorStoreError::InvalidArgument`] if:
    /// - `k == 0`
    /// - `fetch_k < k`
    /// - `lambda_mult` is outside `[0, 1]`
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(VectorStoreError::invalid("k must be at least 1"));
        }
        if self.fetch_k < self.k {
            return Err(VectorStoreError::invalid(format!(
                "fetch_k ({}) must be greater than or equal to k ({})",
                self.fetch_k, self.k
            )));
        }
        if !(0.0..=1.0).contains(&self.lambda_mult) {
            return Err(VectorStoreError::invalid(format!(
                "lambda_mult ({}) must be between 0 and 1",
                self.lambda_mult
            )));
        }
        Ok(())
    }
}

/// Greedy MMR selector over a window of candidate vectors.
///
/// # Example
///
/// ```rust,ignore
/// use adk_vectorstore::{MmrParams, MmrSelector};
///
/// let selector = MmrSelector::new(MmrParams::new(2, 3, 0.3))?;
/// let picked = selector.select(&query, &candidates);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct MmrSelector {
    params: MmrParams,
}

impl MmrSelector {
    /// Create a selector after validating `params`.
    ///
    /// # Errors
    ///
    /// See [`MmrParams::validate`].
    pub fn new(params: MmrParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// The parameters this selector was built with.
    pub fn params(&self) -> &MmrParams {
        &self.params
    }

    /// Select up to `k` candidate indices, in selection order.
    ///
    /// The first index is the candidate most similar to the query. Fewer
    /// than `k` indices are returned only when the pool itself is smaller.
    pub fn select(&self, query: &[f32], candidates: &[Vec<f32>]) -> Vec<usize> {
        let target = self.params.k.min(candidates.len());
        if target == 0 {
            return Vec::new();
        }

        let lambda = self.params.lambda_mult;
        let query_similarity: Vec<f32> =
            candidates.iter().map(|c| cosine_similarity(query, c)).collect();

        let mut is_selected = vec![false; candidates.len()];
        // Highest similarity between each candidate and the selected set so far.
        let mut redundancy = vec![f32::NEG_INFINITY; candidates.len()];

        let first = argmax(&is_selected, |i| query_similarity[i]);
        let mut selected = Vec::with_capacity(target);
        let mut last = first;
        is_selected[first] = true;
        selected.push(first);

        while selected.len() < target {
            for (i, candidate) in candidates.iter().enumerate() {
                if !is_selected[i] {
                    let similarity = cosine_similarity(candidate, &candidates[last]);
                    redundancy[i] = redundancy[i].max(similarity);
                }
            }

            let next = argmax(&is_selected, |i| {
                lambda * query_similarity[i] - (1.0 - lambda) * redundancy[i]
            });
            is_selected[next] = true;
            selected.push(next);
            last = next;
        }

        selected
    }
}

/// Index of the highest-scoring unselected candidate, lowest index on ties.
///
/// Callers guarantee at least one unselected candidate remains.
fn argmax(is_selected: &[bool], score: impl Fn(usize) -> f32) -> usize {
    let mut best: Option<(usize, f32)> = None;
    for i in (0..is_selected.len()).filter(|i| !is_selected[*i]) {
        let s = score(i);
        match best {
            Some((_, current)) if s <= current || s.is_nan() => {}
            _ => best = Some((i, s)),
        }
    }
    best.map(|(i, _)| i).unwrap_or_default()
}
