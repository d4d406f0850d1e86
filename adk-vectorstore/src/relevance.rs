//! Relevance-score normalization and data-quality auditing.
//!
//! Backends report scores in their native metric. Each backend declares a
//! [`RelevanceScoring`] policy that maps the native value onto `[0, 1]`
//! (1 = identical). There is no universal formula: the policy belongs to
//! the backend.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::document::ScoredDocument;

/// Monotonic transform from a backend's native score to a relevance score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RelevanceScoring {
    /// The backend already reports a bounded similarity; used unchanged.
    Similarity,
    /// The backend reports a distance in `[0, max_distance]`.
    /// Relevance is `1 - distance / max_distance`.
    Distance {
        /// The largest distance the metric is expected to produce.
        max_distance: f32,
    },
    /// The backend reports an inner product of unit vectors in `[-1, 1]`.
    /// Relevance is `(1 + score) / 2`. Inner products of non-unit vectors
    /// fall outside that range and are reported by the audit.
    InnerProduct,
}

impl RelevanceScoring {
    /// Cosine distance (`1 - cos`), bounded by 2.
    pub const COSINE_DISTANCE: Self = Self::Distance { max_distance: 2.0 };

    /// Euclidean distance between unit vectors, bounded by 2.
    pub const EUCLIDEAN_UNIT: Self = Self::Distance { max_distance: 2.0 };

    /// Map a native score onto the relevance scale.
    ///
    /// The result is not clamped: out-of-range values are surfaced by
    /// [`audit_relevance_scores`] instead of being hidden.
    pub fn normalize(&self, raw: f32) -> f32 {
        match self {
            Self::Similarity => raw,
            Self::Distance { max_distance } => 1.0 - raw / max_distance,
            Self::InnerProduct => (1.0 + raw) / 2.0,
        }
    }
}

/// Non-fatal diagnostic raised when relevance scores fall outside `[0, 1]`.
///
/// This usually means the backend's distance metric disagrees with its
/// declared [`RelevanceScoring`]. The affected results are still returned.
#[derive(Debug, Clone, PartialEq)]
pub struct DataQualityWarning {
    /// `(position in the result list, offending score)` pairs.
    pub out_of_range: Vec<(usize, f32)>,
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "relevance scores must be between 0 and 1, got")?;
        for (i, (position, score)) in self.out_of_range.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{score} at position {position}")?;
        }
        Ok(())
    }
}

/// Check that every score lies in `[0, 1]`.
///
/// Emits a `warn!` event on the `adk_vectorstore::data_quality` target and
/// returns the warning when any score is out of range; returns `None`
/// otherwise. `NaN` counts as out of range.
pub fn audit_relevance_scores(results: &[ScoredDocument]) -> Option<DataQualityWarning> {
    let out_of_range: Vec<(usize, f32)> = results
        .iter()
        .enumerate()
        .filter(|(_, r)| !(0.0..=1.0).contains(&r.score))
        .map(|(i, r)| (i, r.score))
        .collect();

    if out_of_range.is_empty() {
        return None;
    }

    let warning = DataQualityWarning { out_of_range };
    warn!(
        target: "adk_vectorstore::data_quality",
        offending = warning.out_of_range.len(),
        result_count = results.len(),
        "{warning}"
    );
    Some(warning)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn scored(score: f32) -> ScoredDocument {
        ScoredDocument { document: Document::new("x"), score }
    }

    #[test]
    fn distance_normalization_is_monotonic_decreasing() {
        let scoring = RelevanceScoring::Distance { max_distance: 1.0 };
        assert_eq!(scoring.normalize(0.0), 1.0);
        assert_eq!(scoring.normalize(1.0), 0.0);
        assert!(scoring.normalize(0.2) > scoring.normalize(0.4));
    }

    #[test]
    fn distance_beyond_max_is_not_clamped() {
        let scoring = RelevanceScoring::Distance { max_distance: 1.0 };
        assert!((scoring.normalize(1.5) + 0.5).abs() < 1e-6);
    }

    #[test]
    fn inner_product_maps_unit_range() {
        assert_eq!(RelevanceScoring::InnerProduct.normalize(-1.0), 0.0);
        assert_eq!(RelevanceScoring::InnerProduct.normalize(1.0), 1.0);
    }

    #[test]
    fn audit_passes_in_range_scores() {
        assert!(audit_relevance_scores(&[scored(0.0), scored(0.5), scored(1.0)]).is_none());
    }

    #[test]
    fn audit_reports_out_of_range_and_nan() {
        let warning =
            audit_relevance_scores(&[scored(0.9), scored(-0.5), scored(f32::NAN)]).unwrap();
        assert_eq!(warning.out_of_range.len(), 2);
        assert_eq!(warning.out_of_range[0], (1, -0.5));
        assert_eq!(warning.out_of_range[1].0, 2);
        assert!(warning.to_string().contains("-0.5 at position 1"));
    }

    #[test]
    fn scoring_policy_serializes_with_kind_tag() {
        let json = serde_json::to_value(RelevanceScoring::COSINE_DISTANCE).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "distance", "max_distance": 2.0}));
    }
}
