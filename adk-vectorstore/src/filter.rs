//! Metadata filters applied by backends during nearest-neighbor queries.
//!
//! A [`MetadataFilter`] holds `must` (AND) and `must_not` (AND-NOT)
//! conditions over payload fields. Backends either evaluate it in-process
//! via [`MetadataFilter::matches`] or translate it into their native filter
//! language.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A predicate on a single metadata field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "lowercase")]
pub enum FieldCondition {
    /// Field equals the value.
    Eq(Value),
    /// Field is present and differs from the value.
    Ne(Value),
    /// Field equals any of the values.
    In(Vec<Value>),
    /// Numeric field strictly greater than the bound.
    Gt(f64),
    /// Numeric field greater than or equal to the bound.
    Gte(f64),
    /// Numeric field strictly less than the bound.
    Lt(f64),
    /// Numeric field less than or equal to the bound.
    Lte(f64),
}

/// A named-field condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
    /// The metadata key the condition applies to.
    pub field: String,
    /// The condition itself.
    #[serde(flatten)]
    pub condition: FieldCondition,
}

/// Conjunction of `must` conditions and negated `must_not` conditions.
///
/// # Example
///
/// ```rust,ignore
/// use adk_vectorstore::{FieldCondition, MetadataFilter};
///
/// let filter = MetadataFilter::new()
///     .must("topic", FieldCondition::Eq("rust".into()))
///     .must_not("draft", FieldCondition::Eq(true.into()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataFilter {
    /// Conditions that must all hold.
    #[serde(default)]
    pub must: Vec<FieldFilter>,
    /// Conditions that must all fail.
    #[serde(default)]
    pub must_not: Vec<FieldFilter>,
}

impl MetadataFilter {
    /// Create an empty filter that matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single equality condition.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().must(field, FieldCondition::Eq(value.into()))
    }

    /// Add a condition that must hold.
    pub fn must(mut self, field: impl Into<String>, condition: FieldCondition) -> Self {
        self.must.push(FieldFilter { field: field.into(), condition });
        self
    }

    /// Add a condition that must not hold.
    pub fn must_not(mut self, field: impl Into<String>, condition: FieldCondition) -> Self {
        self.must_not.push(FieldFilter { field: field.into(), condition });
        self
    }

    /// Whether the filter has no conditions.
    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.must_not.is_empty()
    }

    /// Evaluate the filter against a payload.
    pub fn matches(&self, payload: &Map<String, Value>) -> bool {
        self.must.iter().all(|f| evaluate(payload, f))
            && !self.must_not.iter().any(|f| evaluate(payload, f))
    }
}

fn evaluate(payload: &Map<String, Value>, filter: &FieldFilter) -> bool {
    let Some(value) = payload.get(&filter.field) else {
        return false;
    };

    match &filter.condition {
        FieldCondition::Eq(expected) => json_eq(value, expected),
        FieldCondition::Ne(expected) => !json_eq(value, expected),
        FieldCondition::In(candidates) => candidates.iter().any(|c| json_eq(value, c)),
        FieldCondition::Gt(bound) => compare(value, *bound) == Some(Ordering::Greater),
        FieldCondition::Gte(bound) => {
            matches!(compare(value, *bound), Some(Ordering::Greater | Ordering::Equal))
        }
        FieldCondition::Lt(bound) => compare(value, *bound) == Some(Ordering::Less),
        FieldCondition::Lte(bound) => {
            matches!(compare(value, *bound), Some(Ordering::Less | Ordering::Equal))
        }
    }
}

/// Equality that treats `1` and `1.0` as the same number.
fn json_eq(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn compare(value: &Value, bound: f64) -> Option<Ordering> {
    value.as_f64().and_then(|v| v.partial_cmp(&bound))
}
