//! Property tests for in-memory index query ordering and filtering.

use std::collections::HashSet;

use adk_vectorstore::backend::{BackendIndex, IndexEntry, IndexQuery, Payload};
use adk_vectorstore::filter::MetadataFilter;
use adk_vectorstore::inmemory::{DistanceMetric, InMemoryIndex};
use proptest::prelude::*;
use serde_json::json;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

/// Generate an entry with a normalized vector and a `group` payload field.
fn arb_entry(dim: usize) -> impl Strategy<Value = (String, Vec<f32>, u8)> {
    ("[a-z]{3,8}", arb_normalized_embedding(dim), 0u8..3)
}

fn to_entries(raw: &[(String, Vec<f32>, u8)]) -> Vec<IndexEntry> {
    let mut seen = HashSet::new();
    raw.iter()
        .filter(|(id, _, _)| seen.insert(id.clone()))
        .map(|(id, vector, group)| {
            let mut payload = Payload::new();
            payload.insert("text".to_string(), json!(id));
            payload.insert("group".to_string(), json!(group));
            IndexEntry { id: Some(id.clone()), vector: vector.clone(), payload }
        })
        .collect()
}

/// Queries return at most `top_k` matches, best first by the native metric.
mod prop_inmemory_query_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_by_distance_and_bounded_by_top_k(
            raw in proptest::collection::vec(arb_entry(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            top_k in 1usize..25,
        ) {
            let entries = to_entries(&raw);
            let unique_count = entries.len();
            let rt = tokio::runtime::Runtime::new().unwrap();
            let results = rt.block_on(async {
                let index = InMemoryIndex::new(DIM);
                index.upsert(entries, None).await.unwrap();
                let request = IndexQuery {
                    vector: &query,
                    top_k,
                    filter: None,
                    namespace: None,
                    include_vectors: false,
                };
                index.query(&request).await.unwrap()
            });

            prop_assert!(results.len() <= top_k);
            prop_assert_eq!(results.len(), top_k.min(unique_count));

            // Cosine distance: lower is better.
            for window in results.windows(2) {
                prop_assert!(
                    window[0].score <= window[1].score,
                    "results not in ascending distance order: {} > {}",
                    window[0].score,
                    window[1].score,
                );
            }
        }

        #[test]
        fn dot_product_results_ordered_descending(
            raw in proptest::collection::vec(arb_entry(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
        ) {
            let entries = to_entries(&raw);
            let rt = tokio::runtime::Runtime::new().unwrap();
            let results = rt.block_on(async {
                let index = InMemoryIndex::new(DIM).with_metric(DistanceMetric::DotProduct);
                index.upsert(entries, None).await.unwrap();
                let request = IndexQuery {
                    vector: &query,
                    top_k: 10,
                    filter: None,
                    namespace: None,
                    include_vectors: false,
                };
                index.query(&request).await.unwrap()
            });

            for window in results.windows(2) {
                prop_assert!(window[0].score >= window[1].score);
            }
        }

        #[test]
        fn filtered_results_all_match(
            raw in proptest::collection::vec(arb_entry(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            group in 0u8..3,
        ) {
            let entries = to_entries(&raw);
            let expected = entries
                .iter()
                .filter(|e| e.payload["group"] == json!(group))
                .count();
            let filter = MetadataFilter::eq("group", group);
            let rt = tokio::runtime::Runtime::new().unwrap();
            let results = rt.block_on(async {
                let index = InMemoryIndex::new(DIM);
                index.upsert(entries, None).await.unwrap();
                let request = IndexQuery {
                    vector: &query,
                    top_k: 50,
                    filter: Some(&filter),
                    namespace: None,
                    include_vectors: true,
                };
                index.query(&request).await.unwrap()
            });

            prop_assert_eq!(results.len(), expected);
            for m in &results {
                prop_assert_eq!(&m.payload["group"], &json!(group));
                prop_assert_eq!(m.vector.as_ref().map(Vec::len), Some(DIM));
            }
        }
    }
}
