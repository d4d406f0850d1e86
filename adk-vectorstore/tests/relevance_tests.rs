//! Relevance-score normalization through the store, and the data-quality
//! warning emitted for out-of-range scores.

use std::sync::{Arc, Mutex};

use adk_vectorstore::{
    BackendIndex, EmbeddingVectorStore, HashingEmbeddingProvider, IndexEntry, IndexQuery,
    Payload, QueryMatch, RelevanceScoring, Result, Retriever, SearchOptions, SearchParams,
    SearchType, VectorStoreExt, VectorStoreRetriever,
};
use async_trait::async_trait;
use serde_json::json;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::{Layer, Registry};

const DIM: usize = 8;

/// Returns fixed matches with raw distances, declaring a max distance of 1.
struct FixedDistanceBackend {
    distances: Vec<f32>,
}

#[async_trait]
impl BackendIndex for FixedDistanceBackend {
    fn name(&self) -> &str {
        "fixed"
    }

    fn relevance_scoring(&self) -> RelevanceScoring {
        RelevanceScoring::Distance { max_distance: 1.0 }
    }

    async fn upsert(&self, entries: Vec<IndexEntry>, _ns: Option<&str>) -> Result<Vec<String>> {
        Ok(entries.into_iter().enumerate().map(|(i, _)| i.to_string()).collect())
    }

    async fn delete(&self, _ids: &[String], _ns: Option<&str>) -> Result<bool> {
        Ok(false)
    }

    async fn query(&self, request: &IndexQuery<'_>) -> Result<Vec<QueryMatch>> {
        Ok(self
            .distances
            .iter()
            .take(request.top_k)
            .enumerate()
            .map(|(i, distance)| {
                let mut payload = Payload::new();
                payload.insert("text".to_string(), json!(format!("doc {i}")));
                QueryMatch { id: i.to_string(), payload, score: *distance, vector: None }
            })
            .collect())
    }
}

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: Level,
    target: String,
    message: String,
}

/// Collects every event into shared storage.
#[derive(Clone, Default)]
struct CaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        let metadata = event.metadata();
        self.events.lock().unwrap().push(CapturedEvent {
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: visitor.0,
        });
    }
}

impl CaptureLayer {
    fn data_quality_warnings(&self) -> Vec<CapturedEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.target == "adk_vectorstore::data_quality" && e.level == Level::WARN)
            .cloned()
            .collect()
    }
}

fn store(distances: Vec<f32>) -> Arc<EmbeddingVectorStore> {
    Arc::new(
        EmbeddingVectorStore::builder()
            .embedding_provider(Arc::new(HashingEmbeddingProvider::new(DIM).unwrap()))
            .backend(Arc::new(FixedDistanceBackend { distances }))
            .build()
            .unwrap(),
    )
}

#[tokio::test]
async fn out_of_range_score_is_returned_unclamped_with_warning() {
    let layer = CaptureLayer::default();
    let _guard = tracing::subscriber::set_default(Registry::default().with(layer.clone()));

    let results = store(vec![0.25, 1.5])
        .similarity_search_with_relevance_scores("anything", 2, &SearchOptions::default())
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert!((results[0].score - 0.75).abs() < 1e-6);
    assert!((results[1].score + 0.5).abs() < 1e-6);
    assert_eq!(results[1].document.page_content, "doc 1");

    let warnings = layer.data_quality_warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("relevance scores must be between 0 and 1"));
    assert!(warnings[0].message.contains("-0.5"));
}

#[tokio::test]
async fn in_range_scores_emit_no_warning() {
    let layer = CaptureLayer::default();
    let _guard = tracing::subscriber::set_default(Registry::default().with(layer.clone()));

    let results = store(vec![0.0, 0.5, 1.0])
        .similarity_search_with_relevance_scores("anything", 3, &SearchOptions::default())
        .await
        .unwrap();

    let scores: Vec<f32> = results.iter().map(|r| r.score).collect();
    assert_eq!(scores, vec![1.0, 0.5, 0.0]);
    assert!(layer.data_quality_warnings().is_empty());
}

#[tokio::test]
async fn threshold_search_keeps_out_of_range_results_above_threshold() {
    let layer = CaptureLayer::default();
    let _guard = tracing::subscriber::set_default(Registry::default().with(layer.clone()));

    let retriever = VectorStoreRetriever::new(store(vec![0.1, 0.6, 1.5]), SearchType::Similarity)
        .with_params(SearchParams::builder().k(3).score_threshold(0.5).build().unwrap());
    let docs = retriever.retrieve("anything").await.unwrap();

    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].page_content, "doc 0");
    assert_eq!(layer.data_quality_warnings().len(), 1);
}

#[tokio::test]
async fn search_without_scores_is_not_audited() {
    let layer = CaptureLayer::default();
    let _guard = tracing::subscriber::set_default(Registry::default().with(layer.clone()));

    let docs = store(vec![1.5]).search("anything", SearchType::Similarity).await.unwrap();
    assert_eq!(docs.len(), 1);
    assert!(layer.data_quality_warnings().is_empty());
}
