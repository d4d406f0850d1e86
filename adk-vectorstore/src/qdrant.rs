//! Qdrant backend index.
//!
//! Provides [`QdrantIndex`], a [`BackendIndex`] and [`IndexLifecycle`] over
//! one Qdrant collection using [qdrant-client](https://docs.rs/qdrant-client)
//! over gRPC.
//!
//! Namespaces are stored in a reserved payload field and enforced with a
//! filter on every query and delete. Collections are created with cosine
//! distance; Qdrant then reports cosine similarity as the score.
//!
//! # Example
//!
//! ```rust,ignore
//! use adk_vectorstore::{ReadinessPolicy, ensure_index};
//! use adk_vectorstore::qdrant::QdrantIndex;
//!
//! let index = QdrantIndex::new("http://localhost:6334", "docs")?;
//! ensure_index(&index, "docs", 384, ReadinessPolicy::default()).await?;
//! ```

use async_trait::async_trait;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::vectors_config::Config as VectorsConfigKind;
use qdrant_client::qdrant::vectors_output::VectorsOptions;
use qdrant_client::qdrant::{
    CollectionInfo, CollectionStatus, Condition, CreateCollectionBuilder, DeletePointsBuilder,
    Distance, Filter, PointId, PointStruct, Range, ScoredPoint, SearchPointsBuilder,
    UpdateStatus, UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Payload as QdrantPayload, Qdrant};
use serde_json::{Map, Number, Value};
use tracing::debug;
use uuid::Uuid;

use crate::backend::{BackendIndex, IndexEntry, IndexQuery, Payload, QueryMatch};
use crate::error::{Result, VectorStoreError};
use crate::filter::{FieldCondition, FieldFilter, MetadataFilter};
use crate::lifecycle::{IndexDescription, IndexLifecycle};
use crate::relevance::RelevanceScoring;

const BACKEND: &str = "qdrant";

/// Payload field holding the namespace of a point.
pub const NAMESPACE_FIELD: &str = "_namespace";

/// A [`BackendIndex`] backed by one [Qdrant](https://qdrant.tech/) collection.
pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
}

impl QdrantIndex {
    /// Connect to the Qdrant server at `url` and use `collection`.
    pub fn new(url: &str, collection: impl Into<String>) -> Result<Self> {
        let client = Qdrant::from_url(url).build().map_err(map_err)?;
        Ok(Self { client, collection: collection.into() })
    }

    /// Use an existing client.
    pub fn from_client(client: Qdrant, collection: impl Into<String>) -> Self {
        Self { client, collection: collection.into() }
    }

    /// The collection this index reads and writes.
    pub fn collection(&self) -> &str {
        &self.collection
    }
}

fn map_err(e: qdrant_client::QdrantError) -> VectorStoreError {
    VectorStoreError::backend(BACKEND, e.to_string())
}

fn namespace_condition(namespace: Option<&str>) -> Condition {
    match namespace {
        Some(ns) => Condition::matches(NAMESPACE_FIELD, ns.to_string()),
        None => Condition::is_empty(NAMESPACE_FIELD),
    }
}

/// Translate a filter into Qdrant conditions, scoped to `namespace`.
fn to_qdrant_filter(filter: Option<&MetadataFilter>, namespace: Option<&str>) -> Result<Filter> {
    let mut must = vec![namespace_condition(namespace)];
    let mut must_not = Vec::new();
    if let Some(filter) = filter {
        for f in &filter.must {
            must.push(to_condition(f)?);
        }
        for f in &filter.must_not {
            must_not.push(to_condition(f)?);
        }
    }
    Ok(Filter { must, must_not, ..Default::default() })
}

fn to_condition(filter: &FieldFilter) -> Result<Condition> {
    let field = filter.field.as_str();
    match &filter.condition {
        FieldCondition::Eq(value) => eq_condition(field, value),
        FieldCondition::Ne(value) => {
            // Present and different.
            let inner = Filter::must_not([eq_condition(field, value)?, Condition::is_empty(field)]);
            Ok(inner.into())
        }
        FieldCondition::In(values) => in_condition(field, values),
        FieldCondition::Gt(bound) => {
            Ok(Condition::range(field, Range { gt: Some(*bound), ..Default::default() }))
        }
        FieldCondition::Gte(bound) => {
            Ok(Condition::range(field, Range { gte: Some(*bound), ..Default::default() }))
        }
        FieldCondition::Lt(bound) => {
            Ok(Condition::range(field, Range { lt: Some(*bound), ..Default::default() }))
        }
        FieldCondition::Lte(bound) => {
            Ok(Condition::range(field, Range { lte: Some(*bound), ..Default::default() }))
        }
    }
}

fn eq_condition(field: &str, value: &Value) -> Result<Condition> {
    match value {
        Value::String(s) => Ok(Condition::matches(field, s.clone())),
        Value::Bool(b) => Ok(Condition::matches(field, *b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(Condition::matches(field, i)),
            None => {
                let x = n.as_f64().unwrap_or(f64::NAN);
                Ok(Condition::range(field, Range { gte: Some(x), lte: Some(x), ..Default::default() }))
            }
        },
        Value::Null => Ok(Condition::is_null(field)),
        Value::Array(_) | Value::Object(_) => Err(VectorStoreError::invalid(format!(
            "qdrant filter on '{field}' supports only scalar values"
        ))),
    }
}

fn in_condition(field: &str, values: &[Value]) -> Result<Condition> {
    if let Some(strings) = values.iter().map(|v| v.as_str().map(str::to_string)).collect::<Option<Vec<_>>>()
    {
        return Ok(Condition::matches(field, strings));
    }
    if let Some(ints) = values.iter().map(Value::as_i64).collect::<Option<Vec<_>>>() {
        return Ok(Condition::matches(field, ints));
    }
    let alternatives = values.iter().map(|v| eq_condition(field, v)).collect::<Result<Vec<_>>>()?;
    Ok(Filter::should(alternatives).into())
}

fn point_id_to_string(id: Option<&PointId>) -> String {
    match id.and_then(|pid| pid.point_id_options.as_ref()) {
        Some(PointIdOptions::Uuid(s)) => s.clone(),
        Some(PointIdOptions::Num(n)) => n.to_string(),
        None => String::new(),
    }
}

fn to_json(value: QdrantValue) -> Value {
    match value.kind {
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::IntegerValue(i)) => Value::Number(i.into()),
        Some(Kind::DoubleValue(d)) => Number::from_f64(d).map(Value::Number).unwrap_or(Value::Null),
        Some(Kind::ListValue(list)) => Value::Array(list.values.into_iter().map(to_json).collect()),
        Some(Kind::StructValue(s)) => {
            Value::Object(s.fields.into_iter().map(|(k, v)| (k, to_json(v))).collect())
        }
        Some(Kind::NullValue(_)) | None => Value::Null,
    }
}

fn to_match(point: ScoredPoint) -> QueryMatch {
    let id = point_id_to_string(point.id.as_ref());
    let mut payload: Payload =
        point.payload.into_iter().map(|(k, v)| (k, to_json(v))).collect::<Map<_, _>>();
    payload.remove(NAMESPACE_FIELD);
    let vector = point.vectors.and_then(|v| match v.vectors_options {
        Some(VectorsOptions::Vector(vector)) => Some(vector.data),
        _ => None,
    });
    QueryMatch { id, payload, score: point.score, vector }
}

fn describe(name: &str, info: CollectionInfo) -> IndexDescription {
    let dimensions = info
        .config
        .and_then(|c| c.params)
        .and_then(|p| p.vectors_config)
        .and_then(|vc| vc.config)
        .and_then(|config| match config {
            VectorsConfigKind::Params(params) => Some(params.size as usize),
            _ => None,
        });
    IndexDescription {
        name: name.to_string(),
        dimensions,
        ready: info.status == CollectionStatus::Green as i32,
    }
}

#[async_trait]
impl BackendIndex for QdrantIndex {
    fn name(&self) -> &str {
        BACKEND
    }

    fn relevance_scoring(&self) -> RelevanceScoring {
        // Cosine similarity in [-1, 1].
        RelevanceScoring::InnerProduct
    }

    async fn upsert(&self, entries: Vec<IndexEntry>, namespace: Option<&str>) -> Result<Vec<String>> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::with_capacity(entries.len());
        let mut points = Vec::with_capacity(entries.len());
        for entry in entries {
            let id = entry.id.unwrap_or_else(|| Uuid::new_v4().to_string());
            let mut payload = entry.payload;
            if let Some(ns) = namespace {
                payload.insert(NAMESPACE_FIELD.to_string(), ns.into());
            }
            let payload = QdrantPayload::try_from(Value::Object(payload)).map_err(map_err)?;
            points.push(PointStruct::new(id.clone(), entry.vector, payload));
            ids.push(id);
        }

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(map_err)?;

        debug!(collection = %self.collection, count = ids.len(), "upserted points to qdrant");
        Ok(ids)
    }

    async fn delete(&self, ids: &[String], namespace: Option<&str>) -> Result<bool> {
        if ids.is_empty() {
            return Ok(false);
        }

        let selector = Filter::must([
            Condition::has_id(ids.iter().cloned().map(PointId::from)),
            namespace_condition(namespace),
        ]);
        let response = self
            .client
            .delete_points(DeletePointsBuilder::new(&self.collection).points(selector).wait(true))
            .await
            .map_err(map_err)?;

        // Qdrant does not report how many points matched.
        let completed =
            response.result.is_some_and(|r| r.status == UpdateStatus::Completed as i32);
        debug!(collection = %self.collection, count = ids.len(), completed, "deleted points from qdrant");
        Ok(completed)
    }

    async fn query(&self, request: &IndexQuery<'_>) -> Result<Vec<QueryMatch>> {
        let filter = to_qdrant_filter(request.filter, request.namespace)?;
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(
                    &self.collection,
                    request.vector.to_vec(),
                    request.top_k as u64,
                )
                .filter(filter)
                .with_payload(true)
                .with_vectors(request.include_vectors),
            )
            .await
            .map_err(map_err)?;

        Ok(response.result.into_iter().map(to_match).collect())
    }
}

#[async_trait]
impl IndexLifecycle for QdrantIndex {
    async fn list_indexes(&self) -> Result<Vec<String>> {
        let response = self.client.list_collections().await.map_err(map_err)?;
        Ok(response.collections.into_iter().map(|c| c.name).collect())
    }

    async fn create_index(&self, name: &str, dimensions: usize) -> Result<()> {
        self.client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(VectorParamsBuilder::new(dimensions as u64, Distance::Cosine)),
            )
            .await
            .map_err(map_err)?;
        debug!(collection = name, dimensions, "created qdrant collection");
        Ok(())
    }

    async fn describe_index(&self, name: &str) -> Result<Option<IndexDescription>> {
        if !self.client.collection_exists(name).await.map_err(map_err)? {
            return Ok(None);
        }
        let response = self.client.collection_info(name).await.map_err(map_err)?;
        Ok(response.result.map(|info| describe(name, info)))
    }
}
