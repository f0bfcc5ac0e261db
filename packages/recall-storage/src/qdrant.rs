pub const DENSE_VECTOR_NAME: &str = "dense";
pub const EXCHANGE_ID_FIELD: &str = "exchange_id";
pub const ARCHIVE_PATH_FIELD: &str = "archive_path";
pub const TIMESTAMP_FIELD: &str = "timestamp_unix";

use std::collections::HashMap;

use qdrant_client::{
	client::Payload,
	qdrant::{
		Condition, CountPointsBuilder, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder,
		Distance, FieldType, Filter, PointStruct, Query, QueryPointsBuilder, Range, ScoredPoint,
		UpsertPointsBuilder, Value, Vector, VectorParamsBuilder, VectorsConfigBuilder,
		value::Kind,
	},
};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Error, Result,
	models::{TimeRange, VectorHit},
};

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &recall_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	/// Top-`k` neighbors of `vector`, best first. The index has no offset; callers that page
	/// through results ask for a larger `k` and skip locally.
	pub async fn nearest(
		&self,
		vector: Vec<f32>,
		k: u64,
		range: &TimeRange,
	) -> Result<Vec<VectorHit>> {
		if vector.len() != self.vector_dim as usize {
			return Err(Error::InvalidArgument(format!(
				"Query vector has {} dimensions; collection expects {}.",
				vector.len(),
				self.vector_dim
			)));
		}
		if k == 0 {
			return Ok(Vec::new());
		}

		let mut search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.using(DENSE_VECTOR_NAME)
			.with_payload(true)
			.limit(k);

		if let Some(filter) = time_filter(range) {
			search = search.filter(filter);
		}

		let response = self.client.query(search).await?;

		Ok(collect_hits(&response.result))
	}

	/// Exact number of indexed exchanges inside `range`.
	pub async fn count(&self, range: &TimeRange) -> Result<u64> {
		let mut request = CountPointsBuilder::new(self.collection.clone()).exact(true);

		if let Some(filter) = time_filter(range) {
			request = request.filter(filter);
		}

		let response = self.client.count(request).await?;

		Ok(response.result.map(|result| result.count).unwrap_or(0))
	}

	pub async fn ensure_collection(&self) -> Result<()> {
		if self.client.collection_exists(self.collection.clone()).await? {
			return Ok(());
		}

		let mut vectors_config = VectorsConfigBuilder::default();

		vectors_config.add_named_vector_params(
			DENSE_VECTOR_NAME,
			VectorParamsBuilder::new(self.vector_dim.into(), Distance::Cosine),
		);

		self.client
			.create_collection(
				CreateCollectionBuilder::new(self.collection.clone()).vectors_config(vectors_config),
			)
			.await?;
		self.client
			.create_field_index(
				CreateFieldIndexCollectionBuilder::new(
					self.collection.clone(),
					TIMESTAMP_FIELD,
					FieldType::Integer,
				)
				.wait(true),
			)
			.await?;

		Ok(())
	}

	pub async fn upsert_exchange(
		&self,
		exchange_id: &str,
		archive_path: &str,
		occurred_at: OffsetDateTime,
		vector: Vec<f32>,
	) -> Result<()> {
		if vector.len() != self.vector_dim as usize {
			return Err(Error::InvalidArgument(format!(
				"Exchange {exchange_id} vector has {} dimensions; collection expects {}.",
				vector.len(),
				self.vector_dim
			)));
		}

		let mut payload = Payload::new();

		payload.insert(EXCHANGE_ID_FIELD, exchange_id.to_string());
		payload.insert(ARCHIVE_PATH_FIELD, archive_path.to_string());
		payload.insert(TIMESTAMP_FIELD, serde_json::Value::from(occurred_at.unix_timestamp()));

		let mut vectors = HashMap::new();

		vectors.insert(DENSE_VECTOR_NAME.to_string(), Vector::from(vector));

		let point = PointStruct::new(point_id(exchange_id).to_string(), vectors, payload);

		self.client
			.upsert_points(UpsertPointsBuilder::new(self.collection.clone(), vec![point]).wait(true))
			.await?;

		Ok(())
	}
}

/// Stable point id for an exchange, so re-indexing overwrites instead of duplicating.
pub fn point_id(exchange_id: &str) -> Uuid {
	Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("recall:exchange:{exchange_id}").as_bytes())
}

pub fn time_filter(range: &TimeRange) -> Option<Filter> {
	if range.is_unbounded() {
		return None;
	}

	let bounds = Range {
		gte: range.start.map(|start| start.unix_timestamp() as f64),
		lt: range.end.map(|end| end.unix_timestamp() as f64),
		..Default::default()
	};

	Some(Filter::must([Condition::range(TIMESTAMP_FIELD, bounds)]))
}

fn collect_hits(points: &[ScoredPoint]) -> Vec<VectorHit> {
	let mut out = Vec::with_capacity(points.len());

	for point in points {
		let Some(exchange_id) = payload_string(&point.payload, EXCHANGE_ID_FIELD) else {
			tracing::warn!(score = point.score, "Vector hit missing exchange_id; skipping.");

			continue;
		};

		out.push(VectorHit { exchange_id, score: point.score });
	}

	out
}

fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	match &payload.get(key)?.kind {
		Some(Kind::StringValue(text)) if !text.is_empty() => Some(text.clone()),
		_ => None,
	}
}
