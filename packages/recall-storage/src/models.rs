use time::OffsetDateTime;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExchangeRow {
	pub id: String,
	pub project: String,
	pub occurred_at: OffsetDateTime,
	pub user_message: String,
	pub assistant_message: String,
	pub archive_path: String,
	pub line_start: i32,
	pub line_end: i32,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ToolCallRow {
	pub id: String,
	pub exchange_id: String,
	pub seq: i32,
	pub tool_name: String,
	pub called_at: Option<OffsetDateTime>,
}

/// One neighbor returned by the vector index, before hydration from Postgres.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorHit {
	pub exchange_id: String,
	/// Cosine similarity as reported by the index.
	pub score: f32,
}

/// Half-open time window: `start` is inclusive, `end` is exclusive. Either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
	pub start: Option<OffsetDateTime>,
	pub end: Option<OffsetDateTime>,
}
impl TimeRange {
	pub fn is_unbounded(&self) -> bool {
		self.start.is_none() && self.end.is_none()
	}

	pub fn contains(&self, ts: OffsetDateTime) -> bool {
		self.start.map(|start| ts >= start).unwrap_or(true)
			&& self.end.map(|end| ts < end).unwrap_or(true)
	}
}
