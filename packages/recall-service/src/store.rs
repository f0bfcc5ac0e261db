//! Postgres + Qdrant implementation of [`ExchangeStore`].

use std::collections::HashMap;

use recall_storage::{
	db::Db,
	models::{ExchangeRow, ToolCallRow, VectorHit},
	qdrant::QdrantStore,
	queries,
};

use crate::{BoxFuture, Exchange, ExchangeStore, Result, ScoredExchange, TimeRange, ToolCall};

const TOP_UP_ROUNDS: usize = 2;

pub struct ArchiveStore {
	db: Db,
	qdrant: QdrantStore,
}
impl ArchiveStore {
	pub fn new(db: Db, qdrant: QdrantStore) -> Self {
		Self { db, qdrant }
	}

	/// Asks the index again while orphaned points (indexed but missing from Postgres) leave the
	/// window short and the index still has more to give.
	async fn nearest(
		&self,
		embedding: &[f32],
		k: usize,
		range: &TimeRange,
	) -> Result<Vec<ScoredExchange>> {
		let mut request = k;
		let mut round = 0;

		loop {
			let hits = self.qdrant.nearest(embedding.to_vec(), request as u64, range).await?;
			let exhausted = hits.len() < request;
			let mut scored = self.hydrate_hits(hits).await?;
			let missing = k.saturating_sub(scored.len());

			if missing == 0 || exhausted || round == TOP_UP_ROUNDS {
				scored.truncate(k);

				return Ok(scored);
			}

			request = request.saturating_add(missing);
			round += 1;
		}
	}

	async fn hydrate_hits(&self, hits: Vec<VectorHit>) -> Result<Vec<ScoredExchange>> {
		let ids = hits.iter().map(|hit| hit.exchange_id.clone()).collect::<Vec<_>>();
		let mut by_id = self
			.hydrate(queries::fetch_exchanges(&self.db, &ids).await?)
			.await?
			.into_iter()
			.map(|exchange| (exchange.id.clone(), exchange))
			.collect::<HashMap<_, _>>();
		let mut scored = Vec::with_capacity(hits.len());

		for hit in hits {
			let Some(exchange) = by_id.remove(&hit.exchange_id) else {
				tracing::warn!(
					exchange_id = %hit.exchange_id,
					"Vector hit has no stored exchange. Skipping."
				);

				continue;
			};

			scored.push(ScoredExchange { exchange, distance: 1.0 - hit.score });
		}

		Ok(scored)
	}

	async fn indexed_count(&self, range: &TimeRange) -> Result<u64> {
		Ok(self.qdrant.count(range).await?)
	}

	async fn substring(
		&self,
		query: &str,
		range: &TimeRange,
		limit: usize,
		offset: usize,
	) -> Result<Vec<Exchange>> {
		let pattern = queries::substring_pattern(query);
		let rows =
			queries::text_search(&self.db, &pattern, range, to_i64(limit), to_i64(offset)).await?;

		self.hydrate(rows).await
	}

	async fn substring_count(&self, query: &str, range: &TimeRange) -> Result<u64> {
		let pattern = queries::substring_pattern(query);
		let count = queries::text_count(&self.db, &pattern, range).await?;

		Ok(count.max(0) as u64)
	}

	/// Attaches tool calls and keeps the row order.
	async fn hydrate(&self, rows: Vec<ExchangeRow>) -> Result<Vec<Exchange>> {
		let ids = rows.iter().map(|row| row.id.clone()).collect::<Vec<_>>();
		let mut calls: HashMap<String, Vec<ToolCall>> = HashMap::new();

		for call in queries::fetch_tool_calls(&self.db, &ids).await? {
			let ToolCallRow { exchange_id, tool_name, called_at, .. } = call;

			calls.entry(exchange_id).or_default().push(ToolCall { tool_name, timestamp: called_at });
		}

		Ok(rows
			.into_iter()
			.map(|row| {
				let tool_calls = calls.remove(&row.id).unwrap_or_default();

				exchange_from_row(row, tool_calls)
			})
			.collect())
	}
}
impl ExchangeStore for ArchiveStore {
	fn vector_query<'a>(
		&'a self,
		embedding: &'a [f32],
		k: usize,
		range: &'a TimeRange,
	) -> BoxFuture<'a, Result<Vec<ScoredExchange>>> {
		Box::pin(self.nearest(embedding, k, range))
	}

	fn vector_count<'a>(&'a self, range: &'a TimeRange) -> BoxFuture<'a, Result<u64>> {
		Box::pin(self.indexed_count(range))
	}

	fn text_query<'a>(
		&'a self,
		query: &'a str,
		range: &'a TimeRange,
		limit: usize,
		offset: usize,
	) -> BoxFuture<'a, Result<Vec<Exchange>>> {
		Box::pin(self.substring(query, range, limit, offset))
	}

	fn text_count<'a>(
		&'a self,
		query: &'a str,
		range: &'a TimeRange,
	) -> BoxFuture<'a, Result<u64>> {
		Box::pin(self.substring_count(query, range))
	}
}

fn exchange_from_row(row: ExchangeRow, tool_calls: Vec<ToolCall>) -> Exchange {
	Exchange {
		id: row.id,
		project: row.project,
		timestamp: row.occurred_at,
		user_message: row.user_message,
		assistant_message: row.assistant_message,
		archive_path: row.archive_path,
		line_start: row.line_start.max(1) as u32,
		line_end: row.line_end.max(row.line_start).max(1) as u32,
		tool_calls,
	}
}

fn to_i64(value: usize) -> i64 {
	i64::try_from(value).unwrap_or(i64::MAX)
}
