use crate::{Error, Exchange, RecallService, Result, ScoredExchange, TimeRange};

impl RecallService {
	/// Embeds `query` and asks the index for its `k` nearest exchanges. The index cannot skip,
	/// so callers pass `k = limit + offset` and slice the window themselves.
	pub(crate) async fn vector_candidates(
		&self,
		query: &str,
		k: usize,
		range: &TimeRange,
	) -> Result<Vec<ScoredExchange>> {
		let vector = self.embed_query(query).await?;
		let hits = self.store.vector_query(&vector, k, range).await?;

		tracing::debug!(k, hits = hits.len(), "Vector retrieval finished.");

		Ok(hits)
	}

	/// One substring page plus the exact match count under the same predicate.
	pub(crate) async fn text_page(
		&self,
		query: &str,
		range: &TimeRange,
		limit: usize,
		offset: usize,
	) -> Result<(Vec<Exchange>, u64)> {
		let (rows, total) = tokio::try_join!(
			self.store.text_query(query, range, limit, offset),
			self.store.text_count(query, range),
		)?;

		tracing::debug!(limit, offset, rows = rows.len(), total, "Text retrieval finished.");

		Ok((rows, total))
	}

	async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
		let cfg = &self.cfg.providers.embedding;
		let texts = [query.to_string()];
		let mut vectors = self.embedding.embed(cfg, &texts).await?;
		let expected = self.cfg.storage.qdrant.vector_dim as usize;
		let Some(vector) = vectors.pop() else {
			return Err(Error::Embedding {
				message: "Embedding provider returned no vectors.".to_string(),
			});
		};

		if vector.len() != expected {
			return Err(Error::Embedding {
				message: format!(
					"Embedding has {} dimensions; the index expects {expected}.",
					vector.len()
				),
			});
		}

		Ok(vector)
	}
}
