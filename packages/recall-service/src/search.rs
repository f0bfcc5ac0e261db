use crate::{
	RecallService, Result, SearchMode, SearchRequest, SearchResponse, SearchResult,
	merge,
	pagination::{self, Pagination},
	validate::{self, Window},
};

impl RecallService {
	/// Single-query search. Every argument is checked before the embedding provider or the store
	/// is touched.
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		let window = validate::window(
			req.limit,
			req.offset,
			req.after.as_deref(),
			req.before.as_deref(),
			&self.cfg.search,
		)?;
		let query = validate::query_text(&req.query)?;
		let mode = validate::mode(req.mode, &self.cfg.search)?;
		let response = match mode {
			SearchMode::Vector => self.search_vector(query, &window).await?,
			SearchMode::Text => self.search_text(query, &window).await?,
			SearchMode::Both => self.search_both(query, &window).await?,
		};

		tracing::info!(
			mode = mode.as_str(),
			limit = window.limit,
			offset = window.offset,
			total = response.pagination.total,
			returned = response.results.len(),
			"Search completed."
		);

		Ok(response)
	}

	/// `total` is the number of embedded exchanges inside the range, since every one of them is a
	/// ranked neighbor of the query. A short window means the index ran dry, so its size is exact.
	async fn search_vector(&self, query: &str, window: &Window) -> Result<SearchResponse> {
		let k = window.limit.saturating_add(window.offset);
		let (candidates, indexed) = tokio::try_join!(
			self.vector_candidates(query, k, &window.range),
			self.store.vector_count(&window.range),
		)?;
		let total = vector_total(indexed, candidates.len(), k);
		let results = pagination::window(candidates, window.offset, window.limit)
			.into_iter()
			.map(SearchResult::from_vector)
			.collect::<Vec<_>>();

		Ok(page(results, total, window))
	}

	async fn search_text(&self, query: &str, window: &Window) -> Result<SearchResponse> {
		let (rows, total) =
			self.text_page(query, &window.range, window.limit, window.offset).await?;
		let results = rows.into_iter().map(SearchResult::from_text).collect::<Vec<_>>();

		Ok(page(results, total, window))
	}

	/// `total` is the size of the deduplicated window, not a corpus-wide count.
	async fn search_both(&self, query: &str, window: &Window) -> Result<SearchResponse> {
		let k = window.limit.saturating_add(window.offset);
		let (vector, text) = tokio::try_join!(
			self.vector_candidates(query, k, &window.range),
			self.store.text_query(query, &window.range, k, 0),
		)?;
		let merged = merge::merge_candidates(vector, text);
		let total = merged.len() as u64;
		let results = pagination::window(merged, window.offset, window.limit)
			.into_iter()
			.map(|candidate| candidate.result)
			.collect::<Vec<_>>();

		Ok(page(results, total, window))
	}
}

/// The indexed count can include points whose rows are gone; it only stands while the window is
/// full.
fn vector_total(indexed: u64, candidates: usize, k: usize) -> u64 {
	if candidates < k { candidates as u64 } else { indexed.max(candidates as u64) }
}

fn page(results: Vec<SearchResult>, total: u64, window: &Window) -> SearchResponse {
	let pagination = Pagination::new(total, window.limit, window.offset, results.len());

	SearchResponse { results, pagination }
}
