//! Multi-concept AND search over conversations.

use std::collections::HashMap;

use futures::future;

use crate::{
	ConceptResult, ConceptSearchRequest, ConceptSearchResponse, Exchange, RecallService, Result,
	ScoredExchange,
	pagination::{self, Pagination},
	snippet, validate,
};

struct Conversation {
	representative: Exchange,
	best: Vec<Option<f32>>,
}

/// Keeps the conversations (keyed by archive path) that appear in every concept's stream.
///
/// Each concept contributes its best similarity for a conversation; the exchange shown is the
/// first one discovered. Results are ordered by average similarity, descending, with ties in
/// discovery order.
pub fn intersect(streams: Vec<Vec<ScoredExchange>>) -> Vec<ConceptResult> {
	let concept_count = streams.len();
	let mut order: Vec<String> = Vec::new();
	let mut conversations: HashMap<String, Conversation> = HashMap::new();

	if concept_count == 0 {
		return Vec::new();
	}

	for (concept_index, stream) in streams.into_iter().enumerate() {
		for scored in stream {
			let similarity = scored.similarity();
			let key = scored.exchange.archive_path.clone();
			let conversation = conversations.entry(key.clone()).or_insert_with(|| {
				order.push(key);

				Conversation { representative: scored.exchange, best: vec![None; concept_count] }
			});
			let slot = &mut conversation.best[concept_index];

			*slot = Some(slot.map_or(similarity, |current| current.max(similarity)));
		}
	}

	let mut results = Vec::new();

	for key in order {
		let Some(conversation) = conversations.remove(&key) else { continue };
		let Some(concept_similarities) = conversation.best.into_iter().collect::<Option<Vec<_>>>()
		else {
			continue;
		};
		let average_similarity =
			concept_similarities.iter().sum::<f32>() / concept_similarities.len() as f32;

		results.push(ConceptResult {
			snippet: snippet::snippet(&conversation.representative.user_message),
			exchange: conversation.representative,
			concept_similarities,
			average_similarity,
		});
	}

	results.sort_by(|a, b| b.average_similarity.total_cmp(&a.average_similarity));

	results
}

impl RecallService {
	/// Runs one vector retrieval per concept concurrently and pages over the conversations that
	/// matched all of them. `total` counts survivors inside the over-fetched window, so a
	/// conversation the window missed is not counted.
	pub async fn search_concepts(&self, req: ConceptSearchRequest) -> Result<ConceptSearchResponse> {
		let window = validate::window(
			req.limit,
			req.offset,
			req.after.as_deref(),
			req.before.as_deref(),
			&self.cfg.search,
		)?;
		let concepts = validate::concepts(&req.concepts)?;

		if concepts.is_empty() {
			return Ok(ConceptSearchResponse {
				results: Vec::new(),
				pagination: Pagination::new(0, window.limit, window.offset, 0),
				concepts,
			});
		}

		let factor = self.cfg.search.concept_overfetch_factor as usize;
		let k = window.limit.saturating_mul(factor).saturating_add(window.offset);
		let streams = future::try_join_all(
			concepts.iter().map(|concept| self.vector_candidates(concept, k, &window.range)),
		)
		.await?;
		let survivors = intersect(streams);
		let total = survivors.len() as u64;
		let results = pagination::window(survivors, window.offset, window.limit);
		let pagination = Pagination::new(total, window.limit, window.offset, results.len());

		tracing::info!(
			concepts = concepts.len(),
			k,
			total,
			returned = results.len(),
			"Concept search completed."
		);

		Ok(ConceptSearchResponse { results, pagination, concepts })
	}
}
