use std::collections::HashMap;

use crate::{Exchange, ScoredExchange, SearchResult};

/// Ranking score given to candidates only the substring match found.
pub const NEUTRAL_TEXT_SCORE: f32 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
	Vector,
	Text,
	Both,
}

/// A merged candidate. `score` orders the window and never reaches the output.
#[derive(Debug, Clone)]
pub struct Candidate {
	pub result: SearchResult,
	pub origin: Origin,
	pub score: f32,
}

/// Unions both streams by exchange id. Vector candidates keep their similarity; text-only ones
/// get [`NEUTRAL_TEXT_SCORE`]. The result is sorted by score, descending, and is stable so equal
/// scores keep vector order followed by text order.
pub fn merge_candidates(vector: Vec<ScoredExchange>, text: Vec<Exchange>) -> Vec<Candidate> {
	let mut merged = Vec::with_capacity(vector.len() + text.len());
	let mut seen: HashMap<String, usize> = HashMap::with_capacity(vector.len() + text.len());

	for scored in vector {
		if seen.contains_key(&scored.exchange.id) {
			continue;
		}

		let score = scored.similarity();

		seen.insert(scored.exchange.id.clone(), merged.len());
		merged.push(Candidate {
			result: SearchResult::from_vector(scored),
			origin: Origin::Vector,
			score,
		});
	}
	for exchange in text {
		if let Some(&index) = seen.get(&exchange.id) {
			let candidate = &mut merged[index];

			if candidate.origin == Origin::Vector {
				candidate.origin = Origin::Both;
			}

			continue;
		}

		seen.insert(exchange.id.clone(), merged.len());
		merged.push(Candidate {
			result: SearchResult::from_text(exchange),
			origin: Origin::Text,
			score: NEUTRAL_TEXT_SCORE,
		});
	}

	merged.sort_by(|a, b| b.score.total_cmp(&a.score));

	merged
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use time::macros::datetime;

	use super::*;

	fn exchange(id: &str) -> Exchange {
		Exchange {
			id: id.to_string(),
			project: "recall".to_string(),
			timestamp: datetime!(2025-03-01 12:00 UTC),
			user_message: format!("question {id}"),
			assistant_message: format!("answer {id}"),
			archive_path: format!("/archive/{id}.jsonl"),
			line_start: 1,
			line_end: 2,
			tool_calls: Vec::new(),
		}
	}

	fn scored(id: &str, distance: f32) -> ScoredExchange {
		ScoredExchange { exchange: exchange(id), distance }
	}

	fn ids(candidates: &[Candidate]) -> Vec<&str> {
		candidates.iter().map(|c| c.result.exchange.id.as_str()).collect()
	}

	#[test]
	fn overlapping_ids_appear_once_with_vector_similarity() {
		let merged = merge_candidates(
			vec![scored("a", 0.1), scored("b", 0.4)],
			vec![exchange("b"), exchange("c")],
		);
		let unique = merged.iter().map(|c| &c.result.exchange.id).collect::<HashSet<_>>();

		assert_eq!(unique.len(), merged.len());
		assert_eq!(ids(&merged), vec!["a", "b", "c"]);

		let b = &merged[1];

		assert_eq!(b.origin, Origin::Both);
		assert!((b.result.similarity.expect("vector similarity") - 0.6).abs() < 1e-6);
		assert_eq!(merged[2].origin, Origin::Text);
		assert_eq!(merged[2].result.similarity, None);
	}

	#[test]
	fn negative_similarity_ranks_below_text_only() {
		let merged = merge_candidates(vec![scored("far", 1.3)], vec![exchange("t")]);

		assert_eq!(ids(&merged), vec!["t", "far"]);
	}

	#[test]
	fn text_only_candidates_keep_recency_order() {
		let merged = merge_candidates(Vec::new(), vec![exchange("new"), exchange("old")]);

		assert_eq!(ids(&merged), vec!["new", "old"]);
		assert!(merged.iter().all(|c| c.score == NEUTRAL_TEXT_SCORE));
	}
}
