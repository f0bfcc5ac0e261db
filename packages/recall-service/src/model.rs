use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, pagination::Pagination, snippet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
	pub tool_name: String,
	#[serde(
		default,
		with = "time::serde::rfc3339::option",
		skip_serializing_if = "Option::is_none"
	)]
	pub timestamp: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
	pub id: String,
	pub project: String,
	#[serde(with = "time::serde::rfc3339")]
	pub timestamp: OffsetDateTime,
	pub user_message: String,
	pub assistant_message: String,
	pub archive_path: String,
	pub line_start: u32,
	pub line_end: u32,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub tool_calls: Vec<ToolCall>,
}

/// A vector-index neighbor. `distance` is `1 - cosine similarity`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredExchange {
	pub exchange: Exchange,
	pub distance: f32,
}
impl ScoredExchange {
	pub fn similarity(&self) -> f32 {
		1.0 - self.distance
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
	Vector,
	Text,
	Both,
}
impl SearchMode {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Vector => "vector",
			Self::Text => "text",
			Self::Both => "both",
		}
	}
}
impl FromStr for SearchMode {
	type Err = Error;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"vector" => Ok(Self::Vector),
			"text" => Ok(Self::Text),
			"both" => Ok(Self::Both),
			_ => Err(Error::validation("mode", raw, "expected one of vector, text, or both.")),
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
	pub query: String,
	pub mode: Option<SearchMode>,
	pub limit: Option<usize>,
	pub offset: Option<usize>,
	/// `YYYY-MM-DD`, inclusive.
	pub after: Option<String>,
	/// `YYYY-MM-DD`, exclusive.
	pub before: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConceptSearchRequest {
	pub concepts: Vec<String>,
	pub limit: Option<usize>,
	pub offset: Option<usize>,
	pub after: Option<String>,
	pub before: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
	pub exchange: Exchange,
	/// Absent when only the substring match found this exchange.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub similarity: Option<f32>,
	pub snippet: String,
}
impl SearchResult {
	pub fn from_vector(scored: ScoredExchange) -> Self {
		let similarity = scored.similarity();

		Self::new(scored.exchange, Some(similarity))
	}

	pub fn from_text(exchange: Exchange) -> Self {
		Self::new(exchange, None)
	}

	fn new(exchange: Exchange, similarity: Option<f32>) -> Self {
		let snippet = snippet::snippet(&exchange.user_message);

		Self { exchange, similarity, snippet }
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptResult {
	pub exchange: Exchange,
	pub snippet: String,
	/// One entry per requested concept, in request order.
	pub concept_similarities: Vec<f32>,
	pub average_similarity: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
	pub results: Vec<SearchResult>,
	pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptSearchResponse {
	pub results: Vec<ConceptResult>,
	pub pagination: Pagination,
	pub concepts: Vec<String>,
}
