//! Markdown and JSON renderings of search responses.

use std::{collections::HashMap, fmt::Write, fs, path::PathBuf, str::FromStr};

use crate::{
	ConceptResult, ConceptSearchResponse, Error, Exchange, Result, SearchResponse, SearchResult,
	ToolCall, pagination::Pagination,
};

const ARCHIVE_EXTENSION: &str = ".jsonl";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
	Markdown,
	Json,
}
impl FromStr for OutputFormat {
	type Err = Error;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"markdown" | "md" => Ok(Self::Markdown),
			"json" => Ok(Self::Json),
			_ => Err(Error::validation("format", raw, "expected markdown or json.")),
		}
	}
}

/// Optional human-written summary for a conversation archive.
pub trait SummaryLookup
where
	Self: Send + Sync,
{
	fn summary(&self, archive_path: &str) -> Option<String>;
}

/// Reads `session-summary.txt` next to `session.jsonl`.
#[derive(Debug, Clone)]
pub struct FsSummaries {
	suffix: String,
}
impl FsSummaries {
	pub fn new(suffix: impl Into<String>) -> Self {
		Self { suffix: suffix.into() }
	}

	pub fn summary_path(&self, archive_path: &str) -> PathBuf {
		let stem = archive_path.strip_suffix(ARCHIVE_EXTENSION).unwrap_or(archive_path);

		PathBuf::from(format!("{stem}{}", self.suffix))
	}
}
impl SummaryLookup for FsSummaries {
	fn summary(&self, archive_path: &str) -> Option<String> {
		let path = self.summary_path(archive_path);

		match fs::read_to_string(&path) {
			Ok(raw) => {
				let trimmed = raw.trim();

				(!trimmed.is_empty()).then(|| trimmed.to_string())
			},
			Err(err) => {
				tracing::debug!(path = %path.display(), error = %err, "No summary for archive.");

				None
			},
		}
	}
}

pub struct Renderer<S> {
	summaries: S,
	max_summary_chars: usize,
}
impl<S> Renderer<S>
where
	S: SummaryLookup,
{
	pub fn new(summaries: S, max_summary_chars: usize) -> Self {
		Self { summaries, max_summary_chars }
	}

	pub fn search(&self, resp: &SearchResponse, format: OutputFormat) -> Result<String> {
		match format {
			OutputFormat::Json => Ok(serde_json::to_string_pretty(resp)?),
			OutputFormat::Markdown => Ok(self.search_markdown(resp)),
		}
	}

	pub fn concepts(&self, resp: &ConceptSearchResponse, format: OutputFormat) -> Result<String> {
		match format {
			OutputFormat::Json => Ok(serde_json::to_string_pretty(resp)?),
			OutputFormat::Markdown => Ok(self.concepts_markdown(resp)),
		}
	}

	fn search_markdown(&self, resp: &SearchResponse) -> String {
		let mut out = String::from("# Search Results\n\n");

		push_showing(&mut out, &resp.pagination, resp.results.len());

		for (index, result) in resp.results.iter().enumerate() {
			let number = resp.pagination.offset + index + 1;

			out.push('\n');

			let _ =
				writeln!(out, "{number}. {} - {}", heading(&result.exchange), match_label(result));

			self.push_body(&mut out, &result.exchange, &result.snippet);
		}

		push_more(&mut out, &resp.pagination);

		out
	}

	fn concepts_markdown(&self, resp: &ConceptSearchResponse) -> String {
		let mut out = String::from("# Multi-Concept Search Results\n\n");
		let _ = writeln!(out, "Concepts: {}\n", resp.concepts.join(" + "));

		push_showing(&mut out, &resp.pagination, resp.results.len());

		for (index, result) in resp.results.iter().enumerate() {
			let number = resp.pagination.offset + index + 1;

			out.push('\n');

			let _ = writeln!(
				out,
				"{number}. {} - {}% avg match",
				heading(&result.exchange),
				percent(result.average_similarity)
			);
			let _ = writeln!(out, "   Scores: {}", concept_scores(&resp.concepts, result));

			self.push_body(&mut out, &result.exchange, &result.snippet);
		}

		push_more(&mut out, &resp.pagination);

		out
	}

	fn push_body(&self, out: &mut String, exchange: &Exchange, snippet: &str) {
		if let Some(summary) = self.summaries.summary(&exchange.archive_path)
			&& summary.chars().count() < self.max_summary_chars
		{
			let _ = writeln!(out, "   {}", summary.split_whitespace().collect::<Vec<_>>().join(" "));
		}

		let _ = writeln!(out, "   \"{snippet}\"");

		if let Some(tools) = tool_tally(&exchange.tool_calls) {
			let _ = writeln!(out, "   Tools: {tools}");
		}

		let _ = writeln!(
			out,
			"   Lines {}-{} in {}",
			exchange.line_start, exchange.line_end, exchange.archive_path
		);
	}
}

fn push_showing(out: &mut String, pagination: &Pagination, returned: usize) {
	match pagination.first_shown(returned) {
		Some(first) => {
			let last = pagination.offset + returned;
			let _ = writeln!(out, "Showing {first}–{last} of {} results", pagination.total);
		},
		None => {
			let _ = writeln!(out, "Showing 0 of {} results", pagination.total);
		},
	}
}

fn push_more(out: &mut String, pagination: &Pagination) {
	if let Some(next) = pagination.next_offset.filter(|_| pagination.has_more) {
		let _ = write!(out, "\nMore results available. Use offset={next} to see the next page.\n");
	}
}

fn heading(exchange: &Exchange) -> String {
	let date = exchange.timestamp.date();

	format!(
		"[{}, {:04}-{:02}-{:02}]",
		exchange.project,
		date.year(),
		u8::from(date.month()),
		date.day()
	)
}

fn match_label(result: &SearchResult) -> String {
	match result.similarity {
		Some(similarity) => format!("{}% match", percent(similarity)),
		None => "text match".to_string(),
	}
}

fn concept_scores(concepts: &[String], result: &ConceptResult) -> String {
	concepts
		.iter()
		.zip(&result.concept_similarities)
		.map(|(concept, similarity)| format!("{concept}: {}%", percent(*similarity)))
		.collect::<Vec<_>>()
		.join(", ")
}

fn percent(similarity: f32) -> i64 {
	(similarity * 100.0).round() as i64
}

/// `Bash(3), Read(2)`: most used first, then by name.
fn tool_tally(calls: &[ToolCall]) -> Option<String> {
	if calls.is_empty() {
		return None;
	}

	let mut counts: HashMap<&str, usize> = HashMap::new();

	for call in calls {
		*counts.entry(call.tool_name.as_str()).or_default() += 1;
	}

	let mut tally = counts.into_iter().collect::<Vec<_>>();

	tally.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

	let rendered =
		tally.into_iter().map(|(name, count)| format!("{name}({count})")).collect::<Vec<_>>();

	Some(rendered.join(", "))
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;

	struct FixedSummaries(Option<String>);
	impl SummaryLookup for FixedSummaries {
		fn summary(&self, _archive_path: &str) -> Option<String> {
			self.0.clone()
		}
	}

	fn exchange(id: &str, tools: &[&str]) -> Exchange {
		Exchange {
			id: id.to_string(),
			project: "recall".to_string(),
			timestamp: datetime!(2025-01-15 10:30 UTC),
			user_message: format!("How do I fix {id}?"),
			assistant_message: "Like this.".to_string(),
			archive_path: "/archive/recall/session.jsonl".to_string(),
			line_start: 3,
			line_end: 9,
			tool_calls: tools
				.iter()
				.map(|name| ToolCall { tool_name: name.to_string(), timestamp: None })
				.collect(),
		}
	}

	fn renderer(summary: Option<&str>) -> Renderer<FixedSummaries> {
		Renderer::new(FixedSummaries(summary.map(str::to_string)), 300)
	}

	#[test]
	fn markdown_page_with_more_results() {
		let resp = SearchResponse {
			results: vec![
				SearchResult {
					exchange: exchange("a", &["Read", "Bash", "Bash", "Read", "Bash"]),
					similarity: Some(0.8),
					snippet: "How do I fix a?".to_string(),
				},
				SearchResult::from_text(exchange("b", &[])),
			],
			pagination: Pagination::new(12, 2, 4, 2),
		};
		let out =
			renderer(Some("Fixed the build.")).search(&resp, OutputFormat::Markdown).expect("render");

		assert!(out.starts_with("# Search Results\n\nShowing 5–6 of 12 results\n"));
		assert!(out.contains("5. [recall, 2025-01-15] - 80% match\n   Fixed the build.\n"));
		assert!(out.contains("   \"How do I fix a?\"\n   Tools: Bash(3), Read(2)\n"));
		assert!(out.contains("6. [recall, 2025-01-15] - text match\n"));
		assert!(out.contains("   Lines 3-9 in /archive/recall/session.jsonl\n"));
		assert!(out.ends_with("More results available. Use offset=6 to see the next page.\n"));
	}

	#[test]
	fn empty_page_keeps_pagination_context() {
		let resp = SearchResponse { results: Vec::new(), pagination: Pagination::new(3, 10, 20, 0) };
		let out = renderer(None).search(&resp, OutputFormat::Markdown).expect("render");

		assert!(out.contains("Showing 0 of 3 results"));
		assert!(!out.contains("More results available"));
	}

	#[test]
	fn long_summaries_are_left_out() {
		let long = "x".repeat(400);
		let resp = SearchResponse {
			results: vec![SearchResult::from_text(exchange("a", &[]))],
			pagination: Pagination::new(1, 10, 0, 1),
		};
		let out = renderer(Some(&long)).search(&resp, OutputFormat::Markdown).expect("render");

		assert!(!out.contains("xxxx"));
	}

	#[test]
	fn concept_markdown_lists_per_concept_scores() {
		let resp = ConceptSearchResponse {
			results: vec![ConceptResult {
				exchange: exchange("a", &[]),
				snippet: "How do I fix a?".to_string(),
				concept_similarities: vec![0.9, 0.7],
				average_similarity: 0.8,
			}],
			pagination: Pagination::new(1, 10, 0, 1),
			concepts: vec!["React".to_string(), "Router".to_string()],
		};
		let out = renderer(None).concepts(&resp, OutputFormat::Markdown).expect("render");

		assert!(out.starts_with("# Multi-Concept Search Results\n\nConcepts: React + Router\n"));
		assert!(out.contains("Showing 1–1 of 1 results"));
		assert!(out.contains(
			"1. [recall, 2025-01-15] - 80% avg match\n   Scores: React: 90%, Router: 70%\n"
		));
	}

	#[test]
	fn json_uses_literal_pagination_shape() {
		let resp = ConceptSearchResponse {
			results: Vec::new(),
			pagination: Pagination::new(0, 10, 0, 0),
			concepts: Vec::new(),
		};
		let out = renderer(None).concepts(&resp, OutputFormat::Json).expect("render");
		let value: serde_json::Value = serde_json::from_str(&out).expect("json");

		assert_eq!(
			value["pagination"],
			serde_json::json!({ "total": 0, "limit": 10, "offset": 0, "hasMore": false })
		);
		assert_eq!(value["concepts"], serde_json::json!([]));
	}

	#[test]
	fn summary_path_replaces_archive_extension() {
		let summaries = FsSummaries::new("-summary.txt");

		assert_eq!(
			summaries.summary_path("/x/y/session.jsonl"),
			PathBuf::from("/x/y/session-summary.txt")
		);
		assert_eq!(summaries.summary_path("/x/y/raw"), PathBuf::from("/x/y/raw-summary.txt"));
		assert_eq!(summaries.summary("/definitely/missing/session.jsonl"), None);
	}

	#[test]
	fn summary_files_are_trimmed_and_blank_ones_ignored() {
		let dir = std::env::temp_dir()
			.join(format!("recall_summaries_{}_{}", std::process::id(), line!()));

		fs::create_dir_all(&dir).expect("Failed to create summary dir.");
		fs::write(dir.join("full-summary.txt"), "\n  Fixed the flaky build.  \n")
			.expect("Failed to write summary.");
		fs::write(dir.join("blank-summary.txt"), " \n\t\n").expect("Failed to write summary.");

		let summaries = FsSummaries::new("-summary.txt");
		let full = summaries.summary(&dir.join("full.jsonl").to_string_lossy());
		let blank = summaries.summary(&dir.join("blank.jsonl").to_string_lossy());

		fs::remove_dir_all(&dir).expect("Failed to remove summary dir.");

		assert_eq!(full.as_deref(), Some("Fixed the flaky build."));
		assert_eq!(blank, None);
	}

	#[test]
	fn format_names_parse() {
		assert_eq!("MD".parse::<OutputFormat>().expect("format"), OutputFormat::Markdown);
		assert!("yaml".parse::<OutputFormat>().expect_err("unknown").is_validation());
	}
}
