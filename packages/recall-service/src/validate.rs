//! Request checks that run before any embedding or store access.

use std::sync::LazyLock;

use regex::Regex;
use time::{Date, OffsetDateTime, Time, macros::format_description};

use crate::{Error, Result, TimeRange, model::SearchMode};

static DATE_SHAPE: LazyLock<Option<Regex>> =
	LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").ok());

/// Limit, offset, and time range after defaults are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
	pub limit: usize,
	pub offset: usize,
	pub range: TimeRange,
}

pub fn query_text(query: &str) -> Result<&str> {
	let trimmed = query.trim();

	if trimmed.is_empty() {
		return Err(Error::validation("query", query, "must be non-empty."));
	}

	Ok(trimmed)
}

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(parameter: &str, value: &str) -> Result<Date> {
	let shaped = DATE_SHAPE.as_ref().is_some_and(|re| re.is_match(value));

	if !shaped {
		return Err(Error::validation(parameter, value, "expected a date in YYYY-MM-DD format."));
	}

	Date::parse(value, format_description!("[year]-[month]-[day]"))
		.map_err(|_| Error::validation(parameter, value, "is not a real calendar date."))
}

/// `after` is inclusive and `before` is exclusive; both resolve to UTC midnight.
pub fn time_range(after: Option<&str>, before: Option<&str>) -> Result<TimeRange> {
	let start = after.map(|raw| parse_date("after", raw)).transpose()?.map(midnight_utc);
	let end = before.map(|raw| parse_date("before", raw)).transpose()?.map(midnight_utc);

	Ok(TimeRange { start, end })
}

pub fn limit(limit: Option<usize>, cfg: &recall_config::Search) -> Result<usize> {
	let max = cfg.max_limit as usize;
	let Some(limit) = limit else {
		return Ok(cfg.default_limit as usize);
	};

	if limit == 0 || limit > max {
		return Err(Error::validation(
			"limit",
			limit.to_string(),
			format!("must be between 1 and {max}."),
		));
	}

	Ok(limit)
}

/// Explicit mode, or the configured default.
pub fn mode(mode: Option<SearchMode>, cfg: &recall_config::Search) -> Result<SearchMode> {
	match mode {
		Some(mode) => Ok(mode),
		None => cfg.default_mode.parse(),
	}
}

/// Dates first, then paging, so a malformed date is always the reported error.
pub fn window(
	limit_raw: Option<usize>,
	offset: Option<usize>,
	after: Option<&str>,
	before: Option<&str>,
	cfg: &recall_config::Search,
) -> Result<Window> {
	let range = time_range(after, before)?;
	let limit = limit(limit_raw, cfg)?;

	Ok(Window { limit, offset: offset.unwrap_or(0), range })
}

/// Trims each concept. An empty list is allowed; a blank entry is not.
pub fn concepts(concepts: &[String]) -> Result<Vec<String>> {
	concepts
		.iter()
		.map(|concept| {
			let trimmed = concept.trim();

			if trimmed.is_empty() {
				return Err(Error::validation("concepts", concept, "must not contain blank terms."));
			}

			Ok(trimmed.to_string())
		})
		.collect()
}

fn midnight_utc(date: Date) -> OffsetDateTime {
	date.with_time(Time::MIDNIGHT).assume_utc()
}

#[cfg(test)]
mod tests {
	use time::macros::{date, datetime};

	use super::*;

	fn search_cfg() -> recall_config::Search {
		recall_config::Search::default()
	}

	fn parameter_of(err: Error) -> String {
		match err {
			Error::Validation { parameter, .. } => parameter,
			other => panic!("Expected a validation error, got {other:?}."),
		}
	}

	#[test]
	fn accepts_real_dates() {
		assert_eq!(parse_date("after", "2024-02-29").expect("leap day"), date!(2024-02-29));
	}

	#[test]
	fn rejects_malformed_dates_by_name() {
		for raw in [
			"2024/01/01",
			"24-01-01",
			"2024-1-1",
			"2024-01-01T00:00",
			" 2024-01-01",
			"",
			"\u{ff12}\u{ff10}\u{ff12}\u{ff14}-01-01",
			"\u{0662}\u{0660}\u{0662}\u{0664}-01-01",
		] {
			let err = parse_date("before", raw).expect_err("malformed date");

			assert!(err.to_string().contains("before"), "{raw:?} -> {err}");
			assert!(err.to_string().contains("YYYY-MM-DD"));
		}
	}

	#[test]
	fn rejects_impossible_calendar_dates() {
		for raw in ["2023-02-29", "2024-13-01", "2024-04-31", "2024-00-10"] {
			let err = parse_date("after", raw).expect_err("impossible date");

			assert!(err.to_string().contains("calendar"), "{raw:?} -> {err}");
		}
	}

	#[test]
	fn range_bounds_land_on_utc_midnight() {
		let range = time_range(Some("2025-01-01"), Some("2025-02-01")).expect("range");

		assert_eq!(range.start, Some(datetime!(2025-01-01 0:00 UTC)));
		assert_eq!(range.end, Some(datetime!(2025-02-01 0:00 UTC)));
		assert!(range.contains(datetime!(2025-01-31 23:59 UTC)));
		assert!(!range.contains(datetime!(2025-02-01 0:00 UTC)));
	}

	#[test]
	fn bad_before_is_reported_even_with_good_after() {
		let err = time_range(Some("2025-01-01"), Some("tomorrow")).expect_err("bad before");

		assert_eq!(parameter_of(err), "before");
	}

	#[test]
	fn limit_defaults_and_bounds() {
		let cfg = search_cfg();

		assert_eq!(limit(None, &cfg).expect("default"), 10);
		assert_eq!(limit(Some(100), &cfg).expect("max"), 100);
		assert_eq!(parameter_of(limit(Some(0), &cfg).expect_err("zero")), "limit");
		assert_eq!(parameter_of(limit(Some(101), &cfg).expect_err("too large")), "limit");
	}

	#[test]
	fn window_checks_dates_before_limit() {
		let err = window(Some(0), None, Some("nope"), None, &search_cfg()).expect_err("both bad");

		assert_eq!(parameter_of(err), "after");
	}

	#[test]
	fn mode_falls_back_to_config() {
		assert_eq!(mode(None, &search_cfg()).expect("default"), SearchMode::Both);
		assert_eq!(mode(Some(SearchMode::Text), &search_cfg()).expect("explicit"), SearchMode::Text);
	}

	#[test]
	fn blank_query_and_concepts_are_rejected() {
		assert_eq!(parameter_of(query_text(" \n").expect_err("blank")), "query");
		assert_eq!(query_text("  docker ").expect("query"), "docker");
		assert_eq!(
			parameter_of(concepts(&["react".to_string(), "  ".to_string()]).expect_err("blank")),
			"concepts"
		);
		assert!(concepts(&[]).expect("empty").is_empty());
	}
}
