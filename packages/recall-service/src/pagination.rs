use serde::{Deserialize, Serialize};

/// Page metadata returned alongside every result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
	pub total: u64,
	pub limit: usize,
	pub offset: usize,
	pub has_more: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub next_offset: Option<usize>,
}
impl Pagination {
	/// `returned` is the number of items actually on this page.
	pub fn new(total: u64, limit: usize, offset: usize, returned: usize) -> Self {
		let seen = offset.saturating_add(returned) as u64;
		let has_more = seen < total;
		let next_offset = has_more.then(|| offset.saturating_add(limit));

		Self { total, limit, offset, has_more, next_offset }
	}

	/// One-based index of the first item on the page, or `None` for an empty page.
	pub fn first_shown(&self, returned: usize) -> Option<usize> {
		(returned > 0).then_some(self.offset + 1)
	}
}

/// Drops the first `offset` items and keeps at most `limit`.
pub fn window<T>(items: Vec<T>, offset: usize, limit: usize) -> Vec<T> {
	items.into_iter().skip(offset).take(limit).collect()
}
