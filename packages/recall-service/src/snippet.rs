use unicode_segmentation::UnicodeSegmentation;

/// Maximum number of user-visible characters kept in a preview.
pub const SNIPPET_CHARS: usize = 200;

const ELLIPSIS: &str = "…";

/// Single-line preview of a message: whitespace runs collapse to one space and text past
/// [`SNIPPET_CHARS`] graphemes is cut with an ellipsis.
pub fn snippet(text: &str) -> String {
	let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
	let mut graphemes = collapsed.grapheme_indices(true);

	match graphemes.nth(SNIPPET_CHARS) {
		Some((cut, _)) => format!("{}{ELLIPSIS}", collapsed[..cut].trim_end()),
		None => collapsed,
	}
}
