pub mod concepts;
pub mod format;
pub mod merge;
pub mod model;
pub mod pagination;
pub mod search;
pub mod snippet;
pub mod store;
pub mod validate;

mod error;
mod retrieval;

pub use error::{Error, Result};
pub use format::{FsSummaries, OutputFormat, Renderer, SummaryLookup};
pub use model::{
	ConceptResult, ConceptSearchRequest, ConceptSearchResponse, Exchange, ScoredExchange,
	SearchMode, SearchRequest, SearchResponse, SearchResult, ToolCall,
};
pub use pagination::Pagination;
pub use recall_storage::models::TimeRange;
pub use store::ArchiveStore;

use std::{future::Future, pin::Pin, sync::Arc};

use recall_config::{Config, EmbeddingProviderConfig};
use recall_providers::embedding;
use recall_storage::{db::Db, qdrant::QdrantStore};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

/// Read side of the conversation archive.
///
/// Implementations only read. The vector side answers top-`k` questions and has no notion of an
/// offset; the text side pages natively.
pub trait ExchangeStore
where
	Self: Send + Sync,
{
	/// The `k` nearest exchanges to `embedding` inside `range`, ascending by distance. Fewer than
	/// `k` only when nothing else is reachable.
	fn vector_query<'a>(
		&'a self,
		embedding: &'a [f32],
		k: usize,
		range: &'a TimeRange,
	) -> BoxFuture<'a, Result<Vec<ScoredExchange>>>;

	/// Number of embedded exchanges inside `range`.
	fn vector_count<'a>(&'a self, range: &'a TimeRange) -> BoxFuture<'a, Result<u64>>;

	/// Case-insensitive substring match on either message, newest first.
	fn text_query<'a>(
		&'a self,
		query: &'a str,
		range: &'a TimeRange,
		limit: usize,
		offset: usize,
	) -> BoxFuture<'a, Result<Vec<Exchange>>>;

	fn text_count<'a>(
		&'a self,
		query: &'a str,
		range: &'a TimeRange,
	) -> BoxFuture<'a, Result<u64>>;
}

struct DefaultEmbedding;
impl EmbeddingProvider for DefaultEmbedding {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

pub struct RecallService {
	pub cfg: Config,
	pub store: Arc<dyn ExchangeStore>,
	pub embedding: Arc<dyn EmbeddingProvider>,
}
impl RecallService {
	pub fn new(cfg: Config, db: Db, qdrant: QdrantStore) -> Self {
		let store = Arc::new(ArchiveStore::new(db, qdrant));

		Self { cfg, store, embedding: Arc::new(DefaultEmbedding) }
	}

	pub fn with_parts(
		cfg: Config,
		store: Arc<dyn ExchangeStore>,
		embedding: Arc<dyn EmbeddingProvider>,
	) -> Self {
		Self { cfg, store, embedding }
	}

	/// Markdown/JSON renderer wired to summaries next to the archive files.
	pub fn renderer(&self) -> Renderer<FsSummaries> {
		Renderer::new(
			FsSummaries::new(self.cfg.enrichment.summary_suffix.clone()),
			self.cfg.enrichment.max_summary_chars,
		)
	}
}
