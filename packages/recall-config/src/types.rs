use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub enrichment: Enrichment,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	/// Page size used when a request does not carry one.
	#[serde(default = "default_limit")]
	pub default_limit: u32,
	/// Largest page size a request may ask for.
	#[serde(default = "default_max_limit")]
	pub max_limit: u32,
	/// One of "vector", "text" or "both".
	#[serde(default = "default_mode")]
	pub default_mode: String,
	/// Each concept fetches `limit * concept_overfetch_factor + offset` neighbors so the
	/// intersection across concepts has enough candidates to work with.
	#[serde(default = "default_concept_overfetch_factor")]
	pub concept_overfetch_factor: u32,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			default_limit: default_limit(),
			max_limit: default_max_limit(),
			default_mode: default_mode(),
			concept_overfetch_factor: default_concept_overfetch_factor(),
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct Enrichment {
	/// Replaces the `.jsonl` extension of an archive path to locate its summary file.
	#[serde(default = "default_summary_suffix")]
	pub summary_suffix: String,
	/// Summaries at or above this many characters are left out of markdown output.
	#[serde(default = "default_max_summary_chars")]
	pub max_summary_chars: usize,
}
impl Default for Enrichment {
	fn default() -> Self {
		Self {
			summary_suffix: default_summary_suffix(),
			max_summary_chars: default_max_summary_chars(),
		}
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_limit() -> u32 {
	10
}

fn default_max_limit() -> u32 {
	100
}

fn default_mode() -> String {
	"both".to_string()
}

fn default_concept_overfetch_factor() -> u32 {
	5
}

fn default_summary_suffix() -> String {
	"-summary.txt".to_string()
}

fn default_max_summary_chars() -> usize {
	300
}
