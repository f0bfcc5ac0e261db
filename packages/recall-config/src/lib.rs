mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Enrichment, Postgres, Providers, Qdrant, Search, Service,
	Storage,
};

use std::{fs, path::Path};

pub const SEARCH_MODES: [&str; 3] = ["vector", "text", "both"];

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(&raw).map_err(|err| match err {
		Error::ParseConfig { source, .. } => Error::ParseConfig { path: path.to_path_buf(), source },
		other => other,
	})
}

pub fn parse(raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: Default::default(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::invalid("storage.postgres.dsn", "must be non-empty."));
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::invalid("storage.postgres.pool_max_conns", "must be greater than zero."));
	}
	if cfg.storage.qdrant.url.trim().is_empty() {
		return Err(Error::invalid("storage.qdrant.url", "must be non-empty."));
	}
	if cfg.storage.qdrant.collection.trim().is_empty() {
		return Err(Error::invalid("storage.qdrant.collection", "must be non-empty."));
	}

	let embedding = &cfg.providers.embedding;

	if embedding.dimensions == 0 {
		return Err(Error::invalid("providers.embedding.dimensions", "must be greater than zero."));
	}
	if embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::invalid(
			"providers.embedding.dimensions",
			"must match storage.qdrant.vector_dim.",
		));
	}
	if embedding.api_key.trim().is_empty() {
		return Err(Error::invalid("providers.embedding.api_key", "must be non-empty."));
	}
	if embedding.api_base.trim().is_empty() {
		return Err(Error::invalid("providers.embedding.api_base", "must be non-empty."));
	}
	if embedding.timeout_ms == 0 {
		return Err(Error::invalid("providers.embedding.timeout_ms", "must be greater than zero."));
	}
	if embedding.default_headers.values().any(|value| !value.is_string()) {
		return Err(Error::invalid(
			"providers.embedding.default_headers",
			"header values must be strings.",
		));
	}

	let search = &cfg.search;

	if search.default_limit == 0 {
		return Err(Error::invalid("search.default_limit", "must be greater than zero."));
	}
	if search.default_limit > search.max_limit {
		return Err(Error::invalid("search.default_limit", "must not exceed search.max_limit."));
	}
	if search.concept_overfetch_factor == 0 {
		return Err(Error::invalid(
			"search.concept_overfetch_factor",
			"must be greater than zero.",
		));
	}
	if !SEARCH_MODES.contains(&search.default_mode.as_str()) {
		return Err(Error::invalid("search.default_mode", "must be one of vector, text, or both."));
	}
	if cfg.enrichment.summary_suffix.is_empty() {
		return Err(Error::invalid("enrichment.summary_suffix", "must be non-empty."));
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.search.default_mode = cfg.search.default_mode.trim().to_ascii_lowercase();

	let api_base = cfg.providers.embedding.api_base.trim_end_matches('/').to_string();

	cfg.providers.embedding.api_base = api_base;

	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
}
