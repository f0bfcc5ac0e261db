use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use recall_service::{ConceptSearchRequest, OutputFormat, RecallService, SearchMode, SearchRequest};
use recall_storage::{db::Db, qdrant::QdrantStore};

#[derive(Debug, Parser)]
#[command(
	version = recall_cli::VERSION,
	rename_all = "kebab",
	styles = recall_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
#[command(rename_all = "kebab")]
pub enum Command {
	/// Semantic and/or substring search for one query.
	Search {
		query: String,
		/// vector, text, or both. Defaults to `search.default_mode`.
		#[arg(long, short = 'm')]
		mode: Option<SearchMode>,
		#[command(flatten)]
		page: PageArgs,
	},
	/// Conversations that match every concept.
	Concepts {
		#[arg(required = true, num_args = 1..)]
		concepts: Vec<String>,
		#[command(flatten)]
		page: PageArgs,
	},
	/// Creates the Postgres tables and the Qdrant collection when missing.
	Init,
}

#[derive(Debug, ClapArgs)]
#[command(rename_all = "kebab")]
pub struct PageArgs {
	#[arg(long, short = 'l')]
	pub limit: Option<usize>,
	#[arg(long, short = 'o')]
	pub offset: Option<usize>,
	/// Only exchanges on or after this date (YYYY-MM-DD).
	#[arg(long)]
	pub after: Option<String>,
	/// Only exchanges before this date (YYYY-MM-DD).
	#[arg(long)]
	pub before: Option<String>,
	#[arg(long, short = 'f', default_value = "markdown")]
	pub format: OutputFormat,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = recall_config::load(&args.config)?;

	init_tracing(&config)?;

	let db = Db::connect(&config.storage.postgres).await?;
	let qdrant = QdrantStore::new(&config.storage.qdrant)?;

	if let Command::Init = args.command {
		db.ensure_schema().await?;
		qdrant.ensure_collection().await?;

		tracing::info!(collection = %qdrant.collection, "Storage initialized.");

		return Ok(());
	}

	let service = RecallService::new(config, db, qdrant);
	let renderer = service.renderer();
	let rendered = match args.command {
		Command::Search { query, mode, page } => {
			let req = SearchRequest {
				query,
				mode,
				limit: page.limit,
				offset: page.offset,
				after: page.after,
				before: page.before,
			};

			renderer.search(&service.search(req).await?, page.format)?
		},
		Command::Concepts { concepts, page } => {
			let req = ConceptSearchRequest {
				concepts,
				limit: page.limit,
				offset: page.offset,
				after: page.after,
				before: page.before,
			};

			renderer.concepts(&service.search_concepts(req).await?, page.format)?
		},
		Command::Init => return Ok(()),
	};

	println!("{rendered}");

	Ok(())
}

fn init_tracing(config: &recall_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	Ok(())
}
