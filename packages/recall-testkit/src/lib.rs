//! Throwaway Postgres databases and Qdrant collections for tests that need the real backends.
//!
//! Tests read `RECALL_PG_DSN` and `RECALL_QDRANT_URL`; when either is unset they skip.

mod error;

pub use error::{Error, Result};

use std::{collections::HashSet, env, str::FromStr, sync::Mutex, time::Duration};

use qdrant_client::Qdrant;
use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::time;
use uuid::Uuid;

const ADMIN_DATABASES: [&str; 2] = ["postgres", "template1"];

pub struct TestDatabase {
	name: String,
	dsn: String,
	admin_options: PgConnectOptions,
	collections: Mutex<HashSet<String>>,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base_options = PgConnectOptions::from_str(base_dsn)
			.map_err(|err| Error::Message(format!("Failed to parse RECALL_PG_DSN: {err}.")))?;
		let (admin_options, mut admin_conn) = connect_admin(&base_options).await?;
		let name = format!("recall_test_{}", Uuid::new_v4().simple());

		admin_conn
			.execute(format!(r#"CREATE DATABASE "{name}""#).as_str())
			.await
			.map_err(|err| Error::Message(format!("Failed to create test database: {err}.")))?;

		let dsn = base_options.database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, admin_options, collections: Mutex::new(HashSet::new()) })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	/// A collection name unique to this database; it is deleted by [`TestDatabase::cleanup`].
	pub fn collection_name(&self, prefix: &str) -> String {
		let collection = format!("{prefix}_{}", self.name);
		let mut tracked = self.collections.lock().unwrap_or_else(|err| err.into_inner());

		tracked.insert(collection.clone());

		collection
	}

	pub async fn cleanup(self) -> Result<()> {
		let collections = {
			let tracked = self.collections.lock().unwrap_or_else(|err| err.into_inner());

			tracked.iter().cloned().collect::<Vec<_>>()
		};
		let qdrant_result = cleanup_qdrant_collections(&collections).await;

		cleanup_database(&self.name, &self.admin_options).await?;

		qdrant_result
	}
}

pub fn env_dsn() -> Option<String> {
	env::var("RECALL_PG_DSN").ok()
}

pub fn env_qdrant_url() -> Option<String> {
	env::var("RECALL_QDRANT_URL").ok()
}

async fn connect_admin(
	base_options: &PgConnectOptions,
) -> Result<(PgConnectOptions, PgConnection)> {
	let mut last_err = None;

	for database in ADMIN_DATABASES {
		let options = base_options.clone().database(database);

		match PgConnection::connect_with(&options).await {
			Ok(conn) => return Ok((options, conn)),
			Err(err) => last_err = Some(err),
		}
	}

	Err(Error::Message(format!("Failed to connect to an admin database: {last_err:?}.")))
}

async fn cleanup_database(name: &str, admin_options: &PgConnectOptions) -> Result<()> {
	let mut conn = PgConnection::connect_with(admin_options).await?;
	let _ = sqlx::query(
		"\
SELECT pg_terminate_backend(pid)
FROM pg_stat_activity
WHERE datname = $1 AND pid <> pg_backend_pid()",
	)
	.bind(name)
	.fetch_all(&mut conn)
	.await;

	sqlx::query(format!(r#"DROP DATABASE IF EXISTS "{name}""#).as_str())
		.execute(&mut conn)
		.await
		.map_err(|err| Error::Message(format!("Failed to drop test database: {err}.")))?;

	Ok(())
}

async fn cleanup_qdrant_collections(collections: &[String]) -> Result<()> {
	if collections.is_empty() {
		return Ok(());
	}

	let Some(qdrant_url) = env_qdrant_url() else {
		eprintln!("Skipping Qdrant cleanup; set RECALL_QDRANT_URL to delete test collections.");

		return Ok(());
	};
	let client = Qdrant::from_url(&qdrant_url).build()?;

	for collection in collections {
		match time::timeout(Duration::from_secs(10), client.delete_collection(collection.clone()))
			.await
		{
			Ok(Ok(_)) => {},
			Ok(Err(err)) => eprintln!("Failed to delete Qdrant collection {collection:?}: {err}."),
			Err(_) => eprintln!("Timed out deleting Qdrant collection {collection:?}."),
		}
	}

	Ok(())
}
