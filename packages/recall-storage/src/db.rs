use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{Result, schema};

/// Owns the Postgres pool. Every query checks a connection out for its own duration and the
/// pool takes it back when the query future completes or is dropped.
pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &recall_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	pub async fn ensure_schema(&self) -> Result<()> {
		let sql = schema::render_schema();
		let lock_id: i64 = 7_120_115;
		// Advisory locks are held per connection, so the transaction pins one connection and
		// releases the lock when it ends.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(lock_id).execute(&mut *tx).await?;

		for statement in sql.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		Ok(())
	}
}
