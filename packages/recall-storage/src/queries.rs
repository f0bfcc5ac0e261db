use sqlx::{Executor, Postgres, QueryBuilder};

use crate::{
	Result,
	db::Db,
	models::{ExchangeRow, TimeRange, ToolCallRow},
};

const EXCHANGE_COLUMNS: &str = "\
SELECT
	id,
	project,
	occurred_at,
	user_message,
	assistant_message,
	archive_path,
	line_start,
	line_end
FROM conversation_exchanges";

/// Turns free text into an `ILIKE` pattern that matches it as a literal substring.
pub fn substring_pattern(query: &str) -> String {
	let mut out = String::with_capacity(query.len() + 2);

	out.push('%');

	for ch in query.chars() {
		if matches!(ch, '%' | '_' | '\\') {
			out.push('\\');
		}

		out.push(ch);
	}

	out.push('%');

	out
}

/// Newest first; `id` breaks ties so pages never overlap.
pub async fn text_search(
	db: &Db,
	pattern: &str,
	range: &TimeRange,
	limit: i64,
	offset: i64,
) -> Result<Vec<ExchangeRow>> {
	let mut builder = QueryBuilder::<Postgres>::new(EXCHANGE_COLUMNS);

	push_text_predicate(&mut builder, pattern, range);

	builder.push(" ORDER BY occurred_at DESC, id ASC LIMIT ");
	builder.push_bind(limit);
	builder.push(" OFFSET ");
	builder.push_bind(offset);

	let rows = builder.build_query_as::<ExchangeRow>().fetch_all(&db.pool).await?;

	Ok(rows)
}

pub async fn text_count(db: &Db, pattern: &str, range: &TimeRange) -> Result<i64> {
	let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM conversation_exchanges");

	push_text_predicate(&mut builder, pattern, range);

	let count = builder.build_query_scalar::<i64>().fetch_one(&db.pool).await?;

	Ok(count)
}

/// Rows come back in arbitrary order; callers re-order them against the ids they asked for.
pub async fn fetch_exchanges(db: &Db, ids: &[String]) -> Result<Vec<ExchangeRow>> {
	if ids.is_empty() {
		return Ok(Vec::new());
	}

	let mut builder = QueryBuilder::<Postgres>::new(EXCHANGE_COLUMNS);

	builder.push(" WHERE id = ANY(");
	builder.push_bind(ids.to_vec());
	builder.push(")");

	let rows = builder.build_query_as::<ExchangeRow>().fetch_all(&db.pool).await?;

	Ok(rows)
}

pub async fn fetch_tool_calls(db: &Db, exchange_ids: &[String]) -> Result<Vec<ToolCallRow>> {
	if exchange_ids.is_empty() {
		return Ok(Vec::new());
	}

	let rows = sqlx::query_as::<_, ToolCallRow>(
		"\
SELECT id, exchange_id, seq, tool_name, called_at
FROM exchange_tool_calls
WHERE exchange_id = ANY($1)
ORDER BY exchange_id, seq",
	)
	.bind(exchange_ids.to_vec())
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn insert_exchange<'e, E>(executor: E, row: &ExchangeRow) -> Result<()>
where
	E: Executor<'e, Database = Postgres>,
{
	sqlx::query(
		"\
INSERT INTO conversation_exchanges (
	id,
	project,
	occurred_at,
	user_message,
	assistant_message,
	archive_path,
	line_start,
	line_end
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
ON CONFLICT (id) DO NOTHING",
	)
	.bind(row.id.as_str())
	.bind(row.project.as_str())
	.bind(row.occurred_at)
	.bind(row.user_message.as_str())
	.bind(row.assistant_message.as_str())
	.bind(row.archive_path.as_str())
	.bind(row.line_start)
	.bind(row.line_end)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn insert_tool_call<'e, E>(executor: E, row: &ToolCallRow) -> Result<()>
where
	E: Executor<'e, Database = Postgres>,
{
	sqlx::query(
		"\
INSERT INTO exchange_tool_calls (id, exchange_id, seq, tool_name, called_at)
VALUES ($1,$2,$3,$4,$5)
ON CONFLICT (id) DO NOTHING",
	)
	.bind(row.id.as_str())
	.bind(row.exchange_id.as_str())
	.bind(row.seq)
	.bind(row.tool_name.as_str())
	.bind(row.called_at)
	.execute(executor)
	.await?;

	Ok(())
}

fn push_text_predicate(builder: &mut QueryBuilder<'_, Postgres>, pattern: &str, range: &TimeRange) {
	builder.push(" WHERE (user_message ILIKE ");
	builder.push_bind(pattern.to_string());
	builder.push(" ESCAPE '\\' OR assistant_message ILIKE ");
	builder.push_bind(pattern.to_string());
	builder.push(" ESCAPE '\\')");

	if let Some(start) = range.start {
		builder.push(" AND occurred_at >= ");
		builder.push_bind(start);
	}
	if let Some(end) = range.end {
		builder.push(" AND occurred_at < ");
		builder.push_bind(end);
	}
}
