use chrono::{DateTime, Utc};
use narrative_common::types::CostRecord;
use sqlx::PgPool;

#[derive(Clone)]
pub struct CostRecordStore {
    pool: PgPool,
}

impl CostRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append-only (§3): every successful LLM call, cached or not,
    /// appends here. Never updated or deleted.
    pub async fn append(&self, record: &CostRecord) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cost_records (model, operation, input_tokens, output_tokens, cached, computed_cost, "timestamp")
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&record.model)
        .bind(&record.operation)
        .bind(record.input_tokens as i32)
        .bind(record.output_tokens as i32)
        .bind(record.cached)
        .bind(record.computed_cost)
        .bind(record.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn total_since(&self, since: DateTime<Utc>) -> anyhow::Result<f64> {
        let row: (Option<f64>,) = sqlx::query_as(
            r#"SELECT SUM(computed_cost) FROM cost_records WHERE "timestamp" >= $1"#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0.unwrap_or(0.0))
    }

    pub async fn daily_breakdown(&self, days: i64) -> anyhow::Result<Vec<(chrono::NaiveDate, f64)>> {
        let rows: Vec<(chrono::NaiveDate, f64)> = sqlx::query_as(
            r#"
            SELECT "timestamp"::date AS day, SUM(computed_cost)
            FROM cost_records
            WHERE "timestamp" >= now() - ($1 * interval '1 day')
            GROUP BY day
            ORDER BY day ASC
            "#,
        )
        .bind(days as f64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn by_model(&self, days: i64) -> anyhow::Result<Vec<(String, f64, i64)>> {
        let rows: Vec<(String, f64, i64)> = sqlx::query_as(
            r#"
            SELECT model, SUM(computed_cost), COUNT(*)
            FROM cost_records
            WHERE "timestamp" >= now() - ($1 * interval '1 day')
            GROUP BY model
            ORDER BY SUM(computed_cost) DESC
            "#,
        )
        .bind(days as f64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
