use chrono::NaiveDate;
use narrative_common::types::Briefing;
use sqlx::PgPool;

#[derive(Clone)]
pub struct BriefingStore {
    pool: PgPool,
}

impl BriefingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// At-most-one-per-`(type, local_date)` guard (§4.C10, testable
    /// property #8) is enforced by a partial unique index on
    /// `(briefing_type, local_date) WHERE NOT is_smoke`. Smoke-test runs
    /// bypass the guard entirely since they're never published. When
    /// `force` is true we deliberately overwrite the existing slot rather
    /// than stack a second row for the same day. Returns `false` when a
    /// non-forced insert found an existing briefing for the period
    /// (caller logs and no-ops per spec).
    pub async fn try_insert(
        &self,
        briefing: &Briefing,
        local_date: NaiveDate,
        force: bool,
    ) -> anyhow::Result<bool> {
        let data = serde_json::to_value(briefing)?;

        if briefing.is_smoke {
            sqlx::query(
                r#"
                INSERT INTO briefings (id, briefing_type, local_date, published, is_smoke, generated_at, data)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(&briefing.id)
            .bind(briefing.briefing_type.as_str())
            .bind(local_date)
            .bind(briefing.published)
            .bind(briefing.is_smoke)
            .bind(briefing.generated_at)
            .bind(&data)
            .execute(&self.pool)
            .await?;

            return Ok(true);
        }

        if force {
            sqlx::query(
                r#"
                INSERT INTO briefings (id, briefing_type, local_date, published, is_smoke, generated_at, data)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (briefing_type, local_date) WHERE NOT is_smoke DO UPDATE SET
                    id = EXCLUDED.id,
                    published = EXCLUDED.published,
                    generated_at = EXCLUDED.generated_at,
                    data = EXCLUDED.data
                "#,
            )
            .bind(&briefing.id)
            .bind(briefing.briefing_type.as_str())
            .bind(local_date)
            .bind(briefing.published)
            .bind(briefing.is_smoke)
            .bind(briefing.generated_at)
            .bind(&data)
            .execute(&self.pool)
            .await?;

            return Ok(true);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO briefings (id, briefing_type, local_date, published, is_smoke, generated_at, data)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (briefing_type, local_date) WHERE NOT is_smoke DO NOTHING
            "#,
        )
        .bind(&briefing.id)
        .bind(briefing.briefing_type.as_str())
        .bind(local_date)
        .bind(briefing.published)
        .bind(briefing.is_smoke)
        .bind(briefing.generated_at)
        .bind(&data)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Latest published, non-smoke briefing of any type.
    pub async fn latest(&self) -> anyhow::Result<Option<Briefing>> {
        let row: Option<(sqlx::types::Json<Briefing>,)> = sqlx::query_as(
            r#"
            SELECT data FROM briefings
            WHERE published AND NOT is_smoke
            ORDER BY generated_at DESC LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(data,)| data.0))
    }

    pub async fn latest_by_type(&self, briefing_type: &str) -> anyhow::Result<Option<Briefing>> {
        let row: Option<(sqlx::types::Json<Briefing>,)> = sqlx::query_as(
            r#"
            SELECT data FROM briefings
            WHERE briefing_type = $1 AND published AND NOT is_smoke
            ORDER BY generated_at DESC LIMIT 1
            "#,
        )
        .bind(briefing_type)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(data,)| data.0))
    }

    pub async fn by_type_and_date(
        &self,
        briefing_type: &str,
        local_date: NaiveDate,
    ) -> anyhow::Result<Option<Briefing>> {
        let row: Option<(sqlx::types::Json<Briefing>,)> = sqlx::query_as(
            r#"
            SELECT data FROM briefings
            WHERE briefing_type = $1 AND local_date = $2 AND NOT is_smoke
            LIMIT 1
            "#,
        )
        .bind(briefing_type)
        .bind(local_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(data,)| data.0))
    }

    /// §9 "dynamic typing legacy": old rows predating 30 days are the
    /// ones the cleanup task targets.
    pub async fn delete_older_than(&self, days: i64) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM briefings WHERE generated_at < now() - ($1 * interval '1 day')")
            .bind(days as f64)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
