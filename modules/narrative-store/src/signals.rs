use chrono::{DateTime, Utc};
use narrative_common::types::Signal;
use sqlx::PgPool;

#[derive(Clone)]
pub struct SignalsCacheStore {
    pool: PgPool,
}

impl SignalsCacheStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Shared-cache layer (120s, §4.C9), keyed by the caller-supplied
    /// cache key (`limit|min_score|entity_type|timeframe`). Fails open:
    /// callers treat any error here as a cache miss and recompute.
    pub async fn get(&self, cache_key: &str) -> anyhow::Result<Option<(Vec<Signal>, DateTime<Utc>)>> {
        let row: Option<(sqlx::types::Json<Vec<Signal>>, DateTime<Utc>, DateTime<Utc>)> = sqlx::query_as(
            "SELECT data, computed_at, expires_at FROM signals_cache WHERE cache_key = $1",
        )
        .bind(cache_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(|(data, computed_at, expires_at)| {
            if expires_at > Utc::now() {
                Some((data.0, computed_at))
            } else {
                None
            }
        }))
    }

    pub async fn put(
        &self,
        cache_key: &str,
        signals: &[Signal],
        ttl_seconds: i64,
    ) -> anyhow::Result<()> {
        let data = serde_json::to_value(signals)?;
        let now = Utc::now();
        let expires_at = now + chrono::Duration::seconds(ttl_seconds);

        sqlx::query(
            r#"
            INSERT INTO signals_cache (cache_key, data, computed_at, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (cache_key) DO UPDATE SET
                data = EXCLUDED.data,
                computed_at = EXCLUDED.computed_at,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(cache_key)
        .bind(&data)
        .bind(now)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn clear_expired(&self) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM signals_cache WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn stats(&self) -> anyhow::Result<(i64, i64)> {
        let row: (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE expires_at <= now()) FROM signals_cache",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}
