use chrono::Utc;
use sqlx::PgPool;

#[derive(Clone)]
pub struct LlmCacheStore {
    pool: PgPool,
}

impl LlmCacheStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Content-addressed cache keyed on `(model, prompt_hash, temperature,
    /// max_tokens)` (§4.C3); the caller hashes the key, we just store the
    /// raw response text. TTL 24h.
    pub async fn get(&self, cache_key: &str) -> anyhow::Result<Option<String>> {
        let row: Option<(String, chrono::DateTime<Utc>)> =
            sqlx::query_as("SELECT response, expires_at FROM llm_cache WHERE cache_key = $1")
                .bind(cache_key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.and_then(|(response, expires_at)| {
            if expires_at > Utc::now() {
                Some(response)
            } else {
                None
            }
        }))
    }

    pub async fn put(&self, cache_key: &str, model: &str, response: &str) -> anyhow::Result<()> {
        let expires_at = Utc::now() + chrono::Duration::hours(24);

        sqlx::query(
            r#"
            INSERT INTO llm_cache (cache_key, response, model, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (cache_key) DO UPDATE SET
                response = EXCLUDED.response,
                model = EXCLUDED.model,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(cache_key)
        .bind(response)
        .bind(model)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn clear_expired(&self) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM llm_cache WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
