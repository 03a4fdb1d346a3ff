use chrono::{DateTime, Utc};
use sqlx::PgPool;

#[derive(Clone)]
pub struct EntityMentionStore {
    pool: PgPool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MentionRow {
    pub entity: String,
    pub entity_type: String,
    pub article_id: String,
    pub sentiment: String,
    pub source: String,
    pub timestamp: DateTime<Utc>,
}

impl EntityMentionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(
        &self,
        entity: &str,
        entity_type: &str,
        article_id: &str,
        sentiment: &str,
        source: &str,
        timestamp: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO entity_mentions (entity, entity_type, article_id, sentiment, source, "timestamp")
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entity)
        .bind(entity_type)
        .bind(article_id)
        .bind(sentiment)
        .bind(source)
        .bind(timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Per-entity indexed query over the `(entity, timestamp)` compound
    /// index (§6). The signal detector calls this once per entity with
    /// bounded concurrency rather than issuing one `$in`-style scan over
    /// every tracked entity — the documented performance invariant in
    /// §4.C9 (parallel indexed queries ~6s cold vs 18-33s for a batch
    /// scan).
    pub async fn mentions_since(
        &self,
        entity: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<MentionRow>> {
        let rows = sqlx::query_as::<_, MentionRow>(
            r#"
            SELECT entity, entity_type, article_id, sentiment, source, "timestamp"
            FROM entity_mentions
            WHERE entity = $1 AND "timestamp" >= $2
            ORDER BY "timestamp" ASC
            "#,
        )
        .bind(entity)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Distinct entities with any mention since `since`, the candidate
    /// set the signal detector fans out over.
    pub async fn distinct_entities_since(&self, since: DateTime<Utc>) -> anyhow::Result<Vec<(String, String)>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"SELECT DISTINCT entity, entity_type FROM entity_mentions WHERE "timestamp" >= $1"#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
