use chrono::{DateTime, Utc};
use narrative_common::types::Article;
use sqlx::PgPool;

#[derive(Clone)]
pub struct ArticleStore {
    pool: PgPool,
}

impl ArticleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Idempotent upsert keyed on the unique `url` index (§6 persistence
    /// layout). Ingesting the same URL twice updates the row in place
    /// rather than producing a duplicate article.
    pub async fn upsert(&self, article: &Article) -> anyhow::Result<()> {
        let data = serde_json::to_value(article)?;
        sqlx::query(
            r#"
            INSERT INTO articles (id, url, published_at, narrative_id, relevance_tier, data, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (url) DO UPDATE SET
                narrative_id = EXCLUDED.narrative_id,
                relevance_tier = EXCLUDED.relevance_tier,
                data = EXCLUDED.data
            "#,
        )
        .bind(&article.id)
        .bind(&article.url)
        .bind(article.published_at)
        .bind(&article.narrative_id)
        .bind(article.relevance_tier as i16)
        .bind(&data)
        .bind(article.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> anyhow::Result<Option<Article>> {
        let row: Option<(sqlx::types::Json<Article>,)> =
            sqlx::query_as("SELECT data FROM articles WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(data,)| data.0))
    }

    pub async fn get_by_url(&self, url: &str) -> anyhow::Result<Option<Article>> {
        let row: Option<(sqlx::types::Json<Article>,)> =
            sqlx::query_as("SELECT data FROM articles WHERE url = $1")
                .bind(url)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(data,)| data.0))
    }

    /// §3 "Invariant: every Article.narrative_id references an existing
    /// Narrative whose article_ids contains the article." The lifecycle
    /// engine calls this after appending the article id to the narrative,
    /// never before — so an article is briefly un-joined but never
    /// dangling.
    pub async fn set_narrative_id(&self, article_id: &str, narrative_id: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE articles
            SET narrative_id = $2,
                data = jsonb_set(data, '{narrative_id}', to_jsonb($2::text))
            WHERE id = $1
            "#,
        )
        .bind(article_id)
        .bind(narrative_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_recent(&self, limit: i64) -> anyhow::Result<Vec<Article>> {
        let rows: Vec<(sqlx::types::Json<Article>,)> = sqlx::query_as(
            "SELECT data FROM articles ORDER BY published_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(data,)| data.0).collect())
    }

    /// Articles without a narrative yet, oldest first — feeds the matcher
    /// and the fingerprint/narrative-focus backfill scripts.
    pub async fn list_unmatched(&self, limit: i64) -> anyhow::Result<Vec<Article>> {
        let rows: Vec<(sqlx::types::Json<Article>,)> = sqlx::query_as(
            "SELECT data FROM articles WHERE narrative_id IS NULL ORDER BY published_at ASC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(data,)| data.0).collect())
    }

    /// Paginated articles for a narrative (`/narratives/{id}/articles`),
    /// newest first.
    pub async fn list_by_narrative(&self, narrative_id: &str, offset: i64, limit: i64) -> anyhow::Result<Vec<Article>> {
        let rows: Vec<(sqlx::types::Json<Article>,)> = sqlx::query_as(
            "SELECT data FROM articles WHERE narrative_id = $1 ORDER BY published_at DESC OFFSET $2 LIMIT $3",
        )
        .bind(narrative_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(data,)| data.0).collect())
    }

    pub async fn list_since(&self, since: DateTime<Utc>, limit: i64) -> anyhow::Result<Vec<Article>> {
        let rows: Vec<(sqlx::types::Json<Article>,)> = sqlx::query_as(
            "SELECT data FROM articles WHERE published_at >= $1 ORDER BY published_at ASC LIMIT $2",
        )
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(data,)| data.0).collect())
    }
}
