use chrono::{DateTime, Utc};
use narrative_common::types::Narrative;
use sqlx::PgPool;

#[derive(Clone)]
pub struct NarrativeStore {
    pool: PgPool,
}

impl NarrativeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create op (§4.C8). Narrative ids are generated by the caller (uuid),
    /// so a conflict here means a caller bug, not a legitimate race — we
    /// still guard it rather than panic.
    pub async fn insert(&self, narrative: &Narrative) -> anyhow::Result<()> {
        let data = serde_json::to_value(narrative)?;
        sqlx::query(
            r#"
            INSERT INTO narratives (id, nucleus_entity, lifecycle_state, last_updated, dormant_since, archived, data)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&narrative.id)
        .bind(&narrative.nucleus_entity)
        .bind(narrative.lifecycle_state.as_str())
        .bind(narrative.last_updated)
        .bind(narrative.dormant_since)
        .bind(narrative.archived)
        .bind(&data)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Conditional update keyed on `id`, gated on the caller's view of
    /// `last_updated` (§9 "read-modify-write with retry on version
    /// mismatch"). Returns `false` on conflict — the caller re-runs the
    /// matcher against fresh state and retries, never overwriting a
    /// concurrent write blindly.
    pub async fn try_update(
        &self,
        narrative: &Narrative,
        expected_last_updated: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let data = serde_json::to_value(narrative)?;
        let result = sqlx::query(
            r#"
            UPDATE narratives SET
                nucleus_entity = $2,
                lifecycle_state = $3,
                last_updated = $4,
                dormant_since = $5,
                archived = $6,
                data = $7
            WHERE id = $1 AND last_updated = $8
            "#,
        )
        .bind(&narrative.id)
        .bind(&narrative.nucleus_entity)
        .bind(narrative.lifecycle_state.as_str())
        .bind(narrative.last_updated)
        .bind(narrative.dormant_since)
        .bind(narrative.archived)
        .bind(&data)
        .bind(expected_last_updated)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn get_by_id(&self, id: &str) -> anyhow::Result<Option<Narrative>> {
        let row: Option<(sqlx::types::Json<Narrative>,)> =
            sqlx::query_as("SELECT data FROM narratives WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(data,)| data.0))
    }

    /// Matcher candidate pool per §4.C7 step 1: same nucleus, updated
    /// within the last 90 days, not archived.
    pub async fn candidates_by_nucleus(
        &self,
        nucleus_entity: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Narrative>> {
        let rows: Vec<(sqlx::types::Json<Narrative>,)> = sqlx::query_as(
            r#"
            SELECT data FROM narratives
            WHERE nucleus_entity = $1 AND last_updated >= $2 AND NOT archived
            "#,
        )
        .bind(nucleus_entity)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(data,)| data.0).collect())
    }

    /// Active narratives ordered by `velocity·article_count` desc for the
    /// `/narratives/active` endpoint and the briefing generator's input
    /// gathering.
    pub async fn list_active(&self, limit: i64) -> anyhow::Result<Vec<Narrative>> {
        let rows: Vec<(sqlx::types::Json<Narrative>,)> = sqlx::query_as(
            r#"
            SELECT data FROM narratives
            WHERE NOT archived AND lifecycle_state != 'dormant'
            ORDER BY (data->>'velocity')::float8 * (data->>'article_count')::float8 DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(data,)| data.0).collect())
    }

    pub async fn list_archived(&self, limit: i64) -> anyhow::Result<Vec<Narrative>> {
        let rows: Vec<(sqlx::types::Json<Narrative>,)> = sqlx::query_as(
            "SELECT data FROM narratives WHERE lifecycle_state = 'dormant' ORDER BY dormant_since DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(data,)| data.0).collect())
    }

    pub async fn list_reactivated(&self, limit: i64) -> anyhow::Result<Vec<Narrative>> {
        let rows: Vec<(sqlx::types::Json<Narrative>,)> = sqlx::query_as(
            "SELECT data FROM narratives WHERE lifecycle_state = 'reactivated' ORDER BY last_updated DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(data,)| data.0).collect())
    }

    /// All non-archived narratives grouped implicitly by nucleus, for the
    /// consolidation pass (§4.C8): callers group client-side since the
    /// pass needs full Narrative values, not aggregates.
    pub async fn list_all_active_for_consolidation(&self) -> anyhow::Result<Vec<Narrative>> {
        let rows: Vec<(sqlx::types::Json<Narrative>,)> =
            sqlx::query_as("SELECT data FROM narratives WHERE NOT archived AND lifecycle_state != 'dormant'")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(data,)| data.0).collect())
    }

    /// Narratives lacking a fingerprint hash, for the one-shot backfill.
    pub async fn list_missing_fingerprint_hash(&self) -> anyhow::Result<Vec<Narrative>> {
        let rows: Vec<(sqlx::types::Json<Narrative>,)> = sqlx::query_as(
            "SELECT data FROM narratives WHERE data->'fingerprint'->>'hash' IS NULL OR data->'fingerprint'->>'hash' = ''",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(data,)| data.0).collect())
    }

    /// Narratives lacking a focus string, for the one-shot backfill.
    pub async fn list_missing_narrative_focus(&self) -> anyhow::Result<Vec<Narrative>> {
        let rows: Vec<(sqlx::types::Json<Narrative>,)> = sqlx::query_as(
            "SELECT data FROM narratives WHERE data->>'narrative_focus' IS NULL OR data->>'narrative_focus' = ''",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(data,)| data.0).collect())
    }

    /// Narrative linkage for the signal detector (§4.C9): narratives whose
    /// `entities` contains the given entity and whose lifecycle state is
    /// one of the "live" states.
    pub async fn narratives_mentioning(&self, entity: &str) -> anyhow::Result<Vec<Narrative>> {
        let rows: Vec<(sqlx::types::Json<Narrative>,)> = sqlx::query_as(
            r#"
            SELECT data FROM narratives
            WHERE NOT archived
              AND lifecycle_state IN ('emerging', 'rising', 'hot', 'reactivated')
              AND data->'entities' @> to_jsonb($1::text)
            "#,
        )
        .bind(entity)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(data,)| data.0).collect())
    }

    pub async fn count_active(&self) -> anyhow::Result<i64> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM narratives WHERE NOT archived AND lifecycle_state != 'dormant'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }
}
