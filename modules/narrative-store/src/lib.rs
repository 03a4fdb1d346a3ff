pub mod articles;
pub mod briefings;
pub mod cost;
pub mod entity_mentions;
pub mod llm_cache;
pub mod narratives;
pub mod pool;
pub mod signals;

pub use pool::connect_and_migrate;

use sqlx::PgPool;

/// The document store is the single source of truth (§5): no in-memory
/// authoritative state. `Store` is a thin handle grouping the
/// per-collection wrappers over one connection pool.
#[derive(Clone)]
pub struct Store {
    pub articles: articles::ArticleStore,
    pub narratives: narratives::NarrativeStore,
    pub entity_mentions: entity_mentions::EntityMentionStore,
    pub signals_cache: signals::SignalsCacheStore,
    pub briefings: briefings::BriefingStore,
    pub cost_records: cost::CostRecordStore,
    pub llm_cache: llm_cache::LlmCacheStore,
}

impl Store {
    pub fn new(pool: PgPool) -> Self {
        Self {
            articles: articles::ArticleStore::new(pool.clone()),
            narratives: narratives::NarrativeStore::new(pool.clone()),
            entity_mentions: entity_mentions::EntityMentionStore::new(pool.clone()),
            signals_cache: signals::SignalsCacheStore::new(pool.clone()),
            briefings: briefings::BriefingStore::new(pool.clone()),
            cost_records: cost::CostRecordStore::new(pool.clone()),
            llm_cache: llm_cache::LlmCacheStore::new(pool),
        }
    }

    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = connect_and_migrate(database_url).await?;
        Ok(Self::new(pool))
    }
}
