use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

const MAX_ITEMS_PER_FEED: usize = 20;
const MAX_ITEM_AGE_DAYS: i64 = 30;

#[derive(Debug, Clone)]
pub struct RawFeedItem {
    pub url: String,
    pub title: String,
    pub body: String,
    pub published_at: DateTime<Utc>,
}

pub struct FeedFetcher {
    client: reqwest::Client,
}

impl FeedFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("failed to build feed HTTP client");
        Self { client }
    }

    /// Fetch and parse an RSS/Atom feed, newest-first, capped at
    /// `MAX_ITEMS_PER_FEED` and `MAX_ITEM_AGE_DAYS` (§4.C12, scoped as an
    /// external collaborator beyond its retry/rate-limit contract).
    pub async fn fetch(&self, feed_url: &str) -> Result<Vec<RawFeedItem>> {
        let resp = self
            .client
            .get(feed_url)
            .header("User-Agent", "narrative-core/0.1")
            .send()
            .await
            .context("feed fetch failed")?;

        let bytes = resp.bytes().await.context("failed to read feed body")?;
        let feed = feed_rs::parser::parse(&bytes[..]).context("failed to parse feed")?;

        let cutoff = Utc::now() - chrono::Duration::days(MAX_ITEM_AGE_DAYS);

        let mut items: Vec<RawFeedItem> = feed
            .entries
            .into_iter()
            .filter_map(|entry| {
                let url = entry.links.first().map(|l| l.href.clone())?;
                let published_at = entry.published.or(entry.updated).map(|dt| dt.with_timezone(&Utc))?;
                if published_at < cutoff {
                    return None;
                }
                let title = entry.title.map(|t| t.content).unwrap_or_default();
                let body = entry
                    .summary
                    .map(|s| s.content)
                    .or_else(|| entry.content.and_then(|c| c.body))
                    .unwrap_or_default();

                Some(RawFeedItem { url, title, body, published_at })
            })
            .collect();

        items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        items.truncate(MAX_ITEMS_PER_FEED);

        Ok(items)
    }
}

impl Default for FeedFetcher {
    fn default() -> Self {
        Self::new()
    }
}
