pub mod feed;
pub mod pipeline;
pub mod rate_limiter;

pub use feed::{FeedFetcher, RawFeedItem};
pub use pipeline::{IngestPipeline, IngestSummary};
pub use rate_limiter::RateLimiter;
