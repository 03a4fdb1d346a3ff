pub mod config;
pub mod error;
pub mod types;
pub mod util;

pub use config::Config;
pub use error::{MatcherError, MatcherResult, NarrativeError, NarrativeResult};
