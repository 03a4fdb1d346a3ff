pub mod extract;
pub mod relevance;

pub use extract::{ArticleExtraction, Extractor};
pub use relevance::RelevanceClassifier;
