use thiserror::Error;

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("LLM call failed: {0}")]
    Llm(String),

    #[error("all configured models failed: {0}")]
    ModelExhausted(String),

    #[error("narrative {0} not found")]
    NarrativeNotFound(String),

    #[error("article {0} not found")]
    ArticleNotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type NarrativeResult<T> = Result<T, NarrativeError>;

impl From<MatcherError> for NarrativeError {
    fn from(e: MatcherError) -> Self {
        match e {
            MatcherError::Persistence(msg) => NarrativeError::Persistence(msg),
        }
    }
}

/// Errors specific to the matcher's public contract (§4.C7): the matcher
/// must tolerate extraction gaps and only fail on persistence I/O.
#[derive(Debug, Error)]
pub enum MatcherError {
    #[error("persistence error while matching: {0}")]
    Persistence(String),
}

impl From<sqlx::Error> for MatcherError {
    fn from(e: sqlx::Error) -> Self {
        MatcherError::Persistence(e.to_string())
    }
}

impl From<anyhow::Error> for MatcherError {
    fn from(e: anyhow::Error) -> Self {
        MatcherError::Persistence(e.to_string())
    }
}

impl From<sqlx::Error> for NarrativeError {
    fn from(e: sqlx::Error) -> Self {
        NarrativeError::Persistence(e.to_string())
    }
}

pub type MatcherResult<T> = Result<T, MatcherError>;
