use thiserror::Error;

#[derive(Error, Debug)]
pub enum QapError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Parsing Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid Configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Evaluation failed for individual #{index}: {reason}")]
    EvaluationFailure { index: usize, reason: String },

    #[error("Gave up after {attempts} attempts with {accepted}/{target} accepted solutions")]
    ExhaustedAttempts {
        attempts: usize,
        accepted: usize,
        target: usize,
    },

    #[error("Search cancelled")]
    Cancelled,
}

pub type QapResult<T> = Result<T, QapError>;

/// Shorthand used by every `validate()` in the crate.
pub(crate) fn invalid<T>(msg: impl Into<String>) -> QapResult<T> {
    Err(QapError::InvalidConfiguration(msg.into()))
}
