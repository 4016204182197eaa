//! Error types for Cadence

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Not enough complete weeks or training pairs. The predictor recovers
    /// from this locally by falling back to the baseline.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Missing feature keys, non-finite values, unknown risk-level tokens
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Conservation check failure (only raised when explicitly enabled)
    #[error("Internal consistency failure: {0}")]
    InternalConsistency(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// The `status.state` value this error is reported as
    pub fn status_state(&self) -> &'static str {
        match self {
            Error::InsufficientData(_) => "insufficient_data",
            _ => "error",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
