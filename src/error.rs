use reqwest::StatusCode;
use thiserror::Error;

/// Why a single attempt was rejected. None of these escape `analyze`;
/// they only move the attempt loop on to the next strategy.
#[derive(Error, Debug)]
pub enum AttemptError {
    #[error("transport failure: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("could not build request: {0}")]
    Encoding(#[source] reqwest::Error),

    #[error("HTTP error ({status}): {body}")]
    HttpStatus { status: StatusCode, body: String },

    #[error("invalid JSON response: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("unrecognized response shape")]
    UnrecognizedShape,
}

impl AttemptError {
    /// Short tag used in attempt records and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AttemptError::Transport(_) => "transport",
            AttemptError::Encoding(_) => "encoding",
            AttemptError::HttpStatus { .. } => "http_status",
            AttemptError::InvalidJson(_) => "invalid_json",
            AttemptError::UnrecognizedShape => "unrecognized_shape",
        }
    }
}
