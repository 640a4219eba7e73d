use inkpress_core::error::InkpressError;
use reqwest::StatusCode;

/// High-level error type covering every failure mode the client can hit.
#[derive(Debug, thiserror::Error)]
pub enum OpenAiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("couldn’t serialise body: {0}")]
    Serde(#[from] serde_json::Error),

    /// Non-success status; `message` comes from the provider profile's
    /// error formatter.
    #[error("{message}")]
    Api { status: StatusCode, message: String },

    #[error("API key contains characters not allowed in an HTTP header")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("no response body available")]
    MissingBody,
}

impl From<OpenAiError> for InkpressError {
    fn from(value: OpenAiError) -> Self {
        match value {
            OpenAiError::Api { status, message } => InkpressError::Provider {
                status: status.as_u16(),
                message,
            },
            OpenAiError::Serde(err) => InkpressError::Serialization(err),
            other => InkpressError::Backend(Box::new(other)),
        }
    }
}
