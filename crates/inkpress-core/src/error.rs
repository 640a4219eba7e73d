//! Unified error type exposed by **`inkpress-core`**.
//!
//! Backend crates convert their internal errors into one of these variants
//! before handing them to the [`AssistantClient`](crate::AssistantClient) or
//! to a [`StreamSink`](crate::sink::StreamSink).  Every variant renders a
//! human-readable message, because the editor shows `to_string()` verbatim.

use thiserror::Error;

/// Convenient alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, InkpressError>;

#[derive(Debug, Error)]
pub enum InkpressError {
    /// The provider answered with a non-success HTTP status.  `message` has
    /// already been rendered by the provider's error formatter.
    #[error("{message}")]
    Provider { status: u16, message: String },

    /// Failure while serialising or deserialising JSON payloads sent to / received
    /// from the provider, or while reading a persisted configuration file.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic forwarding of any backend-specific error that doesn’t fit another
    /// category.
    #[error("backend returned an error: {0}")]
    Backend(Box<dyn std::error::Error + Send + Sync + 'static>),

    /// Input rejected before any request is sent, such as out-of-range
    /// settings or an empty message list.
    #[error("invalid input: {0}")]
    Invalid(String),

    /// Settings or the configuration store are incomplete or inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// The request was cancelled through its [`CancelHandle`](crate::cancel::CancelHandle).
    #[error("request was cancelled")]
    Cancelled,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl InkpressError {
    /// HTTP status attached to the error, if the provider answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            InkpressError::Provider { status, .. } => Some(*status),
            _ => None,
        }
    }
}
