//! Error types for content API access

/// Errors raised while talking to the content repository
#[derive(Debug, thiserror::Error)]
pub enum PrismicError {
    /// Transport-level failure (DNS, TLS, connection reset, ...)
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("content api returned {status}: {body}")]
    Status { status: u16, body: String },

    /// An endpoint or cursor URL could not be parsed
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// The response or a document field had an unexpected shape
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The API root listed no master ref
    #[error("repository has no master ref")]
    NoMasterRef,

    /// A pagination cursor pointed somewhere other than the configured repository
    #[error("cursor is not on the content api origin: {0}")]
    ForeignCursor(String),
}

pub type Result<T> = std::result::Result<T, PrismicError>;
