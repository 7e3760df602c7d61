//! Leaf errors with stable messages.
//!
//! Everything else is propagated as `anyhow::Error` with context attached.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiqError {
    /// Neither credential variable holds a value.
    #[error("GEMINI_API_KEY or GOOGLE_API_KEY environment variable not set")]
    MissingCredential,

    #[error("unsupported provider '{0}'")]
    UnsupportedProvider(String),

    /// The API answered with a non-success status.
    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },
}
