//! Error types for the axmlpack library.

use thiserror::Error;

/// Errors that can occur when generating a binary XML resource.
#[derive(Debug, Error)]
pub enum Error {
    /// Binary XML encoding error.
    #[error("{0}")]
    ResXml(#[from] axmlpack_resxml::Error),

    /// Invalid provider configuration.
    #[error("invalid WebView provider config: {0}")]
    InvalidConfig(String),
}

/// Result type for axmlpack operations.
pub type Result<T> = std::result::Result<T, Error>;
