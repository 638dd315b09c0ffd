//! Error types for the portal client.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, PortalError>;

/// Errors constructing the portal client.
///
/// Termination itself reports plain success/failure per the
/// [`sii_session::SessionTerminator`] contract; only setup problems are
/// errors.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for PortalError {
    fn from(e: reqwest::Error) -> Self {
        PortalError::Client(e.to_string())
    }
}
