//! Error types for session cache operations.

use std::time::Duration;

/// Error type for session cache operations.
///
/// Store reads and writes degrade to their absent/false sentinel instead of
/// returning errors; this enum only covers input validation and component
/// lifecycle misuse.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Identity failed shape validation.
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    /// Could not establish the Redis connection.
    #[error("Redis connection failed: {0}")]
    Connect(String),

    /// Establishing the Redis connection took too long.
    #[error("Redis connection timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// The handle was closed; reconnect before using it.
    #[error("Redis handle is closed")]
    Closed,

    /// `start()` was called on a listener that is already running.
    #[error("Expiration listener is already running")]
    ListenerRunning,

    /// `stop()` was called on a listener that was never started.
    #[error("Expiration listener is not running")]
    ListenerNotRunning,
}

/// Result type for session cache operations.
pub type Result<T> = std::result::Result<T, Error>;
