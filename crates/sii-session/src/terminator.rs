//! Contract for closing a session on the remote portal.

use async_trait::async_trait;
use tracing::debug;

use crate::types::SessionRecord;

/// Collaborator that ends a session on the SII side.
///
/// Implementations must treat duplicate terminations of the same session as
/// benign: an explicit close racing a not-yet-delivered expiration event can
/// legitimately call this twice with identical credentials.
///
/// The return value is best-effort. `false` should mean the portal could not
/// be reached at all; a response of any kind usually means the remote side
/// processed (or no longer needs) the close. How strictly HTTP statuses are
/// judged is an implementation concern.
#[async_trait]
pub trait SessionTerminator: Send + Sync {
    /// Close the session described by `record`. Must not panic.
    async fn terminate(&self, record: &SessionRecord) -> bool;
}

/// Terminator that skips the remote call entirely.
///
/// Useful for wiring the cache without portal access; expired sessions are
/// then only dropped locally.
#[derive(Debug, Clone, Default)]
pub struct NoopTerminator;

#[async_trait]
impl SessionTerminator for NoopTerminator {
    async fn terminate(&self, record: &SessionRecord) -> bool {
        debug!(rut = %record.rut, dv = %record.dv, "skipping remote session close");
        true
    }
}
