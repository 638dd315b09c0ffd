//! Public surface composing the store with explicit remote closes.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::store::SessionStore;
use crate::terminator::SessionTerminator;
use crate::types::{Identity, SessionRecord};

/// The surface authentication and request handling go through.
///
/// Reads, writes, and renewals delegate straight to the [`SessionStore`];
/// [`SessionCache::close_session`] additionally drives the remote close for
/// caller-initiated logouts, with the same best-effort policy as the
/// expiration listener.
#[derive(Clone)]
pub struct SessionCache {
    store: SessionStore,
    terminator: Arc<dyn SessionTerminator>,
}

impl SessionCache {
    /// Create a facade over a store and a terminator.
    pub fn new(store: SessionStore, terminator: Arc<dyn SessionTerminator>) -> Self {
        Self { store, terminator }
    }

    /// The underlying store.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Read the cached session, if any.
    pub async fn get(&self, identity: &Identity) -> Option<SessionRecord> {
        self.store.get(identity).await
    }

    /// Cache a freshly authenticated session.
    pub async fn save(
        &self,
        identity: &Identity,
        token: &str,
        csessionid: &str,
        ttl_secs: Option<u64>,
    ) -> bool {
        self.store.save(identity, token, csessionid, ttl_secs).await
    }

    /// Remaining lifetime of the cached session in seconds.
    pub async fn ttl(&self, identity: &Identity) -> Option<i64> {
        self.store.ttl(identity).await
    }

    /// Extend the cached session's lifetime.
    pub async fn renew(&self, identity: &Identity, ttl_secs: Option<u64>) -> bool {
        self.store.renew(identity, ttl_secs).await
    }

    /// Credentials usable to close the session remotely, if any survive.
    pub async fn close_data(&self, identity: &Identity) -> Option<SessionRecord> {
        self.store.close_data(identity).await
    }

    /// Close a session explicitly.
    ///
    /// With `terminate_remote`, the portal close is attempted first: if no
    /// close data survives there is nothing to close and this returns
    /// `false` without deleting anything; if the remote call fails the
    /// local cleanup proceeds anyway. Without `terminate_remote` this is a
    /// plain delete of both keys.
    ///
    /// An explicit close can race a pending expiration event, in which case
    /// the terminator is invoked twice for the same session; the
    /// [`SessionTerminator`] contract makes that benign.
    pub async fn close_session(&self, identity: &Identity, terminate_remote: bool) -> bool {
        if terminate_remote {
            let Some(record) = self.store.close_data(identity).await else {
                debug!(identity = %identity, "no session to close");
                return false;
            };
            if !self.terminator.terminate(&record).await {
                warn!(identity = %identity, "remote close failed; deleting cached session anyway");
            }
        }
        self.store.delete(identity).await
    }
}
