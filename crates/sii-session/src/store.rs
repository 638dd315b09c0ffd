//! Two-key session storage over Redis.

use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::{debug, warn};

use crate::config::SessionTtl;
use crate::keys;
use crate::types::{Identity, SessionRecord};

/// CRUD and TTL operations over the two keys kept per identity.
///
/// Every operation degrades on Redis failure: reads report a miss, writes
/// report `false`, with a `warn!` carrying the underlying error. Callers see
/// a cold cache, never an exception — a corrupt or unreachable cache entry
/// is operationally the same as not having one.
#[derive(Clone)]
pub struct SessionStore {
    con: ConnectionManager,
    ttl: SessionTtl,
}

impl SessionStore {
    /// Create a store over a shared connection.
    pub fn new(con: ConnectionManager, ttl: SessionTtl) -> Self {
        Self { con, ttl }
    }

    /// The TTL policy in use.
    pub fn ttl_config(&self) -> &SessionTtl {
        &self.ttl
    }

    /// Write the primary record with `ttl` and the shadow close record with
    /// `ttl + grace`, in that order. Returns `true` only if both writes
    /// succeeded.
    ///
    /// A failure after the first write leaves a primary without a shadow
    /// for one round trip; the expiration listener then has nothing to
    /// terminate with. Accepted narrow race, not worth a transaction.
    pub async fn save(
        &self,
        identity: &Identity,
        token: &str,
        csessionid: &str,
        ttl_secs: Option<u64>,
    ) -> bool {
        let record = SessionRecord::new(identity, token, csessionid);
        let payload = match serde_json::to_string(&record) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(identity = %identity, error = %e, "could not serialize session record");
                return false;
            }
        };

        let session_secs = self.ttl.session_secs(ttl_secs);
        let close_secs = self.ttl.close_secs(session_secs);
        let mut con = self.con.clone();

        let primary: redis::RedisResult<()> = con
            .set_ex(keys::session_key(identity), &payload, session_secs)
            .await;
        if let Err(e) = primary {
            warn!(identity = %identity, error = %e, "failed to write session record");
            return false;
        }

        let shadow: redis::RedisResult<()> = con
            .set_ex(keys::close_key(identity), &payload, close_secs)
            .await;
        match shadow {
            Ok(()) => {
                debug!(identity = %identity, ttl = session_secs, "session saved");
                true
            }
            Err(e) => {
                warn!(
                    identity = %identity,
                    error = %e,
                    "session record written but close record failed; expiry close will be skipped"
                );
                false
            }
        }
    }

    /// Read the primary record. Absent, expired, or malformed all report
    /// `None`.
    pub async fn get(&self, identity: &Identity) -> Option<SessionRecord> {
        self.read_record(&keys::session_key(identity)).await
    }

    /// Resolve the credentials needed to close a session remotely.
    ///
    /// Prefers the primary record (freshest data), falling back to the
    /// shadow close record when the primary is already gone.
    pub async fn close_data(&self, identity: &Identity) -> Option<SessionRecord> {
        if let Some(record) = self.get(identity).await {
            return Some(record);
        }
        self.read_record(&keys::close_key(identity)).await
    }

    /// Delete both keys. Returns `true` if at least one existed.
    pub async fn delete(&self, identity: &Identity) -> bool {
        let mut con = self.con.clone();
        let removed: redis::RedisResult<i64> = con
            .del(vec![keys::session_key(identity), keys::close_key(identity)])
            .await;
        match removed {
            Ok(n) => {
                debug!(identity = %identity, removed = n, "session delete");
                n > 0
            }
            Err(e) => {
                warn!(identity = %identity, error = %e, "failed to delete session keys");
                false
            }
        }
    }

    /// Remaining seconds on the primary key.
    ///
    /// `None` means the key does not exist. A key that exists without an
    /// expiry (which normal operation never produces) reports `Some(0)`
    /// rather than leaking Redis's `-1` sentinel.
    pub async fn ttl(&self, identity: &Identity) -> Option<i64> {
        let mut con = self.con.clone();
        let ttl: redis::RedisResult<i64> = con.ttl(keys::session_key(identity)).await;
        match ttl {
            Ok(-2) => None,
            Ok(t) if t < 0 => Some(0),
            Ok(t) => Some(t),
            Err(e) => {
                warn!(identity = %identity, error = %e, "failed to read session TTL");
                None
            }
        }
    }

    /// Extend the primary key's TTL without touching its value. Returns
    /// `false` if the key no longer exists — renewal never resurrects a
    /// deleted or expired session.
    ///
    /// A successful renewal also re-extends the shadow close record, keeping
    /// its TTL ahead of the primary's.
    pub async fn renew(&self, identity: &Identity, ttl_secs: Option<u64>) -> bool {
        let session_secs = self.ttl.session_secs(ttl_secs);
        let mut con = self.con.clone();

        let renewed: redis::RedisResult<bool> = con
            .expire(keys::session_key(identity), session_secs as i64)
            .await;
        match renewed {
            Ok(true) => {
                let close_secs = self.ttl.close_secs(session_secs);
                let shadow: redis::RedisResult<bool> = con
                    .expire(keys::close_key(identity), close_secs as i64)
                    .await;
                if !matches!(shadow, Ok(true)) {
                    warn!(identity = %identity, "close record missing during renewal");
                }
                debug!(identity = %identity, ttl = session_secs, "session renewed");
                true
            }
            Ok(false) => {
                debug!(identity = %identity, "no session to renew");
                false
            }
            Err(e) => {
                warn!(identity = %identity, error = %e, "failed to renew session");
                false
            }
        }
    }

    /// Delete only the shadow close record. Used by the expiration listener
    /// once a natural expiry has been handled.
    pub async fn remove_close_record(&self, identity: &Identity) -> bool {
        let mut con = self.con.clone();
        let removed: redis::RedisResult<i64> = con.del(keys::close_key(identity)).await;
        match removed {
            Ok(n) => n > 0,
            Err(e) => {
                warn!(identity = %identity, error = %e, "failed to delete close record");
                false
            }
        }
    }

    async fn read_record(&self, key: &str) -> Option<SessionRecord> {
        let mut con = self.con.clone();
        let raw: redis::RedisResult<Option<String>> = con.get(key).await;
        let raw = match raw {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key, error = %e, "failed to read session key");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                // Corrupt entry; equivalent to a miss.
                warn!(key, error = %e, "malformed session payload");
                None
            }
        }
    }
}
