//! Key naming for session records and its inverse.
//!
//! Key names are a pure function of the identity, so the expiration listener
//! can recover the identity from nothing but an expired key name.

use crate::types::Identity;

/// Prefix shared by every key this crate owns.
pub const SESSION_PREFIX: &str = "session:sii:";

/// Prefix of the shadow close-data keys.
pub const CLOSE_PREFIX: &str = "session:sii:close:";

/// Primary key for an identity: `session:sii:{rut}-{dv}`.
pub fn session_key(identity: &Identity) -> String {
    format!("{SESSION_PREFIX}{identity}")
}

/// Shadow close-data key for an identity: `session:sii:close:{rut}-{dv}`.
pub fn close_key(identity: &Identity) -> String {
    format!("{CLOSE_PREFIX}{identity}")
}

/// Pub/sub pattern for expired-key events on the given database index.
pub fn expired_event_pattern(db: u32) -> String {
    format!("__keyevent@{db}__:expired")
}

/// Whether an expired key name should trigger remote termination.
///
/// Only primary session keys qualify. Close keys expiring is routine
/// cleanup, not a signal that a session needs closing.
pub fn is_session_event_key(key: &str) -> bool {
    key.starts_with(SESSION_PREFIX) && !key.contains(":close:")
}

/// Parse the identity back out of a primary session key.
///
/// Returns `None` for close keys, foreign keys, and key names whose
/// remainder does not look like `{rut}-{dv}`.
pub fn parse_session_key(key: &str) -> Option<Identity> {
    if !is_session_event_key(key) {
        return None;
    }
    let rest = key.strip_prefix(SESSION_PREFIX)?;
    let (rut, dv) = rest.rsplit_once('-')?;
    Identity::new(rut, dv).ok()
}
