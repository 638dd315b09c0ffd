//! HTTP implementation of the session-termination collaborator.
//!
//! The SII expects sessions to be explicitly ended through its
//! `autTermino.cgi` endpoint; leaving them dangling wastes a slot on their
//! side and can trip anti-abuse defenses. [`PortalTerminator`] performs that
//! single outbound call, authenticated by the cached session cookies, and
//! implements the [`sii_session::SessionTerminator`] contract.
//!
//! The portal's answer to a logout is not a clean API response — it has been
//! observed returning non-2xx statuses for sessions it nevertheless closed.
//! How strictly statuses are judged is therefore configurable via
//! [`TerminationPolicy`]; the default matches the observed lenient behavior.

mod client;
mod config;
mod error;

pub use client::PortalTerminator;
pub use config::{DEFAULT_TERMINATE_URL, PortalConfig, TerminationPolicy};
pub use error::{PortalError, Result};
