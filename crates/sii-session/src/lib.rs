//! Session lifecycle cache for the SII tax portal.
//!
//! The SII issues short-lived session credentials (a `TOKEN` cookie and a
//! companion `CSESSIONID`) that are expensive and rate-limited to obtain.
//! This crate caches them in Redis per taxpayer identity and takes care of
//! the part the portal cares about: sessions must be explicitly closed on
//! the remote side, even when the cache has already forgotten them.
//!
//! Each saved session writes two keys:
//! - a primary record under `session:sii:{rut}-{dv}` with the session TTL
//! - a shadow "close" record under `session:sii:close:{rut}-{dv}` with a
//!   slightly longer TTL, kept solely so the close credentials are still
//!   retrievable after the primary key has expired (Redis expiration events
//!   carry only the key name, never the value)
//!
//! An [`ExpirationListener`] subscribes to Redis key-expiration events and,
//! when a primary key expires, resolves the shadow record, asks a
//! [`SessionTerminator`] to close the session on the portal, and removes the
//! shadow key. Callers go through the [`SessionCache`] facade instead, which
//! also supports explicit, caller-initiated closes.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sii_session::{
//!     ExpirationListener, Identity, NoopTerminator, RedisConfig, RedisHandle,
//!     SessionCache, SessionStore, SessionTtl,
//! };
//!
//! let handle = RedisHandle::connect(RedisConfig::from_env()).await?;
//! let store = SessionStore::new(handle.manager()?, SessionTtl::default());
//! let terminator = Arc::new(NoopTerminator);
//!
//! let mut listener = ExpirationListener::new(&handle, store.clone(), terminator.clone());
//! listener.start().await?;
//!
//! let cache = SessionCache::new(store, terminator);
//! let identity = Identity::new("12345678", "9")?;
//! cache.save(&identity, "TOKEN", "CSESSIONID", None).await;
//! ```

mod config;
mod connection;
mod error;
mod facade;
pub mod keys;
mod listener;
mod store;
mod terminator;
mod types;

pub use config::{
    DEFAULT_CLOSE_GRACE_SECS, DEFAULT_SESSION_TTL_SECS, RedisConfig, SessionTtl,
};
pub use connection::RedisHandle;
pub use error::{Error, Result};
pub use facade::SessionCache;
pub use listener::ExpirationListener;
pub use store::SessionStore;
pub use terminator::{NoopTerminator, SessionTerminator};
pub use types::{Identity, SessionRecord};
