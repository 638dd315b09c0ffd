//! Configuration for the Redis connection and session TTLs.

use std::time::Duration;

/// Default TTL for a cached session (2 hours, matching the portal's own
/// session lifetime).
pub const DEFAULT_SESSION_TTL_SECS: u64 = 7200;

/// Default extra lifetime of the shadow close record beyond the primary
/// key's TTL. The margin is what lets the listener still fetch close
/// credentials after the primary key has already expired.
pub const DEFAULT_CLOSE_GRACE_SECS: u64 = 60;

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default per-command response timeout, so a stalled Redis does not stall
/// the listener indefinitely.
pub const DEFAULT_RESPONSE_TIMEOUT_SECS: u64 = 5;

/// Connection settings for the backing Redis instance.
///
/// Read once when the handle connects; changing the config afterwards has no
/// effect until the handle is closed and a new one is built.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis host name or address.
    pub host: String,

    /// Redis port.
    pub port: u16,

    /// Database index. Also selects the keyspace-notification channel the
    /// expiration listener subscribes to.
    pub db: u32,

    /// Optional AUTH credential.
    pub password: Option<String>,

    /// Timeout for establishing the connection.
    pub connect_timeout: Duration,

    /// Timeout applied to each command round trip.
    pub response_timeout: Duration,

    /// TCP keep-alive interval (default 30s). Not currently applied: the
    /// `redis` crate exposes no keep-alive knob, and the managed
    /// connection's reconnect logic covers the same concern.
    pub keepalive: Duration,

    /// How often the shared connection would be health-checked
    /// (default 30s). Not currently applied, for the same reason as
    /// `keepalive`.
    pub health_check_interval: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            db: 0,
            password: None,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            response_timeout: Duration::from_secs(DEFAULT_RESPONSE_TIMEOUT_SECS),
            keepalive: Duration::from_secs(30),
            health_check_interval: Duration::from_secs(30),
        }
    }
}

impl RedisConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from `REDIS_HOST`, `REDIS_PORT`, `REDIS_DB`,
    /// and `REDIS_PASSWORD`, falling back to defaults for anything unset or
    /// unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(host) = std::env::var("REDIS_HOST") {
            config.host = host;
        }
        if let Some(port) = std::env::var("REDIS_PORT").ok().and_then(|p| p.parse().ok()) {
            config.port = port;
        }
        if let Some(db) = std::env::var("REDIS_DB").ok().and_then(|d| d.parse().ok()) {
            config.db = db;
        }
        if let Ok(password) = std::env::var("REDIS_PASSWORD") {
            if !password.is_empty() {
                config.password = Some(password);
            }
        }
        config
    }

    /// Set the host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the database index.
    pub fn with_db(mut self, db: u32) -> Self {
        self.db = db;
        self
    }

    /// Set the AUTH credential.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the per-command response timeout.
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Render the connection URL.
    pub fn url(&self) -> String {
        match &self.password {
            Some(password) => {
                format!("redis://:{}@{}:{}/{}", password, self.host, self.port, self.db)
            }
            None => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }
}

/// TTL policy for the two keys written per session.
#[derive(Debug, Clone, Copy)]
pub struct SessionTtl {
    /// Lifetime of the primary session record.
    pub session: Duration,

    /// Extra lifetime of the shadow close record beyond the primary TTL.
    pub close_grace: Duration,
}

impl Default for SessionTtl {
    fn default() -> Self {
        Self {
            session: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            close_grace: Duration::from_secs(DEFAULT_CLOSE_GRACE_SECS),
        }
    }
}

impl SessionTtl {
    /// Set the session TTL.
    pub fn with_session_secs(mut self, secs: u64) -> Self {
        self.session = Duration::from_secs(secs);
        self
    }

    /// Set the close-record grace period.
    pub fn with_close_grace_secs(mut self, secs: u64) -> Self {
        self.close_grace = Duration::from_secs(secs);
        self
    }

    /// Effective primary TTL in seconds for a save or renewal, honoring a
    /// per-call override.
    pub fn session_secs(&self, override_secs: Option<u64>) -> u64 {
        override_secs.unwrap_or(self.session.as_secs())
    }

    /// Shadow-record TTL for a given primary TTL. Always at least the
    /// primary TTL, so close data outlives the session it covers.
    pub fn close_secs(&self, session_secs: u64) -> u64 {
        session_secs + self.close_grace.as_secs()
    }
}
