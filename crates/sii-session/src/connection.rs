//! Long-lived handle to the backing Redis instance.

use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use tracing::{debug, info, warn};

use crate::config::RedisConfig;
use crate::error::{Error, Result};

/// Owned handle to the shared Redis connection.
///
/// One handle is built at startup and passed by reference to the store,
/// listener, and facade. [`RedisHandle::manager`] hands out clones of a
/// single multiplexed, auto-reconnecting connection, so every component
/// shares one pipeline and no extra locking is needed.
///
/// Configuration is read once at [`RedisHandle::connect`]; changes after
/// that take effect only by closing the handle and connecting again.
pub struct RedisHandle {
    client: redis::Client,
    manager: Option<ConnectionManager>,
    config: RedisConfig,
}

impl RedisHandle {
    /// Connect to Redis, applying the configured connect timeout.
    ///
    /// Fails if the instance is unreachable; this is the only place a
    /// connectivity problem surfaces as an error instead of a degraded
    /// return value.
    pub async fn connect(config: RedisConfig) -> Result<Self> {
        let client =
            redis::Client::open(config.url()).map_err(|e| Error::Connect(e.to_string()))?;

        let manager_config = ConnectionManagerConfig::new()
            .set_connection_timeout(config.connect_timeout)
            .set_response_timeout(config.response_timeout);

        let manager = tokio::time::timeout(
            config.connect_timeout,
            client.get_connection_manager_with_config(manager_config),
        )
        .await
        .map_err(|_| Error::ConnectTimeout(config.connect_timeout))?
        .map_err(|e| Error::Connect(e.to_string()))?;

        info!(host = %config.host, port = config.port, db = config.db, "connected to Redis");

        Ok(Self {
            client,
            manager: Some(manager),
            config,
        })
    }

    /// Clone the shared connection for store operations.
    pub fn manager(&self) -> Result<ConnectionManager> {
        self.manager.clone().ok_or(Error::Closed)
    }

    /// The underlying client, used by the listener to open its dedicated
    /// pub/sub connection.
    pub fn client(&self) -> &redis::Client {
        &self.client
    }

    /// The configuration this handle was built with.
    pub fn config(&self) -> &RedisConfig {
        &self.config
    }

    /// Lightweight liveness check. Never errors; any connectivity failure
    /// reports `false`.
    pub async fn ping(&self) -> bool {
        let Some(mut con) = self.manager.clone() else {
            return false;
        };
        let pong: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut con).await;
        match pong {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Redis ping failed");
                false
            }
        }
    }

    /// Release the shared connection. Clones already handed out keep
    /// working; the handle itself must reconnect before further use.
    pub fn close(&mut self) {
        if self.manager.take().is_some() {
            debug!("Redis handle closed");
        }
    }
}
