//! Background worker reacting to key-expiration events.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::connection::RedisHandle;
use crate::error::{Error, Result};
use crate::keys;
use crate::store::SessionStore;
use crate::terminator::SessionTerminator;

/// Delay before retrying a failed or dropped pub/sub subscription.
pub const DEFAULT_RESUBSCRIBE_DELAY: Duration = Duration::from_secs(5);

/// Listens for primary-key expirations and closes the matching session on
/// the portal.
///
/// Runs as a single dedicated task for the lifetime of the process; events
/// are processed one at a time, in delivery order. `start()` must be called
/// exactly once — a second call errors rather than spawning a competing
/// consumer of the same event stream. `stop()` signals the task and joins
/// it.
///
/// The worker has two layers of resilience:
/// - each notification is handled in an isolated scope whose failures are
///   logged and swallowed, so one bad event never kills the loop;
/// - a supervisor loop re-establishes the subscription itself if it fails
///   or the connection drops, with a fixed backoff. Missed events are not
///   replayed; the shadow key's own TTL bounds the leak.
pub struct ExpirationListener {
    client: redis::Client,
    store: SessionStore,
    terminator: Arc<dyn SessionTerminator>,
    db: u32,
    resubscribe_delay: Duration,
    shutdown: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl ExpirationListener {
    /// Create a listener over the handle's connection.
    pub fn new(
        handle: &RedisHandle,
        store: SessionStore,
        terminator: Arc<dyn SessionTerminator>,
    ) -> Self {
        Self {
            client: handle.client().clone(),
            store,
            terminator,
            db: handle.config().db,
            resubscribe_delay: DEFAULT_RESUBSCRIBE_DELAY,
            shutdown: None,
            handle: None,
        }
    }

    /// Set the supervisor's resubscribe backoff.
    pub fn with_resubscribe_delay(mut self, delay: Duration) -> Self {
        self.resubscribe_delay = delay;
        self
    }

    /// Whether the worker task is alive.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Start the worker. Errors if it is already running.
    pub async fn start(&mut self) -> Result<()> {
        if self.handle.is_some() {
            return Err(Error::ListenerRunning);
        }

        self.enable_keyspace_events().await;

        let (tx, rx) = watch::channel(false);
        let worker = ListenerWorker {
            client: self.client.clone(),
            store: self.store.clone(),
            terminator: Arc::clone(&self.terminator),
            pattern: keys::expired_event_pattern(self.db),
            resubscribe_delay: self.resubscribe_delay,
        };
        self.handle = Some(tokio::spawn(worker.run(rx)));
        self.shutdown = Some(tx);

        info!(db = self.db, "expiration listener started");
        Ok(())
    }

    /// Signal the worker and wait for it to exit. Errors if it was never
    /// started.
    pub async fn stop(&mut self) -> Result<()> {
        let (Some(tx), Some(handle)) = (self.shutdown.take(), self.handle.take()) else {
            return Err(Error::ListenerNotRunning);
        };
        let _ = tx.send(true);
        if handle.await.is_err() {
            warn!("expiration listener task panicked before shutdown");
        }
        info!("expiration listener stopped");
        Ok(())
    }

    /// Ask Redis to publish expired-key events. Best-effort: without the
    /// CONFIG permission this logs the manual command and carries on.
    async fn enable_keyspace_events(&self) {
        match self.client.get_multiplexed_async_connection().await {
            Ok(mut con) => {
                let set: redis::RedisResult<()> = redis::cmd("CONFIG")
                    .arg("SET")
                    .arg("notify-keyspace-events")
                    .arg("Ex")
                    .query_async(&mut con)
                    .await;
                if let Err(e) = set {
                    warn!(
                        error = %e,
                        "could not enable keyspace notifications; run \
                         `redis-cli CONFIG SET notify-keyspace-events Ex` manually"
                    );
                }
            }
            Err(e) => {
                warn!(error = %e, "could not open connection to configure keyspace notifications");
            }
        }
    }
}

/// State moved into the spawned worker task.
struct ListenerWorker {
    client: redis::Client,
    store: SessionStore,
    terminator: Arc<dyn SessionTerminator>,
    pattern: String,
    resubscribe_delay: Duration,
}

impl ListenerWorker {
    /// Supervisor loop: (re)subscribe until shutdown.
    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.client.get_async_pubsub().await {
                Ok(mut pubsub) => match pubsub.psubscribe(&self.pattern).await {
                    Ok(()) => {
                        info!(pattern = %self.pattern, "subscribed to key-expiration events");
                        self.receive_loop(&mut pubsub, &mut shutdown).await;
                        if *shutdown.borrow() {
                            break;
                        }
                        warn!("expiration event stream ended; resubscribing");
                    }
                    Err(e) => {
                        error!(error = %e, "could not subscribe to key-expiration events");
                    }
                },
                Err(e) => {
                    error!(error = %e, "could not open pub/sub connection");
                }
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    // A closed channel means the listener was dropped
                    // without stop(); exit rather than spin on resubscribes.
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(self.resubscribe_delay) => {}
            }
        }
        debug!("expiration listener worker exited");
    }

    /// Blocking receive loop over one subscription. Returns when the stream
    /// ends or shutdown is signaled.
    async fn receive_loop(
        &self,
        pubsub: &mut redis::aio::PubSub,
        shutdown: &mut watch::Receiver<bool>,
    ) {
        let mut messages = pubsub.on_message();
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return;
                    }
                }
                msg = messages.next() => {
                    match msg {
                        Some(msg) => self.handle_event(&msg).await,
                        None => return,
                    }
                }
            }
        }
    }

    /// Process one expiration notification. Every failure mode here logs
    /// and returns; nothing propagates to the loop.
    async fn handle_event(&self, msg: &redis::Msg) {
        // Payload of an expired event is the key name, nothing more.
        let key: String = match msg.get_payload() {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e, "undecodable expiration event payload");
                return;
            }
        };

        if !keys::is_session_event_key(&key) {
            return;
        }
        let Some(identity) = keys::parse_session_key(&key) else {
            warn!(key, "expired key did not parse as a session identity");
            return;
        };

        info!(identity = %identity, "session expired; closing on the portal");

        match self.store.close_data(&identity).await {
            Some(record) => {
                if self.terminator.terminate(&record).await {
                    info!(identity = %identity, "expired session closed remotely");
                } else {
                    warn!(identity = %identity, "remote close failed for expired session");
                }
                // Cleanup does not depend on the remote outcome.
                self.store.remove_close_record(&identity).await;
            }
            None => {
                warn!(identity = %identity, "no close data found for expired session");
            }
        }
    }
}
