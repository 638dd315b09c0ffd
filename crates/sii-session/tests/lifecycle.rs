//! End-to-end lifecycle tests against a live Redis.
//!
//! These tests need a local Redis (configure with `REDIS_HOST`/`REDIS_PORT`/
//! `REDIS_DB`/`REDIS_PASSWORD`) that either allows `CONFIG SET` or already
//! has `notify-keyspace-events Ex` enabled. They are `#[ignore]`d so the
//! default suite passes without one; run them with `cargo test -- --ignored`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sii_session::{
    ExpirationListener, Identity, RedisConfig, RedisHandle, SessionCache, SessionRecord,
    SessionStore, SessionTerminator, SessionTtl,
};

/// Terminator that records every call and returns a fixed result.
#[derive(Debug, Default)]
struct RecordingTerminator {
    calls: Mutex<Vec<SessionRecord>>,
    fail: bool,
}

impl RecordingTerminator {
    fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    fn calls(&self) -> Vec<SessionRecord> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionTerminator for RecordingTerminator {
    async fn terminate(&self, record: &SessionRecord) -> bool {
        self.calls.lock().unwrap().push(record.clone());
        !self.fail
    }
}

async fn connect() -> RedisHandle {
    RedisHandle::connect(RedisConfig::from_env())
        .await
        .expect("Redis must be running for these tests")
}

fn store_for(handle: &RedisHandle) -> SessionStore {
    SessionStore::new(handle.manager().unwrap(), SessionTtl::default())
}

#[tokio::test]
#[ignore]
async fn test_ping_reports_live_connection() {
    let handle = connect().await;
    assert!(handle.ping().await);
}

#[tokio::test]
#[ignore]
async fn test_save_get_delete_round_trip() {
    let handle = connect().await;
    let store = store_for(&handle);
    let identity = Identity::new("11111111", "1").unwrap();

    assert!(store.save(&identity, "TOK", "CS", Some(60)).await);

    let record = store.get(&identity).await.expect("record must be readable");
    assert_eq!(record.token, "TOK");
    assert_eq!(record.csessionid, "CS");
    assert_eq!(record.rut, "11111111");

    assert!(store.delete(&identity).await);
    assert!(store.get(&identity).await.is_none());
    assert!(store.close_data(&identity).await.is_none());
}

#[tokio::test]
#[ignore]
async fn test_ttl_reflects_save_and_unknown_is_absent() {
    let handle = connect().await;
    let store = store_for(&handle);
    let identity = Identity::new("11111112", "2").unwrap();
    let unknown = Identity::new("99999999", "9").unwrap();

    assert!(store.save(&identity, "TOK", "CS", Some(60)).await);

    let ttl = store.ttl(&identity).await.expect("ttl must exist");
    assert!(ttl > 55 && ttl <= 60, "unexpected ttl {ttl}");
    assert!(store.ttl(&unknown).await.is_none());

    store.delete(&identity).await;
}

#[tokio::test]
#[ignore]
async fn test_delete_unknown_returns_false() {
    let handle = connect().await;
    let store = store_for(&handle);
    let unknown = Identity::new("99999998", "8").unwrap();

    assert!(!store.delete(&unknown).await);
}

#[tokio::test]
#[ignore]
async fn test_renew_extends_ttl_but_not_unknown_sessions() {
    let handle = connect().await;
    let store = store_for(&handle);
    let identity = Identity::new("11111113", "3").unwrap();
    let unknown = Identity::new("99999997", "7").unwrap();

    assert!(!store.renew(&unknown, Some(120)).await);

    assert!(store.save(&identity, "TOK", "CS", Some(30)).await);
    assert!(store.renew(&identity, Some(120)).await);

    let ttl = store.ttl(&identity).await.expect("ttl must exist");
    assert!(ttl > 115 && ttl <= 120, "unexpected ttl {ttl}");

    store.delete(&identity).await;
}

#[tokio::test]
#[ignore]
async fn test_close_data_survives_primary_expiry() {
    let handle = connect().await;
    let store = store_for(&handle);
    let identity = Identity::new("11111114", "4").unwrap();

    assert!(store.save(&identity, "TOK", "CS", Some(1)).await);
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert!(store.get(&identity).await.is_none());
    let close = store
        .close_data(&identity)
        .await
        .expect("close record must outlive the session");
    assert_eq!(close.token, "TOK");

    store.delete(&identity).await;
}

// Scenario: natural expiry wakes the listener, which closes the session
// remotely exactly once and cleans up the shadow key.
#[tokio::test]
#[ignore]
async fn test_expiry_triggers_remote_close_once() {
    let handle = connect().await;
    let store = store_for(&handle);
    let terminator = Arc::new(RecordingTerminator::default());
    let identity = Identity::new("12345678", "9").unwrap();

    let mut listener = ExpirationListener::new(&handle, store.clone(), terminator.clone());
    listener.start().await.unwrap();

    assert!(store.save(&identity, "TOK1", "CS1", Some(1)).await);
    tokio::time::sleep(Duration::from_secs(3)).await;

    assert!(store.get(&identity).await.is_none());

    let calls = terminator.calls();
    assert_eq!(calls.len(), 1, "terminator must fire exactly once");
    assert_eq!(calls[0].token, "TOK1");
    assert_eq!(calls[0].csessionid, "CS1");
    assert_eq!(calls[0].rut, "12345678");
    assert_eq!(calls[0].dv, "9");

    // Shadow key cleaned up by the listener, not left to its grace TTL.
    assert!(store.close_data(&identity).await.is_none());

    listener.stop().await.unwrap();
}

// Scenario: explicit close before expiry terminates remotely and removes
// both keys.
#[tokio::test]
#[ignore]
async fn test_explicit_close_terminates_and_deletes() {
    let handle = connect().await;
    let store = store_for(&handle);
    let terminator = Arc::new(RecordingTerminator::default());
    let cache = SessionCache::new(store.clone(), terminator.clone());
    let identity = Identity::new("87654321", "3").unwrap();

    assert!(cache.save(&identity, "TOK2", "CS2", Some(3600)).await);
    assert!(cache.close_session(&identity, true).await);

    let calls = terminator.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].token, "TOK2");

    assert!(cache.get(&identity).await.is_none());
    assert!(cache.close_data(&identity).await.is_none());
}

// Scenario: closing a session that was never saved does nothing.
#[tokio::test]
#[ignore]
async fn test_close_unknown_session_returns_false() {
    let handle = connect().await;
    let store = store_for(&handle);
    let terminator = Arc::new(RecordingTerminator::default());
    let cache = SessionCache::new(store, terminator.clone());
    let identity = Identity::new("99999996", "6").unwrap();

    assert!(!cache.close_session(&identity, true).await);
    assert!(terminator.calls().is_empty());
}

// Scenario: a failing terminator must not block local cleanup.
#[tokio::test]
#[ignore]
async fn test_close_cleans_up_even_when_remote_fails() {
    let handle = connect().await;
    let store = store_for(&handle);
    let terminator = Arc::new(RecordingTerminator::failing());
    let cache = SessionCache::new(store.clone(), terminator.clone());
    let identity = Identity::new("22222222", "2").unwrap();

    assert!(cache.save(&identity, "TOK3", "CS3", Some(3600)).await);
    assert!(cache.close_session(&identity, true).await);

    assert_eq!(terminator.calls().len(), 1);
    assert!(cache.get(&identity).await.is_none());
    assert!(cache.close_data(&identity).await.is_none());
}

#[tokio::test]
#[ignore]
async fn test_malformed_payload_reads_as_a_miss() {
    use redis::AsyncCommands;

    let handle = connect().await;
    let store = store_for(&handle);
    let identity = Identity::new("33333333", "3").unwrap();

    let mut con = handle.manager().unwrap();
    let _: () = con
        .set(sii_session::keys::session_key(&identity), "not json")
        .await
        .unwrap();
    let _: () = con
        .set(sii_session::keys::close_key(&identity), "{\"token\":1}")
        .await
        .unwrap();

    assert!(store.get(&identity).await.is_none());
    assert!(store.close_data(&identity).await.is_none());

    // The corrupt keys still exist, so delete reports a removal.
    assert!(store.delete(&identity).await);
}

#[tokio::test]
#[ignore]
async fn test_key_without_expiry_reports_zero_ttl() {
    use redis::AsyncCommands;

    let handle = connect().await;
    let store = store_for(&handle);
    let identity = Identity::new("33333334", "4").unwrap();

    // Plain SET, no TTL. Normal operation never produces this, but the
    // sentinel must be 0, not Redis's raw -1.
    let record = SessionRecord::new(&identity, "TOK", "CS");
    let mut con = handle.manager().unwrap();
    let _: () = con
        .set(
            sii_session::keys::session_key(&identity),
            serde_json::to_string(&record).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(store.ttl(&identity).await, Some(0));

    store.delete(&identity).await;
}

// Dropping a started listener without stop() closes its shutdown channel;
// the worker must exit instead of re-consuming the event stream.
#[tokio::test]
#[ignore]
async fn test_dropped_listener_stops_processing_expirations() {
    let handle = connect().await;
    let store = store_for(&handle);
    let terminator = Arc::new(RecordingTerminator::default());
    let identity = Identity::new("44444444", "4").unwrap();

    let mut listener = ExpirationListener::new(&handle, store.clone(), terminator.clone());
    listener.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    drop(listener);

    assert!(store.save(&identity, "TOK4", "CS4", Some(1)).await);
    tokio::time::sleep(Duration::from_secs(3)).await;

    // No worker left: the expiry fired but nothing terminated or cleaned up
    // the close record.
    assert!(terminator.calls().is_empty());
    assert!(store.close_data(&identity).await.is_some());

    store.delete(&identity).await;
}

#[tokio::test]
#[ignore]
async fn test_listener_start_twice_is_an_error() {
    let handle = connect().await;
    let store = store_for(&handle);
    let terminator = Arc::new(RecordingTerminator::default());

    let mut listener = ExpirationListener::new(&handle, store, terminator);
    listener.start().await.unwrap();
    assert!(listener.start().await.is_err());
    assert!(listener.is_running());

    listener.stop().await.unwrap();
    assert!(!listener.is_running());
    assert!(listener.stop().await.is_err());
}
