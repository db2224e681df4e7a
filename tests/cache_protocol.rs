// File: tests/cache_protocol.rs
mod common;

use common::{DEAD_URL, Harness, body, entry};
use daybook::auth::AuthState;
use daybook::model::JournalEntry;
use daybook::notify::NoticeLevel;
use mockito::Server;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[tokio::test]
async fn test_refresh_with_token_replaces_and_persists() {
    let mut server = Server::new_async().await;
    let json = r#"[{"id":1,"title":"A","content":"x","created_at":"2024-01-01T00:00:00Z"}]"#;
    let m = server
        .mock("GET", "/journal")
        .match_header("authorization", "Bearer abc")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json)
        .expect(1)
        .create_async()
        .await;

    let mut h = Harness::new(&server.url()).with_token("abc");
    h.app.cache.load(true).await;

    let expected = vec![JournalEntry::new(1, "A", "x", "2024-01-01T00:00:00Z")];
    assert_eq!(h.app.entries(), expected);
    assert_eq!(h.persisted(), Some(expected));
    m.assert_async().await;

    let notices = h.drain_notices();
    assert!(notices.iter().any(|n| n.level == NoticeLevel::Success));
}

#[tokio::test]
async fn test_successive_fetches_do_not_accumulate() {
    let mut server = Server::new_async().await;
    let first = vec![entry(1, "one"), entry(2, "two")];
    let second = vec![entry(3, "three")];

    let m1 = server
        .mock("GET", "/journal")
        .with_status(200)
        .with_body(body(&first))
        .expect(1)
        .create_async()
        .await;

    let h = Harness::new(&server.url()).with_token("abc");
    h.app.cache.refresh().await;
    assert_eq!(h.app.entries(), first);
    m1.assert_async().await;
    m1.remove_async().await;

    let m2 = server
        .mock("GET", "/journal")
        .with_status(200)
        .with_body(body(&second))
        .expect(1)
        .create_async()
        .await;

    h.app.cache.refresh().await;
    assert_eq!(h.app.entries(), second);
    assert_eq!(h.persisted(), Some(second));
    m2.assert_async().await;
}

#[tokio::test]
async fn test_no_cache_no_token_makes_no_calls() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("GET", "/journal")
        .expect(0)
        .create_async()
        .await;

    let h = Harness::new(&server.url());
    h.app.cache.load(false).await;

    assert!(h.app.entries().is_empty());
    assert_eq!(h.persisted(), None);
    m.assert_async().await;
}

#[tokio::test]
async fn test_cleared_token_skips_list_endpoint() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("GET", "/journal")
        .expect(0)
        .create_async()
        .await;

    let h = Harness::new(&server.url()).with_token("abc");
    h.app.gate.tokens().clear_token().unwrap();
    h.app.cache.load(true).await;

    assert!(h.app.entries().is_empty());
    m.assert_async().await;
}

#[tokio::test]
async fn test_network_failure_serves_persisted_snapshot() {
    let cached = vec![entry(2, "cached")];
    let h = Harness::new(DEAD_URL)
        .with_token("abc")
        .with_cached(&cached);

    h.app.cache.load(false).await;

    assert_eq!(h.app.entries(), cached);
    assert_eq!(h.persisted(), Some(cached));
    assert!(!h.app.cache.is_loading());
    // A dead network is not an auth failure; the session survives.
    assert_eq!(h.stored_token().as_deref(), Some("abc"));
}

#[tokio::test]
async fn test_server_error_serves_persisted_snapshot() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", "/journal")
        .with_status(500)
        .with_body(r#"{"error":"db down"}"#)
        .create_async()
        .await;

    let cached = vec![entry(2, "cached")];
    let mut h = Harness::new(&server.url())
        .with_token("abc")
        .with_cached(&cached);

    h.app.cache.load(false).await;

    assert_eq!(h.app.entries(), cached);
    assert_eq!(h.persisted(), Some(cached));
    let notices = h.drain_notices();
    assert!(
        notices
            .iter()
            .any(|n| n.level == NoticeLevel::Error && n.description == "db down")
    );
}

#[tokio::test]
async fn test_malformed_payload_keeps_snapshot() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", "/journal")
        .with_status(200)
        .with_body(r#"{"journals": "not a list"}"#)
        .create_async()
        .await;

    let cached = vec![entry(9, "keep me")];
    let h = Harness::new(&server.url())
        .with_token("abc")
        .with_cached(&cached);

    h.app.cache.load(false).await;
    assert_eq!(h.app.entries(), cached);
    assert_eq!(h.persisted(), Some(cached));
}

#[tokio::test]
async fn test_failure_without_cache_is_empty_not_error() {
    let h = Harness::new(DEAD_URL).with_token("abc");
    h.app.cache.load(false).await;
    assert!(h.app.entries().is_empty());
    assert_eq!(h.persisted(), None);
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_snapshot() {
    let mut server = Server::new_async().await;
    let fresh = vec![entry(1, "fresh")];
    let ok = server
        .mock("GET", "/journal")
        .with_status(200)
        .with_body(body(&fresh))
        .create_async()
        .await;

    let h = Harness::new(&server.url()).with_token("abc");
    h.app.cache.refresh().await;
    assert_eq!(h.app.entries(), fresh);
    ok.remove_async().await;

    let _fail = server
        .mock("GET", "/journal")
        .with_status(503)
        .create_async()
        .await;
    h.app.cache.refresh().await;

    assert_eq!(h.app.entries(), fresh);
    assert_eq!(h.persisted(), Some(fresh));
}

#[tokio::test]
async fn test_corrupted_persisted_cache_is_ignored() {
    let mut server = Server::new_async().await;
    let fetched = vec![entry(4, "server")];
    let _m = server
        .mock("GET", "/journal")
        .with_status(200)
        .with_body(body(&fetched))
        .create_async()
        .await;

    let h = Harness::new(&server.url()).with_token("abc");
    {
        use daybook::storage::KeyValueStore;
        h.store
            .set(daybook::cache::CACHE_KEY, "[{\"id\":")
            .unwrap();
    }

    h.app.cache.load(false).await;
    assert_eq!(h.app.entries(), fetched);
    assert_eq!(h.persisted(), Some(fetched));
}

#[tokio::test]
async fn test_unauthorized_list_ends_session_but_keeps_cache() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", "/journal")
        .with_status(401)
        .create_async()
        .await;

    let cached = vec![entry(2, "cached")];
    let h = Harness::new(&server.url())
        .with_token("expired")
        .with_cached(&cached);

    h.app.cache.load(false).await;

    assert_eq!(h.app.entries(), cached);
    assert_eq!(h.stored_token(), None);
    assert_eq!(h.app.gate.state(), AuthState::Unauthenticated);
}

#[tokio::test]
async fn test_concurrent_loads_last_write_wins_without_mixing() {
    let mut server = Server::new_async().await;
    let first = vec![entry(1, "one"), entry(2, "two")];
    let second = vec![entry(3, "three")];
    let payloads = [body(&first), body(&second)];
    let served = Arc::new(AtomicUsize::new(0));
    let counter = served.clone();
    let m = server
        .mock("GET", "/journal")
        .with_status(200)
        .with_body_from_request(move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            payloads[n.min(1)].clone().into_bytes()
        })
        .expect(2)
        .create_async()
        .await;

    let h = Harness::new(&server.url()).with_token("abc");
    // No de-duplication: both loads hit the server.
    futures::join!(h.app.cache.load(false), h.app.cache.refresh());

    let snapshot = h.app.entries();
    assert!(
        snapshot == first || snapshot == second,
        "snapshot mixes responses: {:?}",
        snapshot
    );
    assert_eq!(h.persisted(), Some(snapshot));
    assert_eq!(served.load(Ordering::SeqCst), 2);
    assert!(!h.app.cache.is_loading());
    assert!(!h.app.cache.is_refreshing());
    m.assert_async().await;
}

#[tokio::test]
async fn test_restart_reads_back_what_was_fetched() {
    let mut server = Server::new_async().await;
    let fetched = vec![entry(1, "a"), entry(2, "b")];
    let _m = server
        .mock("GET", "/journal")
        .with_status(200)
        .with_body(body(&fetched))
        .create_async()
        .await;

    let h = Harness::new(&server.url()).with_token("abc");
    h.app.cache.refresh().await;

    // Second process: same data dir, server gone.
    let restarted = Harness {
        app: daybook::controller::JournalController::with_store(
            &daybook::config::Config {
                api_url: DEAD_URL.to_string(),
                ..Default::default()
            },
            h.store.clone(),
            std::sync::Arc::new(daybook::notify::NullNotifier),
        )
        .unwrap(),
        ..h
    };
    restarted.app.cache.load(false).await;
    assert_eq!(restarted.app.entries(), fetched);
}
