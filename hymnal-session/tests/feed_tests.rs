//! Home feed loader tests
//!
//! Timeout behavior runs on tokio's paused clock, so the 8 s bound is
//! exercised without waiting.

mod helpers;

use std::time::Duration;

use helpers::*;
use hymnal_common::events::SessionEvent;
use hymnal_common::HomeFeed;
use hymnal_session::config::SessionConfig;

fn feed_with(ids: &[&str]) -> HomeFeed {
    HomeFeed {
        recent: tracks(ids),
        popular: vec![],
        categories: vec!["Advent".to_string()],
        composers: vec!["Wesley".to_string()],
        is_fallback: false,
    }
}

#[tokio::test(start_paused = true)]
async fn test_hung_feed_falls_back_after_timeout() {
    let api = FakeApi::new();
    api.script_feed(Reply::Never);
    let t = test_session(SessionConfig::default(), api);

    let started = tokio::time::Instant::now();
    let feed = t.session.load_home_feed().await.expect("not superseded");

    assert!(started.elapsed() >= Duration::from_millis(8000));
    assert!(started.elapsed() < Duration::from_millis(9000));
    assert!(feed.is_fallback);
    assert!(feed.is_empty());
    assert_eq!(feed, HomeFeed::empty());
    assert_eq!(t.session.home_feed(), Some(HomeFeed::empty()));
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_configurable() {
    let mut config = SessionConfig::default();
    config.feed.timeout_ms = 500;
    let api = FakeApi::new();
    api.script_feed(Reply::Never);
    let t = test_session(config, api);

    let started = tokio::time::Instant::now();
    let feed = t.session.load_home_feed().await.unwrap();
    assert!(feed.is_fallback);
    assert!(started.elapsed() < Duration::from_millis(1000));
}

#[tokio::test]
async fn test_feed_error_falls_back_immediately() {
    let api = FakeApi::new();
    api.script_feed(Reply::network_error());
    let t = test_session(SessionConfig::default(), api);

    let feed = t.session.load_home_feed().await.unwrap();
    assert_eq!(feed, HomeFeed::empty());
}

#[tokio::test]
async fn test_feed_success_is_current() {
    let api = FakeApi::new();
    api.script_feed(Reply::ok(feed_with(&["a", "b"])));
    let t = test_session(SessionConfig::default(), api);
    let mut events = t.session.subscribe();

    let feed = t.session.load_home_feed().await.unwrap();

    assert!(!feed.is_fallback);
    assert_eq!(feed.recent.len(), 2);
    assert_eq!(t.session.home_feed(), Some(feed));
    assert!(drain_events(&mut events)
        .iter()
        .any(|e| matches!(e, SessionEvent::HomeFeedUpdated { fallback: false, .. })));
}

#[tokio::test]
async fn test_superseded_feed_is_discarded() {
    let api = FakeApi::new();
    let (first, first_reply) = gate();
    api.script_feed(first_reply);
    api.script_feed(Reply::ok(feed_with(&["new"])));
    let t = test_session(SessionConfig::default(), api);

    let loader = t.session.feed().clone();
    let older = tokio::spawn(async move { loader.load().await });
    settle().await;

    let newer = t.session.load_home_feed().await;
    assert_eq!(newer, Some(feed_with(&["new"])));

    first.send(Ok(feed_with(&["old"]))).unwrap();
    assert_eq!(older.await.unwrap(), None);
    assert_eq!(t.session.home_feed(), Some(feed_with(&["new"])));
}
