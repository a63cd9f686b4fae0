//! Fetch and publish against the in-memory store

use std::time::Duration;
use wrapsync_core::{FileEntry, RetryPolicy, fetch_tree, publish_tree};
use wrapsync_test_utils::{MockStore, WrapperTreeBuilder};

fn sample_tree() -> Vec<FileEntry> {
    vec![
        FileEntry::new("a.txt", "hello"),
        FileEntry::new("sub", Vec::new()),
        FileEntry::new("sub/b.txt", Vec::new()),
    ]
}

#[tokio::test]
async fn test_fetch_without_failures_reports_zero_retries() {
    let store = MockStore::new().with_tree("bafy123", sample_tree());

    let outcome = fetch_tree("bafy123", &store, &RetryPolicy::default())
        .await
        .unwrap();

    assert_eq!(outcome.retries, 0);
    assert_eq!(outcome.result.unwrap(), sample_tree());
    assert_eq!(store.fetch_attempts(), 1);
}

#[tokio::test]
async fn test_fetch_retries_equal_failures_below_bound() {
    for failures in 1..5 {
        let store = MockStore::new().with_tree("bafy123", sample_tree());
        store.fail_fetches(failures);

        let outcome = fetch_tree("bafy123", &store, &RetryPolicy::default())
            .await
            .unwrap();

        assert!(outcome.result.is_some(), "failures = {failures}");
        assert_eq!(outcome.retries, failures);
        assert_eq!(store.fetch_attempts(), failures + 1);
    }
}

#[tokio::test]
async fn test_always_failing_fetch_stops_at_bound() {
    let store = MockStore::new().with_tree("bafy123", sample_tree());
    store.always_fail_fetches();

    let outcome = fetch_tree("bafy123", &store, &RetryPolicy::new(3))
        .await
        .unwrap();

    assert!(outcome.is_exhausted());
    assert_eq!(outcome.retries, 3);
    assert_eq!(store.fetch_attempts(), 3);
}

#[tokio::test]
async fn test_unknown_identifier_exhausts_budget() {
    let store = MockStore::new();

    let outcome = fetch_tree("bafyMissing", &store, &RetryPolicy::default())
        .await
        .unwrap();

    assert!(outcome.is_exhausted());
    assert_eq!(store.fetch_attempts(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_between_attempts() {
    let store = MockStore::new().with_tree("bafy123", sample_tree());
    store.fail_fetches(2);
    let policy = RetryPolicy::default().with_delay(Duration::from_secs(1));

    let started = tokio::time::Instant::now();
    let outcome = fetch_tree("bafy123", &store, &policy).await.unwrap();

    assert_eq!(outcome.retries, 2);
    // 1s before the second attempt, 2s before the third
    assert!(started.elapsed() >= Duration::from_secs(3));
}

#[tokio::test]
async fn test_publish_gives_up_after_five_failures() {
    let store = MockStore::new();
    store.always_fail_publishes();

    let outcome = publish_tree(
        &WrapperTreeBuilder::sample().entries(),
        &store,
        &RetryPolicy::default(),
    )
    .await
    .unwrap();

    assert!(outcome.is_exhausted());
    assert_eq!(outcome.retries, 5);
    assert_eq!(store.publish_attempts(), 5);
}

#[tokio::test]
async fn test_publish_is_stable() {
    let store = MockStore::new();
    let files = WrapperTreeBuilder::sample().entries();

    let first = publish_tree(&files, &store, &RetryPolicy::default())
        .await
        .unwrap();
    let second = publish_tree(&files, &store, &RetryPolicy::default())
        .await
        .unwrap();

    assert!(first.result.is_some());
    assert_eq!(first.result, second.result);
    assert_eq!(first.result, Some(MockStore::content_id(&files)));
}

#[tokio::test]
async fn test_publish_recovers_after_failures() {
    let store = MockStore::new();
    store.fail_publishes(2);

    let outcome = publish_tree(
        &WrapperTreeBuilder::sample().entries(),
        &store,
        &RetryPolicy::default(),
    )
    .await
    .unwrap();

    assert!(outcome.result.is_some());
    assert_eq!(outcome.retries, 2);
    assert_eq!(store.publish_attempts(), 3);
}
