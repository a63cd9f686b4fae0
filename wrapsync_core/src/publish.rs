//! Bounded-retry upload of a wrapper tree

use crate::error::{Error, Result, StoreError, ValidationError};
use crate::retry::{RetryOutcome, RetryPolicy, with_retries};
use crate::store::ContentStore;
use crate::types::{AddedEntry, FileEntry};
use log::debug;

/// Upload `files` as one wrapped directory and return its identifier
///
/// The whole upload is retried on any store failure, including a store
/// listing that names no root object. Invalid file sets are rejected before
/// the first attempt.
pub async fn publish_tree(
    files: &[FileEntry],
    store: &dyn ContentStore,
    policy: &RetryPolicy,
) -> Result<RetryOutcome<String>> {
    validate_file_set(files)?;
    policy.validate()?;

    debug!(
        "Publishing {} files (max {} attempts)",
        files.len(),
        policy.max_attempts
    );
    let outcome = with_retries(policy, "publish", move |_| async move {
        let added = store.put_directory(files).await?;
        match root_identifier(&added) {
            Some(cid) => Ok(cid),
            None => Err(Error::from(StoreError::malformed(format!(
                "upload listing of {} entries has no root directory",
                added.len()
            )))),
        }
    })
    .await;

    if let Some(cid) = &outcome.result {
        debug!("Published as {cid} after {} retries", outcome.retries);
    }
    Ok(outcome)
}

/// Pick the identifier of the wrapping directory from an upload listing
///
/// The wrapping directory is the entry with an empty path. Stores that omit
/// the empty path are handled by taking the last top-level entry, which is
/// where the wrapping directory is reported.
pub fn root_identifier(added: &[AddedEntry]) -> Option<String> {
    added
        .iter()
        .find(|entry| entry.path.is_empty())
        .or_else(|| added.iter().rev().find(|entry| !entry.path.contains('/')))
        .map(|entry| entry.cid.clone())
}

fn validate_file_set(files: &[FileEntry]) -> Result<()> {
    if files.is_empty() {
        return Err(ValidationError::EmptyFileSet.into());
    }

    for file in files {
        let path = file.path();
        if path.is_empty() {
            return Err(ValidationError::unsafe_path(path, "path is empty").into());
        }
        if path.starts_with('/') || path.starts_with('\\') {
            return Err(
                ValidationError::unsafe_path(path, "path starts with a separator").into(),
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Answers every upload with a fixed listing after a number of failures
    struct ScriptedStore {
        failures: u32,
        listing: Vec<AddedEntry>,
        calls: AtomicU32,
    }

    impl ScriptedStore {
        fn new(failures: u32, listing: Vec<AddedEntry>) -> Self {
            Self {
                failures,
                listing,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl ContentStore for ScriptedStore {
        async fn get_tree(&self, _cid: &str) -> Result<Vec<FileEntry>> {
            unreachable!("publish never fetches")
        }

        async fn put_directory(&self, _files: &[FileEntry]) -> Result<Vec<AddedEntry>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                return Err(StoreError::http(503, "busy").into());
            }
            Ok(self.listing.clone())
        }
    }

    fn wrapper_listing() -> Vec<AddedEntry> {
        vec![
            AddedEntry::new("wrap.info", "QmInfo"),
            AddedEntry::new("src/schema.graphql", "QmSchema"),
            AddedEntry::new("src", "QmSrc"),
            AddedEntry::new("", "QmWrapper"),
        ]
    }

    fn files() -> Vec<FileEntry> {
        vec![
            FileEntry::new("wrap.info", "info"),
            FileEntry::new("src/schema.graphql", "type Query"),
        ]
    }

    #[test]
    fn test_root_identifier_prefers_empty_path() {
        assert_eq!(
            root_identifier(&wrapper_listing()),
            Some("QmWrapper".to_string())
        );
    }

    #[test]
    fn test_root_identifier_falls_back_to_last_top_level_entry() {
        let listing = vec![
            AddedEntry::new("wrap.info", "QmInfo"),
            AddedEntry::new("src/schema.graphql", "QmSchema"),
            AddedEntry::new("wrapper", "QmWrapper"),
        ];
        assert_eq!(root_identifier(&listing), Some("QmWrapper".to_string()));
        assert_eq!(root_identifier(&[AddedEntry::new("a/b", "QmB")]), None);
    }

    #[tokio::test]
    async fn test_publish_returns_root_identifier() {
        let store = ScriptedStore::new(0, wrapper_listing());
        let outcome = publish_tree(&files(), &store, &RetryPolicy::default())
            .await
            .unwrap();

        assert_eq!(outcome.result.as_deref(), Some("QmWrapper"));
        assert_eq!(outcome.retries, 0);
    }

    #[tokio::test]
    async fn test_publish_gives_up_after_five_failures() {
        let store = ScriptedStore::new(u32::MAX, wrapper_listing());
        let outcome = publish_tree(&files(), &store, &RetryPolicy::default())
            .await
            .unwrap();

        assert!(outcome.is_exhausted());
        assert_eq!(outcome.retries, 5);
        assert_eq!(store.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_publish_succeeds_on_fifth_attempt() {
        let store = ScriptedStore::new(4, wrapper_listing());
        let outcome = publish_tree(&files(), &store, &RetryPolicy::default())
            .await
            .unwrap();

        assert_eq!(outcome.result.as_deref(), Some("QmWrapper"));
        assert_eq!(outcome.retries, 4);
    }

    #[tokio::test]
    async fn test_listing_without_root_counts_as_failure() {
        let store = ScriptedStore::new(0, vec![AddedEntry::new("src/a", "QmA")]);
        let outcome = publish_tree(&files(), &store, &RetryPolicy::new(2))
            .await
            .unwrap();

        assert!(outcome.is_exhausted());
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalid_file_sets_are_not_attempted() {
        let store = ScriptedStore::new(0, wrapper_listing());

        let err = publish_tree(&[], &store, &RetryPolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::EmptyFileSet)));

        let absolute = vec![FileEntry::new("/etc/passwd", "root")];
        let err = publish_tree(&absolute, &store, &RetryPolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::UnsafePath { .. })
        ));

        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }
}
