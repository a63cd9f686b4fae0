//! In-memory content store for testing

use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use wrapsync_core::error::StoreError;
use wrapsync_core::{AddedEntry, ContentStore, FileEntry, Result};

/// In-memory [`ContentStore`] with deterministic identifiers
///
/// Uploaded trees become fetchable under the identifier the upload reports.
/// Failures can be scripted separately for fetches and uploads, and every
/// attempt is counted.
///
/// # Examples
///
/// ```rust,no_run
/// use wrapsync_test_utils::MockStore;
/// use wrapsync_core::{FileEntry, RetryPolicy, fetch_tree};
///
/// # async fn example() {
/// let store = MockStore::new().with_tree("bafy123", vec![FileEntry::new("a.txt", "hello")]);
/// store.fail_fetches(2);
///
/// let outcome = fetch_tree("bafy123", &store, &RetryPolicy::default()).await.unwrap();
/// assert_eq!(outcome.retries, 2);
/// # }
/// ```
pub struct MockStore {
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    trees: HashMap<String, Vec<FileEntry>>,
    fetch_failures: FailureMode,
    publish_failures: FailureMode,
    publish_as: Option<String>,
    fetch_attempts: u32,
    publish_attempts: u32,
}

#[derive(Debug, Clone, Copy, Default)]
enum FailureMode {
    #[default]
    Never,
    Times(u32),
    Always,
}

impl FailureMode {
    /// Consume one scripted failure, returning whether this attempt fails
    fn take(&mut self) -> bool {
        match self {
            Self::Never => false,
            Self::Always => true,
            Self::Times(0) => {
                *self = Self::Never;
                false
            }
            Self::Times(n) => {
                *n -= 1;
                true
            }
        }
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    /// Create an empty store that never fails
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Serve `files` under `cid`
    pub fn with_tree(self, cid: &str, files: Vec<FileEntry>) -> Self {
        self.insert_tree(cid, files);
        self
    }

    pub fn insert_tree(&self, cid: &str, files: Vec<FileEntry>) {
        self.state.lock().unwrap().trees.insert(cid.to_string(), files);
    }

    /// Fail the next `times` fetch attempts
    pub fn fail_fetches(&self, times: u32) {
        self.state.lock().unwrap().fetch_failures = FailureMode::Times(times);
    }

    pub fn always_fail_fetches(&self) {
        self.state.lock().unwrap().fetch_failures = FailureMode::Always;
    }

    /// Fail the next `times` upload attempts
    pub fn fail_publishes(&self, times: u32) {
        self.state.lock().unwrap().publish_failures = FailureMode::Times(times);
    }

    pub fn always_fail_publishes(&self) {
        self.state.lock().unwrap().publish_failures = FailureMode::Always;
    }

    /// Report `cid` as the wrapping directory of every upload
    pub fn publish_as(&self, cid: &str) {
        self.state.lock().unwrap().publish_as = Some(cid.to_string());
    }

    pub fn fetch_attempts(&self) -> u32 {
        self.state.lock().unwrap().fetch_attempts
    }

    pub fn publish_attempts(&self) -> u32 {
        self.state.lock().unwrap().publish_attempts
    }

    /// Deterministic identifier of a file set, independent of input order
    pub fn content_id(files: &[FileEntry]) -> String {
        let mut sorted: Vec<&FileEntry> = files.iter().collect();
        sorted.sort_by(|a, b| a.path().cmp(b.path()));

        let mut hasher = Sha256::new();
        for file in sorted {
            hasher.update(file.path().as_bytes());
            hasher.update([0u8]);
            hasher.update((file.content().len() as u64).to_le_bytes());
            hasher.update(file.content());
        }
        format!("bafy{}", hex::encode(hasher.finalize()))
    }

    fn blob_id(content: &[u8]) -> String {
        format!("bafk{}", hex::encode(Sha256::digest(content)))
    }
}

/// Every intermediate directory of `files`, parents before children
fn directories_of(files: &[FileEntry]) -> BTreeSet<String> {
    let mut dirs = BTreeSet::new();
    for file in files {
        let mut prefix = String::new();
        let segments: Vec<&str> = file.path().split('/').collect();
        for segment in &segments[..segments.len().saturating_sub(1)] {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);
            dirs.insert(prefix.clone());
        }
    }
    dirs
}

#[async_trait::async_trait]
impl ContentStore for MockStore {
    async fn get_tree(&self, cid: &str) -> Result<Vec<FileEntry>> {
        let mut state = self.state.lock().unwrap();
        state.fetch_attempts += 1;

        if state.fetch_failures.take() {
            return Err(StoreError::unavailable("mock store: scripted fetch failure").into());
        }

        state
            .trees
            .get(cid)
            .cloned()
            .ok_or_else(|| StoreError::http(500, format!("mock store: unknown cid {cid}")).into())
    }

    async fn put_directory(&self, files: &[FileEntry]) -> Result<Vec<AddedEntry>> {
        let mut state = self.state.lock().unwrap();
        state.publish_attempts += 1;

        if state.publish_failures.take() {
            return Err(StoreError::unavailable("mock store: scripted upload failure").into());
        }

        let dirs = directories_of(files);
        let root = state
            .publish_as
            .clone()
            .unwrap_or_else(|| Self::content_id(files));

        let mut added: Vec<AddedEntry> = files
            .iter()
            .map(|f| AddedEntry::new(f.path(), Self::blob_id(f.content())))
            .collect();
        for dir in dirs.iter().rev() {
            let children: Vec<FileEntry> = files
                .iter()
                .filter(|f| f.path().starts_with(&format!("{dir}/")))
                .cloned()
                .collect();
            added.push(AddedEntry::new(dir.as_str(), Self::content_id(&children)));
        }
        added.push(AddedEntry::new("", root.as_str()));

        let mut tree: Vec<FileEntry> = dirs
            .into_iter()
            .map(|dir| FileEntry::new(dir, Vec::new()))
            .collect();
        tree.extend(files.iter().cloned());
        state.trees.insert(root, tree);

        Ok(added)
    }
}
