//! Content-addressed store abstraction
//!
//! The fetch and publish flows only need two capabilities from the store:
//! retrieve a whole tree by identifier, and upload a set of files as one
//! wrapped directory.

pub mod kubo;

pub use kubo::KuboStore;

use crate::error::Result;
use crate::types::{AddedEntry, FileEntry};

/// Content-addressed storage backend
#[async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    /// Retrieve every entry below `cid`, with paths relative to `cid`
    ///
    /// Directories are reported as entries with empty content.
    async fn get_tree(&self, cid: &str) -> Result<Vec<FileEntry>>;

    /// Upload `files` as a single directory, returning every object created
    ///
    /// The wrapping directory is reported with an empty path.
    async fn put_directory(&self, files: &[FileEntry]) -> Result<Vec<AddedEntry>>;
}
