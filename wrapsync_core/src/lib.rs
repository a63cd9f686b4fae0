//! wrapsync core library
//!
//! Retrying fetch and publish of content-addressed wrapper trees, plus the
//! local file tree plumbing around them.

pub mod error;
pub mod fetch;
pub mod gateway;
pub mod local_tree;
pub mod publish;
pub mod retry;
pub mod store;
pub mod types;

// Re-export main types
pub use error::{Error, Result};
pub use fetch::fetch_tree;
pub use gateway::{GatewayClient, PinIndex};
pub use local_tree::{WriteSummary, aggregate, list_wrapper_dirs, write_tree};
pub use publish::{publish_tree, root_identifier};
pub use retry::{RetryOutcome, RetryPolicy};
pub use store::{ContentStore, KuboStore};
pub use types::{AddedEntry, FileEntry, WrapperPin};

/// Gateway used when none is configured
pub const DEFAULT_GATEWAY_URL: &str = "https://ipfs.wrappers.io";

/// Network client configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ClientConfig {
    /// Gateway serving the `/pins` listing
    pub gateway_url: String,
    /// Kubo RPC endpoint; the gateway URL when unset
    pub store_url: Option<String>,
    /// Timeout for a single HTTP request
    pub request_timeout_seconds: u64,
    /// CID version requested for uploads; the store default when unset
    pub cid_version: Option<u8>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            store_url: None,
            request_timeout_seconds: 120,
            cid_version: None,
        }
    }
}

impl ClientConfig {
    /// Base URL of the content store
    pub fn store_url(&self) -> &str {
        self.store_url.as_deref().unwrap_or(&self.gateway_url)
    }
}
