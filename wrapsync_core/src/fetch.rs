//! Bounded-retry retrieval of a wrapper tree

use crate::error::{Result, ValidationError};
use crate::retry::{RetryOutcome, RetryPolicy, with_retries};
use crate::store::ContentStore;
use crate::types::FileEntry;
use log::debug;

/// Retrieve the whole tree below `cid`, retrying the full retrieval on failure
///
/// Returns `Err` only for inputs rejected up front (empty identifier, invalid
/// policy). Store failures are absorbed by the retry loop; an exhausted budget
/// is reported as an outcome with no result.
pub async fn fetch_tree(
    cid: &str,
    store: &dyn ContentStore,
    policy: &RetryPolicy,
) -> Result<RetryOutcome<Vec<FileEntry>>> {
    if cid.trim().is_empty() {
        return Err(ValidationError::invalid_identifier(cid, "identifier is empty").into());
    }
    policy.validate()?;

    debug!("Fetching {cid} (max {} attempts)", policy.max_attempts);
    let outcome = with_retries(policy, &format!("fetch {cid}"), move |_| {
        store.get_tree(cid)
    })
    .await;

    if let Some(files) = &outcome.result {
        debug!(
            "Fetched {cid}: {} entries, {} retries",
            files.len(),
            outcome.retries
        );
    }
    Ok(outcome)
}
