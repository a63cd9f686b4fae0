//! Download command orchestrator
//!
//! Mirrors every pinned wrapper listed by the gateway into
//! `<target>/<cid>/`, one wrapper at a time.

use crate::config::FailurePolicy;
use crate::error::{CliError, CliResult, ErrorContext};
use colored::*;
use log::{debug, warn};
use std::path::PathBuf;
use std::sync::Arc;
use wrapsync_core::{ContentStore, PinIndex, RetryPolicy, WrapperPin, fetch_tree, write_tree};

/// Download command options
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Directory receiving one subdirectory per wrapper
    pub target: PathBuf,
    pub on_failure: FailurePolicy,
    pub retry: RetryPolicy,
}

/// Outcome of a download batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadReport {
    /// Wrappers attempted, fetched or not
    pub processed: usize,
    /// Failed attempts summed over every wrapper
    pub total_retries: u64,
    /// Files written to disk
    pub files_written: usize,
    /// Wrappers skipped because they could not be fetched or written
    pub failed: Vec<WrapperPin>,
}

impl DownloadReport {
    pub fn mean_retries(&self) -> f64 {
        if self.processed == 0 {
            0.0
        } else {
            self.total_retries as f64 / self.processed as f64
        }
    }

    /// `Retries per wrapper: 0.50(1/2)`
    pub fn retries_line(&self) -> String {
        format!(
            "Retries per wrapper: {:.2}({}/{})",
            self.mean_retries(),
            self.total_retries,
            self.processed
        )
    }
}

/// Orchestrator for the download command
pub struct DownloadOrchestrator {
    index: Arc<dyn PinIndex>,
    store: Arc<dyn ContentStore>,
    options: DownloadOptions,
}

impl DownloadOrchestrator {
    pub fn new(
        index: Arc<dyn PinIndex>,
        store: Arc<dyn ContentStore>,
        options: DownloadOptions,
    ) -> Self {
        debug!("Creating download orchestrator with options: {options:?}");
        Self {
            index,
            store,
            options,
        }
    }

    /// Fetch and write every listed wrapper
    ///
    /// Under [`FailurePolicy::Abort`] the first wrapper that cannot be fetched
    /// or written ends the batch. Under [`FailurePolicy::Skip`] it is recorded
    /// in [`DownloadReport::failed`] and the batch continues.
    pub async fn run(&self) -> CliResult<DownloadReport> {
        let pins = self.index.list_pins().await.map_err(|e| {
            CliError::from(e).with_context("operation", "list pinned wrappers")
        })?;
        println!("{}", self.start_line(pins.len()).cyan().bold());

        let mut report = DownloadReport::default();

        for pin in pins {
            println!("{} {}", pin.name.bold(), pin.cid.dimmed());
            report.processed += 1;

            match self.mirror(&pin).await {
                Ok(mirrored) => {
                    report.total_retries += u64::from(mirrored.retries);
                    report.files_written += mirrored.written;
                }
                Err(failure) => {
                    report.total_retries += u64::from(failure.retries);
                    match self.options.on_failure {
                        FailurePolicy::Abort => return Err(failure.error),
                        FailurePolicy::Skip => {
                            warn!("Skipping {} ({}): {}", pin.name, pin.cid, failure.error);
                            eprintln!("{}", format!("  skipped: {}", failure.error).yellow());
                            report.failed.push(pin);
                        }
                    }
                }
            }
        }

        println!("{}", report.retries_line());
        if !report.failed.is_empty() {
            eprintln!(
                "{}",
                format!("{} wrapper(s) could not be downloaded:", report.failed.len()).yellow()
            );
            for pin in &report.failed {
                eprintln!("  {} {}", pin.name, pin.cid);
            }
        }
        println!("{}", "Download complete".green());

        Ok(report)
    }

    fn start_line(&self, wrappers: usize) -> String {
        format!(
            "Downloading {wrappers} wrapper(s) into {}",
            self.options.target.display()
        )
    }

    /// Fetch one wrapper and write it below the target directory
    async fn mirror(&self, pin: &WrapperPin) -> Result<Mirrored, WrapperFailure> {
        let outcome = fetch_tree(&pin.cid, self.store.as_ref(), &self.options.retry)
            .await
            .map_err(|e| WrapperFailure::new(CliError::from(e), pin, 0))?;
        let retries = outcome.retries;

        let Some(files) = outcome.result else {
            let error = CliError::network(&format!(
                "Failed to fetch {} after {} attempts",
                pin.cid, self.options.retry.max_attempts
            ))
            .with_suggestion("Re-run with '--on-failure skip' to continue past it");
            return Err(WrapperFailure::new(error, pin, retries));
        };

        let summary = write_tree(&self.options.target, &pin.cid, &files)
            .await
            .map_err(|e| WrapperFailure::new(CliError::from(e), pin, retries))?;
        debug!(
            "{}: {} files written, {} empty entries skipped",
            pin.cid, summary.written, summary.skipped_empty
        );

        Ok(Mirrored {
            retries,
            written: summary.written,
        })
    }
}

struct Mirrored {
    retries: u32,
    written: usize,
}

/// A wrapper that could not be mirrored, with the retries it used up
struct WrapperFailure {
    error: CliError,
    retries: u32,
}

impl WrapperFailure {
    fn new(error: CliError, pin: &WrapperPin, retries: u32) -> Self {
        Self {
            error: error.with_context("wrapper", &pin.name),
            retries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wrapsync_test_utils::{MockPinIndex, MockStore};

    #[test]
    fn test_start_line_names_target() {
        let orchestrator = DownloadOrchestrator::new(
            Arc::new(MockPinIndex::new()),
            Arc::new(MockStore::new()),
            DownloadOptions {
                target: PathBuf::from("wrappers"),
                on_failure: FailurePolicy::Abort,
                retry: RetryPolicy::default(),
            },
        );
        assert_eq!(
            orchestrator.start_line(2),
            "Downloading 2 wrapper(s) into wrappers"
        );
    }

    #[test]
    fn test_retries_line_for_empty_batch() {
        let report = DownloadReport::default();
        assert_eq!(report.mean_retries(), 0.0);
        assert_eq!(report.retries_line(), "Retries per wrapper: 0.00(0/0)");
    }

    #[test]
    fn test_retries_line_mean() {
        let report = DownloadReport {
            processed: 3,
            total_retries: 2,
            ..Default::default()
        };
        assert_eq!(report.retries_line(), "Retries per wrapper: 0.67(2/3)");
    }
}
