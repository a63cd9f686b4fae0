//! Publish command orchestrator
//!
//! Every subdirectory of the target is named after the identifier it is
//! expected to publish as. Publishing re-uploads it and checks that the store
//! agrees.

use crate::error::{CliError, CliResult, ErrorContext};
use colored::*;
use log::debug;
use std::path::PathBuf;
use std::sync::Arc;
use wrapsync_core::{ContentStore, RetryPolicy, aggregate, list_wrapper_dirs, publish_tree};

/// Publish command options
#[derive(Debug, Clone)]
pub struct PublishOptions {
    /// Directory holding one subdirectory per wrapper
    pub target: PathBuf,
    pub retry: RetryPolicy,
}

/// Outcome of a publish batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishReport {
    /// Identifiers confirmed by the store, in publish order
    pub published: Vec<String>,
    pub total_retries: u64,
}

/// Orchestrator for the publish command
pub struct PublishOrchestrator {
    store: Arc<dyn ContentStore>,
    options: PublishOptions,
}

impl PublishOrchestrator {
    pub fn new(store: Arc<dyn ContentStore>, options: PublishOptions) -> Self {
        debug!("Creating publish orchestrator with options: {options:?}");
        Self { store, options }
    }

    /// Publish every wrapper directory, stopping at the first failure or
    /// identifier mismatch
    pub async fn run(&self) -> CliResult<PublishReport> {
        let wrappers = list_wrapper_dirs(&self.options.target).map_err(|e| {
            CliError::from(e).with_context("target", &self.options.target.display().to_string())
        })?;

        if wrappers.is_empty() {
            println!("{}", "No wrapper directories found".yellow());
            return Ok(PublishReport::default());
        }
        println!(
            "{}",
            format!("Publishing {} wrapper(s)...", wrappers.len())
                .cyan()
                .bold()
        );

        let mut report = PublishReport::default();

        for (expected, path) in wrappers {
            let files = tokio::task::spawn_blocking(move || aggregate(&path))
                .await
                .map_err(|e| CliError::general(&format!("Directory walk panicked: {e}")))?
                .map_err(|e| CliError::from(e).with_context("wrapper", &expected))?;
            debug!("{expected}: {} files aggregated", files.len());

            let outcome = publish_tree(&files, self.store.as_ref(), &self.options.retry)
                .await
                .map_err(|e| CliError::from(e).with_context("wrapper", &expected))?;
            report.total_retries += u64::from(outcome.retries);

            let Some(actual) = outcome.result else {
                return Err(CliError::network(&format!(
                    "Failed to publish after {} attempts",
                    self.options.retry.max_attempts
                ))
                .with_context("wrapper", &expected));
            };

            if actual != expected {
                return Err(CliError::integrity(
                    "Published identifier does not match the directory name",
                )
                .with_context("expected", &expected)
                .with_context("actual", &actual)
                .with_suggestion("Check the directory contents against the original wrapper"));
            }

            println!("{} {}", "✓".green(), actual);
            report.published.push(actual);
        }

        println!(
            "{}",
            format!("Published {} wrapper(s)", report.published.len()).green()
        );
        Ok(report)
    }
}
