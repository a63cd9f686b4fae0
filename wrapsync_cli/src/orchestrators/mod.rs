//! Command orchestrators for business logic
//!
//! This module provides orchestrators that coordinate between the CLI layer
//! and the core library services.

pub mod download_orchestrator;
pub mod publish_orchestrator;

pub use download_orchestrator::{DownloadOptions, DownloadOrchestrator, DownloadReport};
pub use publish_orchestrator::{PublishOptions, PublishOrchestrator, PublishReport};
