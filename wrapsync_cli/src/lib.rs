//! wrapsync command line library
//!
//! Configuration, error reporting and the download/publish orchestrators
//! behind the `wrapsync` binary.

pub mod config;
pub mod error;
pub mod orchestrators;
