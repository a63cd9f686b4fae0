//! Test utilities for wrapsync
//!
//! This crate provides an in-memory content store, a scripted pin index and
//! builders for wrapper trees on disk.

pub mod builders;
pub mod mocks;

// Re-export commonly used types
pub use builders::WrapperTreeBuilder;
pub use mocks::{MockPinIndex, MockStore};
