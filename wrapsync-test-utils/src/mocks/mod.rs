//! Mock implementations for testing

mod index;
mod store;

pub use index::MockPinIndex;
pub use store::MockStore;
