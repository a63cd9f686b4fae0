//! Test data builders for creating test scenarios

mod wrapper_tree;

pub use wrapper_tree::WrapperTreeBuilder;
