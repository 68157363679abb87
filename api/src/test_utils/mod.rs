//! Test utilities
//!
//! In-memory implementations of every port plus fixtures. The application
//! state holds trait objects, so router tests run against these as well.

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
