//! Common test utilities
//!
//! - `fixtures`: a tiny LiteCNN with the full seven-block topology and
//!   deterministic weights, plus image helpers
//! - `tempfile_helpers`: temp files with consistent error context

#![allow(dead_code)]

mod fixtures;
mod tempfile_helpers;

pub use fixtures::*;
pub use serial_test::serial;
pub use tempfile_helpers::*;
