//! Inference engine for LiteCNN
//!
//! ## Module Structure
//!
//! - [`config`] - Engine configuration and builders
//! - [`inference`] - Main InferenceEngine implementation
//! - [`stats`] - Timings, results and health reporting

pub mod config;
pub mod inference;
pub mod stats;

pub use config::EngineConfig;
pub use inference::InferenceEngine;
pub use stats::{Classification, HealthStatus, InferenceTimings};
