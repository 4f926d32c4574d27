//! Request timings and health reporting

use std::time::Duration;

use serde::Serialize;

use crate::response::Prediction;

/// Wall-clock phases of one classification, in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct InferenceTimings {
    pub preprocess_ms: f64,
    pub inference_ms: f64,
    pub total_ms: f64,
}

impl InferenceTimings {
    pub fn new(preprocess: Duration, inference: Duration, total: Duration) -> Self {
        InferenceTimings {
            preprocess_ms: millis(preprocess),
            inference_ms: millis(inference),
            total_ms: millis(total),
        }
    }
}

/// Milliseconds rounded to microsecond precision
fn millis(d: Duration) -> f64 {
    (d.as_secs_f64() * 1_000_000.0).round() / 1000.0
}

/// Ranked predictions plus how long they took
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub predictions: Vec<Prediction>,
    pub timings: InferenceTimings,
}

/// Health information for monitoring endpoints
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthStatus {
    /// Always `"ok"` while the process can answer
    pub status: String,

    /// Whether a network is loaded and validated
    pub model_loaded: bool,

    /// Output classes of the loaded network (0 when none)
    pub num_classes: usize,

    /// Configured model name, absent when no model is loaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl HealthStatus {
    pub fn unloaded() -> Self {
        HealthStatus {
            status: "ok".to_string(),
            model_loaded: false,
            num_classes: 0,
            model: None,
        }
    }
}
