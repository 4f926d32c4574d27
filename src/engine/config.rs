//! Configuration for the inference engine
//!
//! [`EngineConfig`] controls request defaults (how many predictions to
//! return, input resolution) and the numeric settings of the network.

use crate::error::{LiteCnnError, LiteCnnResult};
use crate::model::NetworkConfig;
use crate::ops::DEFAULT_BN_EPS;
use crate::preprocess::DEFAULT_IMAGE_SIZE;
use crate::response::DEFAULT_TOP_K;

/// Name reported by `/health` when none is configured
pub const DEFAULT_MODEL_NAME: &str = "litecnn";

/// Forward passes run on a blank image before serving
pub const DEFAULT_WARMUP_ITERATIONS: usize = 1;

/// Configuration for the inference engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Predictions returned when a request does not specify `top_k`
    pub top_k: usize,

    /// Side length images are resized to before inference
    pub image_size: usize,

    /// Epsilon added to batch-norm running variances
    pub bn_eps: f32,

    /// Block topology of the network
    pub network: NetworkConfig,

    /// Name reported in health checks
    pub model_name: String,

    /// Warm-up forward passes run by [`InferenceEngine::warm_up`](super::InferenceEngine::warm_up)
    pub warmup_iterations: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            top_k: DEFAULT_TOP_K,
            image_size: DEFAULT_IMAGE_SIZE,
            bn_eps: DEFAULT_BN_EPS,
            network: NetworkConfig::default(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            warmup_iterations: DEFAULT_WARMUP_ITERATIONS,
        }
    }
}

impl EngineConfig {
    /// Create a new engine config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set default number of predictions
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set input resolution
    pub fn with_image_size(mut self, image_size: usize) -> Self {
        self.image_size = image_size;
        self
    }

    /// Set batch-norm epsilon
    pub fn with_bn_eps(mut self, bn_eps: f32) -> Self {
        self.bn_eps = bn_eps;
        self
    }

    /// Set network topology
    pub fn with_network(mut self, network: NetworkConfig) -> Self {
        self.network = network;
        self
    }

    /// Set the name reported in health checks
    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    /// Set the number of warm-up passes (0 disables warm-up)
    pub fn with_warmup_iterations(mut self, iterations: usize) -> Self {
        self.warmup_iterations = iterations;
        self
    }

    pub fn validate(&self) -> LiteCnnResult<()> {
        if self.top_k == 0 {
            return Err(LiteCnnError::InvalidTopK(self.top_k));
        }
        if self.image_size == 0 {
            return Err(LiteCnnError::InvalidConfiguration(
                "image_size must be > 0".to_string(),
            ));
        }
        if !(self.bn_eps.is_finite() && self.bn_eps >= 0.0) {
            return Err(LiteCnnError::InvalidConfiguration(format!(
                "bn_eps must be finite and non-negative, got {}",
                self.bn_eps
            )));
        }
        if self.model_name.trim().is_empty() {
            return Err(LiteCnnError::InvalidConfiguration(
                "model_name must not be empty".to_string(),
            ));
        }
        self.network.validate()
    }
}
