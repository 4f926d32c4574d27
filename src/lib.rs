//! LiteCNN - CPU inference for a lightweight image classifier
//!
//! Loads the binary LCNN weight format, resolves it into an execution plan
//! and runs the depthwise-separable network with squeeze-excitation on the
//! CPU. An HTTP server and a CLI wrap the engine.

#![allow(clippy::too_many_arguments)] // Convolution kernels take many dimensions
#![allow(clippy::needless_range_loop)] // Index loops mirror the NCHW math
#![allow(clippy::manual_slice_size_calculation)]

pub mod engine;
pub mod error;
pub mod http;
pub mod loader;
pub mod logging;
pub mod model;
pub mod ops;
pub mod preprocess;
pub mod response;
pub mod tensor;

pub use engine::{Classification, EngineConfig, InferenceEngine};
pub use error::{ErrorCategory, LiteCnnError, LiteCnnResult};
pub use loader::{load_weights, load_weights_from_path, WeightStore};
pub use model::{forward, LiteCnn, NetworkConfig};
pub use response::{rank_predictions, LabelMap, Prediction};
pub use tensor::Tensor;
