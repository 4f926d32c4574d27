//! CPU operator kernels
//!
//! Pure functions over [`Tensor`](crate::tensor::Tensor). Preconditions are
//! checked up front and reported as shape errors before any arithmetic.

pub mod activation;
pub mod batch_norm;
pub mod broadcast;
pub mod conv;
pub mod linear;
pub mod pooling;

pub use activation::{relu6, relu6_inplace, sigmoid, sigmoid_inplace};
pub use batch_norm::{batch_norm2d, BatchNormParams, DEFAULT_BN_EPS};
pub use broadcast::scale_channels;
pub use conv::{conv2d, conv_output_size, Conv2dParams};
pub use linear::linear;
pub use pooling::adaptive_avg_pool2d;
