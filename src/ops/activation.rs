//! Elementwise activations
//!
//! Both activations consume the tensor and return it with its buffer
//! rewritten in place.

use crate::tensor::Tensor;

/// Upper clip of ReLU6
pub const RELU6_CAP: f32 = 6.0;

/// Clip every element to `[0, 6]`; NaN stays NaN
pub fn relu6(mut input: Tensor) -> Tensor {
    relu6_inplace(input.data_mut());
    input
}

pub fn relu6_inplace(values: &mut [f32]) {
    for v in values.iter_mut() {
        *v = v.clamp(0.0, RELU6_CAP);
    }
}

/// Logistic function `1 / (1 + e^-x)`
pub fn sigmoid(mut input: Tensor) -> Tensor {
    sigmoid_inplace(input.data_mut());
    input
}

pub fn sigmoid_inplace(values: &mut [f32]) {
    for v in values.iter_mut() {
        *v = 1.0 / (1.0 + (-*v).exp());
    }
}
