//! Inference-mode batch normalization

use crate::error::LiteCnnResult;
use crate::shape_error;
use crate::tensor::Tensor;

/// Default epsilon added to the running variance
pub const DEFAULT_BN_EPS: f32 = 1e-5;

/// Per-channel parameters of a batch-norm layer
#[derive(Debug, Clone, Copy)]
pub struct BatchNormParams<'a> {
    pub gamma: &'a Tensor,
    pub beta: &'a Tensor,
    pub running_mean: &'a Tensor,
    pub running_var: &'a Tensor,
    pub eps: f32,
}

impl<'a> BatchNormParams<'a> {
    pub fn new(
        gamma: &'a Tensor,
        beta: &'a Tensor,
        running_mean: &'a Tensor,
        running_var: &'a Tensor,
    ) -> Self {
        BatchNormParams {
            gamma,
            beta,
            running_mean,
            running_var,
            eps: DEFAULT_BN_EPS,
        }
    }

    pub fn with_eps(mut self, eps: f32) -> Self {
        self.eps = eps;
        self
    }

    fn check_channels(&self, channels: usize) -> LiteCnnResult<()> {
        let named = [
            ("weight", self.gamma),
            ("bias", self.beta),
            ("running_mean", self.running_mean),
            ("running_var", self.running_var),
        ];
        for (name, tensor) in named {
            if tensor.element_count() != channels {
                return Err(shape_error!(
                    "batch_norm2d: {} has {} elements, input has {} channels",
                    name,
                    tensor.element_count(),
                    channels
                ));
            }
        }
        Ok(())
    }
}

/// `out = gamma / sqrt(var + eps) * (x - mean) + beta`, per channel
///
/// Consumes `input` and returns it normalized in place.
pub fn batch_norm2d(mut input: Tensor, params: &BatchNormParams<'_>) -> LiteCnnResult<Tensor> {
    let (_, channels, h, w) = input.dims4()?;
    params.check_channels(channels)?;

    let plane = h * w;
    if plane == 0 {
        return Ok(input);
    }

    let gamma = params.gamma.data();
    let beta = params.beta.data();
    let mean = params.running_mean.data();
    let var = params.running_var.data();

    for (plane_idx, values) in input.data_mut().chunks_mut(plane).enumerate() {
        let c = plane_idx % channels;
        let scale = gamma[c] / (var[c] + params.eps).sqrt();
        let (m, b) = (mean[c], beta[c]);
        for v in values.iter_mut() {
            *v = scale * (*v - m) + b;
        }
    }

    Ok(input)
}
