//! 2-D convolution with stride, zero padding and channel groups
//!
//! Layouts: input `[N, C_in, H, W]`, weight `[C_out, C_in / groups, kH, kW]`,
//! output `[N, C_out, H_out, W_out]`. No bias term.
//!
//! Output planes `(n, oc)` are independent, so they are computed in parallel
//! with rayon. Each plane accumulates in the same `(ic, kh, kw)` order as a
//! sequential loop, so the result does not depend on the thread count.

use rayon::prelude::*;

use crate::error::LiteCnnResult;
use crate::shape_error;
use crate::tensor::Tensor;

/// Convolution hyper-parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conv2dParams {
    pub stride: usize,
    pub padding: usize,
    pub groups: usize,
}

impl Conv2dParams {
    pub fn new(stride: usize, padding: usize, groups: usize) -> Self {
        Conv2dParams {
            stride,
            padding,
            groups,
        }
    }

    /// Depthwise convolution: one group per input channel
    pub fn depthwise(channels: usize, stride: usize, padding: usize) -> Self {
        Self::new(stride, padding, channels)
    }

    /// 1×1 pointwise convolution
    pub fn pointwise() -> Self {
        Self::new(1, 0, 1)
    }
}

impl Default for Conv2dParams {
    fn default() -> Self {
        Self::new(1, 0, 1)
    }
}

/// Output extent along one spatial axis: `(input + 2·padding − kernel) / stride + 1`
pub fn conv_output_size(
    input: usize,
    kernel: usize,
    stride: usize,
    padding: usize,
) -> LiteCnnResult<usize> {
    if stride == 0 {
        return Err(shape_error!("conv2d: stride must be > 0"));
    }
    if kernel == 0 {
        return Err(shape_error!("conv2d: kernel size must be > 0"));
    }
    let padded = input + 2 * padding;
    if kernel > padded {
        return Err(shape_error!(
            "conv2d: kernel {} larger than padded input {} (input {}, padding {})",
            kernel,
            padded,
            input,
            padding
        ));
    }
    Ok((padded - kernel) / stride + 1)
}

/// Grouped 2-D convolution
///
/// Output channel `oc` belongs to group `oc / (C_out / groups)` and reads only
/// the input channels of that group. Taps that fall in the padding read zero.
pub fn conv2d(input: &Tensor, weight: &Tensor, params: Conv2dParams) -> LiteCnnResult<Tensor> {
    let (batch, c_in, h_in, w_in) = input.dims4()?;
    let (c_out, c_in_per_group, kh, kw) = weight.dims4()?;
    let Conv2dParams {
        stride,
        padding,
        groups,
    } = params;

    if groups == 0 {
        return Err(shape_error!("conv2d: groups must be > 0"));
    }
    if c_in % groups != 0 || c_out % groups != 0 {
        return Err(shape_error!(
            "conv2d: groups {} must divide input channels {} and output channels {}",
            groups,
            c_in,
            c_out
        ));
    }
    if c_in_per_group != c_in / groups {
        return Err(shape_error!(
            "conv2d: weight {:?} expects {} input channels per group, input {:?} with groups {} has {}",
            weight.shape(),
            c_in_per_group,
            input.shape(),
            groups,
            c_in / groups
        ));
    }

    let h_out = conv_output_size(h_in, kh, stride, padding)?;
    let w_out = conv_output_size(w_in, kw, stride, padding)?;
    let c_out_per_group = c_out / groups;

    let mut output = Tensor::try_zeros(&[batch, c_out, h_out, w_out])?;
    let plane = h_out * w_out;
    let x = input.data();
    let wt = weight.data();
    let pad = padding as isize;

    output
        .data_mut()
        .par_chunks_mut(plane)
        .enumerate()
        .for_each(|(plane_idx, out_plane)| {
            let n = plane_idx / c_out;
            let oc = plane_idx % c_out;
            let group = oc / c_out_per_group;

            for oh in 0..h_out {
                for ow in 0..w_out {
                    let mut sum = 0.0f32;
                    for ic in 0..c_in_per_group {
                        let in_ch = group * c_in_per_group + ic;
                        let in_base = (n * c_in + in_ch) * h_in * w_in;
                        let w_base = (oc * c_in_per_group + ic) * kh * kw;

                        for ky in 0..kh {
                            let ih = (oh * stride + ky) as isize - pad;
                            if ih < 0 || ih >= h_in as isize {
                                continue;
                            }
                            let row = in_base + ih as usize * w_in;
                            for kx in 0..kw {
                                let iw = (ow * stride + kx) as isize - pad;
                                if iw < 0 || iw >= w_in as isize {
                                    continue;
                                }
                                sum += x[row + iw as usize] * wt[w_base + ky * kw + kx];
                            }
                        }
                    }
                    out_plane[oh * w_out + ow] = sum;
                }
            }
        });

    Ok(output)
}
