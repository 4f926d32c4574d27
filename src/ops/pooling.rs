//! Adaptive average pooling

use crate::error::LiteCnnResult;
use crate::shape_error;
use crate::tensor::Tensor;

/// Half-open input interval `[start, end)` covered by output cell `index`
///
/// `start = floor(index·input / output)`, `end = floor((index+1)·input / output)`.
#[inline]
pub fn pool_window(index: usize, input: usize, output: usize) -> (usize, usize) {
    (index * input / output, (index + 1) * input / output)
}

/// Average-pool each `(n, c)` plane down to `output_h × output_w`
///
/// Allocates a new tensor; `input` is left untouched. An output extent of zero
/// or one larger than the input extent is rejected, since it would leave
/// cells with nothing to average.
pub fn adaptive_avg_pool2d(
    input: &Tensor,
    output_h: usize,
    output_w: usize,
) -> LiteCnnResult<Tensor> {
    let (batch, channels, h, w) = input.dims4()?;
    if output_h == 0 || output_w == 0 {
        return Err(shape_error!(
            "adaptive_avg_pool2d: output size {}x{} must be non-zero",
            output_h,
            output_w
        ));
    }
    if output_h > h || output_w > w {
        return Err(shape_error!(
            "adaptive_avg_pool2d: output size {}x{} exceeds input extent {}x{}",
            output_h,
            output_w,
            h,
            w
        ));
    }

    let mut output = Tensor::try_zeros(&[batch, channels, output_h, output_w])?;
    let x = input.data();
    let in_plane = h * w;
    let out_plane = output_h * output_w;

    for (plane_idx, out) in output.data_mut().chunks_mut(out_plane).enumerate() {
        let src = &x[plane_idx * in_plane..(plane_idx + 1) * in_plane];
        for oh in 0..output_h {
            let (h_start, h_end) = pool_window(oh, h, output_h);
            for ow in 0..output_w {
                let (w_start, w_end) = pool_window(ow, w, output_w);
                let mut sum = 0.0f32;
                for row in h_start..h_end {
                    for v in &src[row * w + w_start..row * w + w_end] {
                        sum += *v;
                    }
                }
                let count = (h_end - h_start) * (w_end - w_start);
                out[oh * output_w + ow] = sum / count as f32;
            }
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_pool_is_channel_mean() {
        let input =
            Tensor::from_vec(&[1, 2, 2, 2], vec![1.0, 2.0, 3.0, 4.0, -1.0, -1.0, 1.0, 5.0])
                .unwrap();
        let out = adaptive_avg_pool2d(&input, 1, 1).unwrap();
        assert_eq!(out.shape(), &[1, 2, 1, 1]);
        assert_eq!(out.data(), &[2.5, 1.0]);
    }

    #[test]
    fn test_uneven_windows() {
        // 3 -> 2 gives windows [0,1) and [1,3)
        assert_eq!(pool_window(0, 3, 2), (0, 1));
        assert_eq!(pool_window(1, 3, 2), (1, 3));

        let input = Tensor::from_vec(&[1, 1, 1, 3], vec![3.0, 4.0, 8.0]).unwrap();
        let out = adaptive_avg_pool2d(&input, 1, 2).unwrap();
        assert_eq!(out.data(), &[3.0, 6.0]);
    }

    #[test]
    fn test_identity_when_sizes_match() {
        let data: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let input = Tensor::from_vec(&[1, 3, 2, 2], data.clone()).unwrap();
        let out = adaptive_avg_pool2d(&input, 2, 2).unwrap();
        assert_eq!(out.data(), data.as_slice());
    }

    #[test]
    fn test_rejects_degenerate_output() {
        let input = Tensor::zeros(&[1, 1, 2, 2]);
        assert!(adaptive_avg_pool2d(&input, 0, 1).is_err());
        assert!(adaptive_avg_pool2d(&input, 3, 1).is_err());
        let empty = Tensor::zeros(&[1, 1, 0, 0]);
        assert!(adaptive_avg_pool2d(&empty, 1, 1).is_err());
    }
}
