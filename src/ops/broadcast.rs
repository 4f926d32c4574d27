//! Channel-wise broadcast multiply, the gating step of squeeze-excite

use crate::error::LiteCnnResult;
use crate::shape_error;
use crate::tensor::Tensor;

/// Multiply every spatial element of plane `(n, c)` by `scales[n, c]`
///
/// `scales` must be `[N, C]` or `[N, C, 1, 1]`. Consumes and returns
/// `features`.
pub fn scale_channels(mut features: Tensor, scales: &Tensor) -> LiteCnnResult<Tensor> {
    let (batch, channels, h, w) = features.dims4()?;
    let accepted = match scales.shape() {
        &[n, c] => n == batch && c == channels,
        &[n, c, 1, 1] => n == batch && c == channels,
        _ => false,
    };
    if !accepted {
        return Err(shape_error!(
            "scale_channels: scales {:?} do not broadcast over features {:?}",
            scales.shape(),
            features.shape()
        ));
    }

    let plane = h * w;
    if plane == 0 {
        return Ok(features);
    }
    for (values, &scale) in features
        .data_mut()
        .chunks_mut(plane)
        .zip(scales.data().iter())
    {
        for v in values.iter_mut() {
            *v *= scale;
        }
    }
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_per_channel() {
        let features = Tensor::from_vec(&[1, 2, 1, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let scales = Tensor::from_vec(&[1, 2, 1, 1], vec![2.0, 0.5]).unwrap();
        let out = scale_channels(features, &scales).unwrap();
        assert_eq!(out.data(), &[2.0, 4.0, 1.5, 2.0]);
    }

    #[test]
    fn test_accepts_flat_scales() {
        let features = Tensor::from_vec(&[2, 1, 1, 1], vec![3.0, 3.0]).unwrap();
        let scales = Tensor::from_vec(&[2, 1], vec![1.0, -1.0]).unwrap();
        let out = scale_channels(features, &scales).unwrap();
        assert_eq!(out.data(), &[3.0, -3.0]);
    }

    #[test]
    fn test_rejects_mismatched_scales() {
        let features = Tensor::zeros(&[1, 3, 2, 2]);
        let scales = Tensor::zeros(&[1, 2]);
        assert!(scale_channels(features, &scales).is_err());
        let features = Tensor::zeros(&[1, 2, 2, 2]);
        let scales = Tensor::zeros(&[1, 2, 2, 1]);
        assert!(scale_channels(features, &scales).is_err());
    }
}
