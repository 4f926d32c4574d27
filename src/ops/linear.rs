//! Dense projection: `out[n, o] = Σ_i input[n, i] · weight[o, i] + bias[o]`

use crate::error::LiteCnnResult;
use crate::shape_error;
use crate::tensor::Tensor;

/// Fully connected layer with an optional bias
///
/// `input` is `[N, in_features]`, `weight` is `[out_features, in_features]`
/// and `bias`, when present, holds `out_features` values.
pub fn linear(input: &Tensor, weight: &Tensor, bias: Option<&Tensor>) -> LiteCnnResult<Tensor> {
    let (batch, in_features) = input.dims2()?;
    let (out_features, weight_in) = weight.dims2()?;
    if weight_in != in_features {
        return Err(shape_error!(
            "linear: input has {} features, weight {:?} expects {}",
            in_features,
            weight.shape(),
            weight_in
        ));
    }
    if let Some(b) = bias {
        if b.element_count() != out_features {
            return Err(shape_error!(
                "linear: bias has {} elements, weight has {} outputs",
                b.element_count(),
                out_features
            ));
        }
    }

    let mut output = Tensor::try_zeros(&[batch, out_features])?;
    let x = input.data();
    let wt = weight.data();
    let bias = bias.map(Tensor::data);

    for n in 0..batch {
        let row = &x[n * in_features..(n + 1) * in_features];
        let out_row = &mut output.data_mut()[n * out_features..(n + 1) * out_features];
        for (o, out) in out_row.iter_mut().enumerate() {
            let w_row = &wt[o * in_features..(o + 1) * in_features];
            let mut sum = 0.0f32;
            for (a, b) in row.iter().zip(w_row) {
                sum += a * b;
            }
            if let Some(bias) = bias {
                sum += bias[o];
            }
            *out = sum;
        }
    }

    Ok(output)
}
