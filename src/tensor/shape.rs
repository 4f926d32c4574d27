//! Shape helpers for row-major tensors.

use crate::error::{LiteCnnError, LiteCnnResult};

/// Product of all dimensions. The empty shape is a scalar with one element.
pub fn element_count(shape: &[usize]) -> usize {
    shape.iter().copied().product()
}

/// Product of all dimensions, or an error if it does not fit in `usize`.
pub fn checked_element_count(shape: &[usize]) -> LiteCnnResult<usize> {
    shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
        .ok_or_else(|| {
            LiteCnnError::InvalidTensorShape(format!(
                "element count of shape {:?} overflows usize",
                shape
            ))
        })
}

/// Row-major strides: the last dimension has stride 1.
pub fn row_major_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = Vec::with_capacity(shape.len());
    let mut stride: usize = 1;
    for dim in shape.iter().rev() {
        strides.push(stride);
        stride = stride.saturating_mul(*dim);
    }
    strides.reverse();
    strides
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_count() {
        assert_eq!(element_count(&[2, 3, 4]), 24);
        assert_eq!(element_count(&[]), 1);
        assert_eq!(element_count(&[5, 0, 2]), 0);
    }

    #[test]
    fn test_checked_element_count_overflow() {
        assert_eq!(checked_element_count(&[2, 3]).unwrap(), 6);
        assert!(checked_element_count(&[usize::MAX, 2]).is_err());
    }

    #[test]
    fn test_row_major_strides() {
        assert_eq!(row_major_strides(&[2, 3, 4]), vec![12, 4, 1]);
        assert_eq!(row_major_strides(&[7]), vec![1]);
        assert!(row_major_strides(&[]).is_empty());
    }
}
