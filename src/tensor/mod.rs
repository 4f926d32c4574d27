//! Dense row-major `f32` tensors
//!
//! [`Tensor`] owns its buffer exclusively. The invariant
//! `data.len() == product(shape)` is checked on every construction path, so
//! kernels can rely on it without re-validating.

pub mod shape;

use std::fmt;

use crate::error::{LiteCnnError, LiteCnnResult};
pub use shape::{checked_element_count, element_count, row_major_strides};

/// Dense n-dimensional array of 32-bit floats
#[derive(Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl Tensor {
    /// Zero-filled tensor of the given shape
    ///
    /// # Panics
    ///
    /// Panics if the element count overflows `usize`, as `Vec` does on
    /// capacity overflow. Kernels sizing outputs from runtime shapes use
    /// [`Tensor::try_zeros`].
    pub fn zeros(shape: &[usize]) -> Self {
        match Self::try_zeros(shape) {
            Ok(tensor) => tensor,
            Err(e) => panic!("Tensor::zeros: {}", e),
        }
    }

    /// Zero-filled tensor, or `InvalidTensorShape` if the element count overflows
    pub fn try_zeros(shape: &[usize]) -> LiteCnnResult<Self> {
        let count = checked_element_count(shape)?;
        Ok(Tensor {
            shape: shape.to_vec(),
            data: vec![0.0; count],
        })
    }

    /// Tensor from a shape and a pre-populated buffer
    ///
    /// Fails if the buffer length differs from the shape's element count.
    pub fn from_vec(shape: &[usize], data: Vec<f32>) -> LiteCnnResult<Self> {
        let expected = checked_element_count(shape)?;
        if data.len() != expected {
            return Err(LiteCnnError::InvalidTensorShape(format!(
                "shape {:?} needs {} elements, buffer has {}",
                shape,
                expected,
                data.len()
            )));
        }
        Ok(Tensor {
            shape: shape.to_vec(),
            data,
        })
    }

    /// Product of the shape dimensions
    pub fn element_count(&self) -> usize {
        self.data.len()
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consume the tensor and return its buffer
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Row-major strides for this tensor's shape
    pub fn strides(&self) -> Vec<usize> {
        row_major_strides(&self.shape)
    }

    /// `(N, C, H, W)` of a 4-D tensor
    pub fn dims4(&self) -> LiteCnnResult<(usize, usize, usize, usize)> {
        match self.shape.as_slice() {
            &[n, c, h, w] => Ok((n, c, h, w)),
            other => Err(LiteCnnError::ShapeMismatch(format!(
                "expected a 4-D (N, C, H, W) tensor, got shape {:?}",
                other
            ))),
        }
    }

    /// `(rows, cols)` of a 2-D tensor
    pub fn dims2(&self) -> LiteCnnResult<(usize, usize)> {
        match self.shape.as_slice() {
            &[rows, cols] => Ok((rows, cols)),
            other => Err(LiteCnnError::ShapeMismatch(format!(
                "expected a 2-D tensor, got shape {:?}",
                other
            ))),
        }
    }

    #[inline]
    fn offset4(&self, n: usize, c: usize, h: usize, w: usize) -> usize {
        debug_assert_eq!(self.shape.len(), 4, "at() requires a 4-D tensor");
        let (cs, hs, ws) = (self.shape[1], self.shape[2], self.shape[3]);
        debug_assert!(
            n < self.shape[0] && c < cs && h < hs && w < ws,
            "index ({}, {}, {}, {}) out of bounds for shape {:?}",
            n,
            c,
            h,
            w,
            self.shape
        );
        ((n * cs + c) * hs + h) * ws + w
    }

    /// Element at `(n, c, h, w)` of a 4-D tensor
    #[inline]
    pub fn at(&self, n: usize, c: usize, h: usize, w: usize) -> f32 {
        self.data[self.offset4(n, c, h, w)]
    }

    /// Mutable element at `(n, c, h, w)` of a 4-D tensor
    #[inline]
    pub fn at_mut(&mut self, n: usize, c: usize, h: usize, w: usize) -> &mut f32 {
        let idx = self.offset4(n, c, h, w);
        &mut self.data[idx]
    }

    /// Copy of this tensor with a different shape
    ///
    /// Fails before allocating if the element counts differ.
    pub fn reshape(&self, shape: &[usize]) -> LiteCnnResult<Tensor> {
        self.check_reshape(shape)?;
        Ok(Tensor {
            shape: shape.to_vec(),
            data: self.data.clone(),
        })
    }

    /// Reshape without copying; consumes the tensor
    pub fn into_reshaped(self, shape: &[usize]) -> LiteCnnResult<Tensor> {
        self.check_reshape(shape)?;
        Ok(Tensor {
            shape: shape.to_vec(),
            data: self.data,
        })
    }

    fn check_reshape(&self, shape: &[usize]) -> LiteCnnResult<()> {
        let target = checked_element_count(shape)?;
        if target != self.element_count() {
            return Err(LiteCnnError::InvalidTensorShape(format!(
                "cannot reshape {:?} ({} elements) into {:?} ({} elements)",
                self.shape,
                self.element_count(),
                shape,
                target
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Weight tensors hold up to millions of values.
        const PREVIEW: usize = 8;
        let preview = &self.data[..self.data.len().min(PREVIEW)];
        f.debug_struct("Tensor")
            .field("shape", &self.shape)
            .field("data", &preview)
            .field("len", &self.data.len())
            .finish()
    }
}
