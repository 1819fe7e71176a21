//! Dense NCHW tensors

use std::fmt;

use crate::{Element, Result, WinogradError};

/// A 4D tensor with contiguous NCHW (batch, channels, height, width) storage
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T> {
    n: usize,
    c: usize,
    h: usize,
    w: usize,
    data: Vec<T>,
}

impl<T: Element> Tensor<T> {
    /// Creates a zero-filled tensor
    pub fn zeros(n: usize, c: usize, h: usize, w: usize) -> Self {
        Tensor {
            n,
            c,
            h,
            w,
            data: vec![T::zero(); n * c * h * w],
        }
    }

    /// Wraps existing NCHW data
    ///
    /// # Errors
    ///
    /// Returns `SizeMismatch` if `data.len() != n * c * h * w`
    pub fn from_vec(n: usize, c: usize, h: usize, w: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != n * c * h * w {
            return Err(WinogradError::SizeMismatch {
                expected: n * c * h * w,
                actual: data.len(),
            });
        }
        Ok(Tensor { n, c, h, w, data })
    }

    /// Returns `(batch, channels, height, width)`
    pub fn shape(&self) -> (usize, usize, usize, usize) {
        (self.n, self.c, self.h, self.w)
    }

    /// Element at `(n, c, h, w)`, or `None` when out of bounds
    pub fn get(&self, n: usize, c: usize, h: usize, w: usize) -> Option<&T> {
        if n >= self.n || c >= self.c || h >= self.h || w >= self.w {
            return None;
        }
        self.data.get(((n * self.c + c) * self.h + h) * self.w + w)
    }

    /// Elements of one batch element
    pub fn plane_len(&self) -> usize {
        self.c * self.h * self.w
    }

    /// The `c × h × w` block of batch element `n`
    pub fn plane(&self, n: usize) -> &[T] {
        let len = self.plane_len();
        &self.data[n * len..(n + 1) * len]
    }

    /// Mutable `c × h × w` block of batch element `n`
    pub fn plane_mut(&mut self, n: usize) -> &mut [T] {
        let len = self.plane_len();
        &mut self.data[n * len..(n + 1) * len]
    }

    /// Flat view of the data
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Consumes the tensor and returns its data
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T> fmt::Display for Tensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}x{}", self.n, self.c, self.h, self.w)
    }
}
