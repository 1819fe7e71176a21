//! Dense row-major matrices
//!
//! Transform matrices are small (at most 64×64) and immutable once built, so this
//! type favours clarity over speed. Bulk arithmetic goes through [`crate::backends::Gemm`].
//!
//! # Example
//!
//! ```
//! use winoconv::Matrix;
//!
//! let m: Matrix<f32> = Matrix::zeros(2, 3);
//! assert_eq!(m.rows(), 2);
//! assert_eq!(m.cols(), 3);
//! ```

use crate::{Element, Result, WinogradError};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// A 2D matrix with row-major storage
///
/// For a 2x3 matrix:
/// ```text
/// [[a, b, c],
///  [d, e, f]]
/// ```
/// Data is stored as: [a, b, c, d, e, f]
///
/// # Example
///
/// ```
/// use winoconv::Matrix;
///
/// let m = Matrix::from_vec(2, 2, vec![1.0f32, 2.0, 3.0, 4.0]).unwrap();
/// assert_eq!(m.get(0, 1), Some(&2.0));
/// assert_eq!(m.get(1, 0), Some(&3.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Element> Matrix<T> {
    /// Creates a matrix from a vector of data
    ///
    /// # Errors
    ///
    /// Returns `SizeMismatch` if `data.len() != rows * cols`
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(WinogradError::SizeMismatch {
                expected: rows * cols,
                actual: data.len(),
            });
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Creates a matrix filled with zeros
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![T::zero(); rows * cols],
        }
    }

    /// Creates a matrix whose element `(i, j)` is `f(i, j)`
    ///
    /// # Example
    ///
    /// ```
    /// use winoconv::Matrix;
    ///
    /// let m: Matrix<f64> = Matrix::from_fn(2, 2, |i, j| (i * 2 + j) as f64);
    /// assert_eq!(m.as_slice(), &[0.0, 1.0, 2.0, 3.0]);
    /// ```
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Matrix { rows, cols, data }
    }

    /// Creates an identity matrix
    pub fn identity(n: usize) -> Self {
        Self::from_fn(n, n, |i, j| if i == j { T::one() } else { T::zero() })
    }

    /// Returns the number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the shape as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Gets a reference to an element at (row, col)
    ///
    /// Returns `None` if indices are out of bounds
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row >= self.rows || col >= self.cols {
            None
        } else {
            self.data.get(row * self.cols + col)
        }
    }

    /// Returns a reference to the underlying data
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Converts every element to another element type
    pub fn cast<U: Element>(&self) -> Matrix<U> {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| U::from_f64(v.as_f64())).collect(),
        }
    }

    /// Transposes the matrix (swaps rows and columns)
    pub fn transpose(&self) -> Matrix<T> {
        Self::from_fn(self.cols, self.rows, |i, j| self.data[j * self.cols + i])
    }

    /// Kronecker product `self ⊗ other`
    ///
    /// Element `(i1 * other.rows + i2, j1 * other.cols + j2)` equals
    /// `self[i1, j1] * other[i2, j2]`. The 2-D Winograd transforms are the
    /// Kronecker squares of their 1-D counterparts.
    ///
    /// # Example
    ///
    /// ```
    /// use winoconv::Matrix;
    ///
    /// let a = Matrix::from_vec(1, 2, vec![1.0f64, 2.0]).unwrap();
    /// let k = a.kron(&a);
    /// assert_eq!(k.shape(), (1, 4));
    /// assert_eq!(k.as_slice(), &[1.0, 2.0, 2.0, 4.0]);
    /// ```
    #[cfg_attr(feature = "tracing", instrument(skip(self, other), fields(lhs = ?self.shape(), rhs = ?other.shape())))]
    pub fn kron(&self, other: &Matrix<T>) -> Matrix<T> {
        let rows = self.rows * other.rows;
        let cols = self.cols * other.cols;
        Self::from_fn(rows, cols, |i, j| {
            let (i1, i2) = (i / other.rows, i % other.rows);
            let (j1, j2) = (j / other.cols, j % other.cols);
            self.data[i1 * self.cols + j1] * other.data[i2 * other.cols + j2]
        })
    }

    /// Naive matrix product, used for small transform algebra and checks
    ///
    /// # Errors
    ///
    /// Returns `SizeMismatch` if the inner dimensions differ
    pub fn matmul(&self, other: &Matrix<T>) -> Result<Matrix<T>> {
        if self.cols != other.rows {
            return Err(WinogradError::SizeMismatch {
                expected: self.cols,
                actual: other.rows,
            });
        }
        let mut result = Matrix::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for p in 0..self.cols {
                let a = self.data[i * self.cols + p];
                for j in 0..other.cols {
                    result.data[i * other.cols + j] += a * other.data[p * other.cols + j];
                }
            }
        }
        Ok(result)
    }
}
