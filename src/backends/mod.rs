//! Dense matrix-multiply backends
//!
//! The convolution pipeline delegates every multiply-accumulate to a [`Gemm`]
//! implementation. Any row-major BLAS-style `gemm` satisfies the contract.
//!
//! # Backends
//!
//! - `naive`: triple loop, correctness baseline
//! - `blocked`: cache-blocked accumulation, optionally multi-threaded (`parallel` feature)

pub mod blocked;
pub mod naive;

pub use blocked::BlockedGemm;
pub use naive::NaiveGemm;

use crate::{Element, Result, WinogradError};

/// Whether an operand is read as stored or transposed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transpose {
    /// Use the operand as stored
    No,
    /// Use the transpose of the stored operand
    Yes,
}

impl Transpose {
    /// Leading dimension of a row-major operand whose logical shape is `rows × cols`
    /// after applying this flag
    #[inline]
    pub const fn leading_dim(self, rows: usize, cols: usize) -> usize {
        match self {
            Transpose::No => cols,
            Transpose::Yes => rows,
        }
    }
}

/// General matrix multiply over row-major buffers
///
/// Computes `C = alpha * op(A) * op(B) + beta * C` where `op(A)` is `m × k`,
/// `op(B)` is `k × n` and `C` is `m × n`. Leading dimensions are inferred:
/// `lda = if trans_a { m } else { k }`, `ldb = if trans_b { k } else { n }`, `ldc = n`.
/// When `beta` is zero, `C` is overwritten and its prior contents are never read.
///
/// Implementations must be shareable across threads: the engine may issue
/// independent multiplies concurrently on disjoint output slices.
pub trait Gemm<T: Element>: Send + Sync {
    /// Performs the multiply
    ///
    /// # Errors
    ///
    /// Returns `SizeMismatch` if any operand is shorter than its declared shape
    #[allow(clippy::too_many_arguments)]
    fn gemm(
        &self,
        trans_a: Transpose,
        trans_b: Transpose,
        m: usize,
        n: usize,
        k: usize,
        alpha: T,
        a: &[T],
        b: &[T],
        beta: T,
        c: &mut [T],
    ) -> Result<()>;
}

/// Validates operand lengths against the declared shape
pub(crate) fn check_operands(
    m: usize,
    n: usize,
    k: usize,
    a_len: usize,
    b_len: usize,
    c_len: usize,
) -> Result<()> {
    for (expected, actual) in [(m * k, a_len), (k * n, b_len), (m * n, c_len)] {
        if actual < expected {
            return Err(WinogradError::SizeMismatch { expected, actual });
        }
    }
    Ok(())
}

/// Applies `C = beta * C`, treating `beta == 0` as an overwrite
pub(crate) fn scale_output<T: Element>(beta: T, c: &mut [T]) {
    if beta == T::zero() {
        c.fill(T::zero());
    } else if beta != T::one() {
        for v in c.iter_mut() {
            *v = *v * beta;
        }
    }
}
