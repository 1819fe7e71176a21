//! Cache-blocked GEMM backend
//!
//! Transposed operands are packed into plain row-major copies first so that the
//! inner loop always streams a contiguous row of `B` into a contiguous row of
//! `C` (AXPY form, auto-vectorized by LLVM). The `k` and `n` dimensions are
//! then walked in square blocks so the touched slice of `B` stays in L1/L2.
//!
//! With the `parallel` feature, row blocks of `C` are distributed over the
//! rayon pool once the problem is large enough to amortize the fork. Each row's
//! accumulation order does not depend on the thread count, so results are
//! bit-identical with and without the feature.

use std::borrow::Cow;

use super::{check_operands, scale_output, Gemm, Transpose};
use crate::{Element, Result};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Default block edge (elements)
const DEFAULT_BLOCK: usize = 64;

/// Minimum `m * n * k` before row blocks are processed in parallel
#[cfg(feature = "parallel")]
const PARALLEL_THRESHOLD: usize = 1 << 18;

/// Cache-blocked GEMM
#[derive(Debug, Clone, Copy)]
pub struct BlockedGemm {
    block: usize,
}

impl Default for BlockedGemm {
    fn default() -> Self {
        Self {
            block: DEFAULT_BLOCK,
        }
    }
}

impl BlockedGemm {
    /// Creates a backend with the default block size
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the block edge; values below 1 are clamped to 1
    pub fn with_block(mut self, block: usize) -> Self {
        self.block = block.max(1);
        self
    }

    /// Block edge in elements
    pub fn block(&self) -> usize {
        self.block
    }

    /// Accumulates `alpha * A[row0..row0+rows] * B` into `c_rows`
    #[allow(clippy::too_many_arguments)]
    fn accumulate_rows<T: Element>(
        &self,
        a: &[T],
        b: &[T],
        alpha: T,
        c_rows: &mut [T],
        row0: usize,
        n: usize,
        k: usize,
    ) {
        let rows = c_rows.len() / n;
        for kk in (0..k).step_by(self.block) {
            let k_end = (kk + self.block).min(k);
            for jj in (0..n).step_by(self.block) {
                let j_end = (jj + self.block).min(n);
                for i in 0..rows {
                    let a_row = &a[(row0 + i) * k..(row0 + i + 1) * k];
                    let c_row = &mut c_rows[i * n + jj..i * n + j_end];
                    for p in kk..k_end {
                        let scale = alpha * a_row[p];
                        if scale == T::zero() {
                            continue;
                        }
                        let b_row = &b[p * n + jj..p * n + j_end];
                        for (cv, &bv) in c_row.iter_mut().zip(b_row) {
                            *cv += scale * bv;
                        }
                    }
                }
            }
        }
    }
}

/// Copies a stored `cols × rows` operand into a row-major `rows × cols` buffer
fn pack_transposed<T: Element>(src: &[T], rows: usize, cols: usize) -> Vec<T> {
    let mut packed = vec![T::zero(); rows * cols];
    for r in 0..rows {
        for c in 0..cols {
            packed[r * cols + c] = src[c * rows + r];
        }
    }
    packed
}

/// Returns `op(X)` as a row-major `rows × cols` slice, packing only when transposed
fn as_row_major<T: Element>(src: &[T], trans: Transpose, rows: usize, cols: usize) -> Cow<'_, [T]> {
    match trans {
        Transpose::No => Cow::Borrowed(&src[..rows * cols]),
        Transpose::Yes => Cow::Owned(pack_transposed(src, rows, cols)),
    }
}

impl<T: Element> Gemm<T> for BlockedGemm {
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self, a, b, c)))]
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
    ) -> Result<()> {
        check_operands(m, n, k, a.len(), b.len(), c.len())?;

        let c = &mut c[..m * n];
        scale_output(beta, c);
        if m == 0 || n == 0 || k == 0 {
            return Ok(());
        }

        let a = as_row_major(a, trans_a, m, k);
        let b = as_row_major(b, trans_b, k, n);
        let chunk = self.block * n;

        #[cfg(feature = "parallel")]
        {
            if m * n * k >= PARALLEL_THRESHOLD && m > self.block {
                use rayon::prelude::*;

                c.par_chunks_mut(chunk)
                    .enumerate()
                    .for_each(|(blk, c_rows)| {
                        self.accumulate_rows(&a, &b, alpha, c_rows, blk * self.block, n, k);
                    });
                return Ok(());
            }
        }

        for (blk, c_rows) in c.chunks_mut(chunk).enumerate() {
            self.accumulate_rows(&a, &b, alpha, c_rows, blk * self.block, n, k);
        }
        Ok(())
    }
}
