//! Naive GEMM backend
//!
//! Portable triple loop with no blocking or packing. Serves as the correctness
//! reference for the other backends.

use super::{check_operands, scale_output, Gemm, Transpose};
use crate::{Element, Result};

/// Naive triple-loop GEMM
#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveGemm;

impl<T: Element> Gemm<T> for NaiveGemm {
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
        let lda = trans_a.leading_dim(m, k);
        let ldb = trans_b.leading_dim(k, n);

        let c = &mut c[..m * n];
        scale_output(beta, c);

        for i in 0..m {
            for j in 0..n {
                let mut sum = T::zero();
                for p in 0..k {
                    let a_ip = match trans_a {
                        Transpose::No => a[i * lda + p],
                        Transpose::Yes => a[p * lda + i],
                    };
                    let b_pj = match trans_b {
                        Transpose::No => b[p * ldb + j],
                        Transpose::Yes => b[j * ldb + p],
                    };
                    sum += a_ip * b_pj;
                }
                c[i * n + j] += alpha * sum;
            }
        }
        Ok(())
    }
}
