//! Winograd transform matrices and their cache
//!
//! The 1-D matrices come from Toom-Cook interpolation over the variant's
//! finite points plus the point at infinity. For F(m, 3) with `n = m + 2`:
//!
//! ```text
//! y = aᵀ [ (g · w) ⊙ (bᵀ · d) ]        d: n inputs, w: 3 taps, y: m outputs
//! ```
//!
//! The 2-D matrices handed to the GEMM stages are Kronecker squares
//! (`G = g ⊗ g`, `B = b ⊗ b`, `A = a ⊗ a`), so that a flattened tile
//! transforms with a single matrix product.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use crate::variant::{TransformRole, WinogradVariant, KERNEL_SIZE};
use crate::{Element, Matrix};

/// Coefficients (ascending powers) of `∏ (x - r)` over `roots`
fn poly_from_roots(roots: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut coeffs = vec![1.0];
    for r in roots {
        let mut next = vec![0.0; coeffs.len() + 1];
        for (k, &c) in coeffs.iter().enumerate() {
            next[k + 1] += c;
            next[k] -= r * c;
        }
        coeffs = next;
    }
    coeffs
}

/// 1-D kernel transform `g` (`n × 3`)
fn kernel_transform_1d(points: &[f64]) -> Matrix<f64> {
    let n = points.len() + 1;
    Matrix::from_fn(n, KERNEL_SIZE, |j, k| {
        if j == n - 1 {
            return if k == KERNEL_SIZE - 1 { 1.0 } else { 0.0 };
        }
        let scale: f64 = points
            .iter()
            .enumerate()
            .filter(|&(l, _)| l != j)
            .map(|(_, &p)| points[j] - p)
            .product();
        points[j].powi(k as i32) / scale
    })
}

/// 1-D input transform `b` (`n × n`); the pipeline applies its transpose
fn input_transform_1d(points: &[f64]) -> Matrix<f64> {
    let n = points.len() + 1;
    let columns: Vec<Vec<f64>> = (0..n)
        .map(|j| {
            if j == n - 1 {
                poly_from_roots(points.iter().copied())
            } else {
                let others = points
                    .iter()
                    .enumerate()
                    .filter(|&(l, _)| l != j)
                    .map(|(_, &p)| p);
                poly_from_roots(others)
            }
        })
        .collect();
    Matrix::from_fn(n, n, |k, j| columns[j].get(k).copied().unwrap_or(0.0))
}

/// 1-D output transform `a` (`n × m`); the pipeline applies its transpose
fn output_transform_1d(points: &[f64], tile_out: usize) -> Matrix<f64> {
    let n = points.len() + 1;
    Matrix::from_fn(n, tile_out, |j, p| {
        if j == n - 1 {
            if p == tile_out - 1 {
                1.0
            } else {
                0.0
            }
        } else {
            points[j].powi(p as i32)
        }
    })
}

/// 1-D transform for `(variant, role)` in `f64`
pub fn transform_matrix_1d(variant: WinogradVariant, role: TransformRole) -> Matrix<f64> {
    let points = variant.interpolation_points();
    match role {
        TransformRole::G => kernel_transform_1d(points),
        TransformRole::B => input_transform_1d(points),
        TransformRole::A => output_transform_1d(points, variant.tile_out()),
    }
}

/// 2-D transform for `(variant, role)` in `f64`, shaped as [`TransformRole::shape`]
pub fn transform_matrix(variant: WinogradVariant, role: TransformRole) -> Matrix<f64> {
    let m = transform_matrix_1d(variant, role);
    m.kron(&m)
}

/// Immutable-after-creation store of transform matrices keyed by (variant, role)
///
/// The cache is an ordinary value: whoever builds engines owns it and passes it
/// by reference. Each matrix is built at most once; concurrent first access is
/// serialized by the slot's `OnceLock`, so every caller observes the same
/// shared buffer.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use winoconv::{TransformCache, TransformRole, WinogradVariant};
///
/// let cache = TransformCache::<f32>::new();
/// let b1 = cache.get(WinogradVariant::F4x4, TransformRole::B);
/// let b2 = cache.get(WinogradVariant::F4x4, TransformRole::B);
/// assert!(Arc::ptr_eq(&b1, &b2));
/// assert_eq!(b1.shape(), (36, 36));
/// assert_eq!(cache.populated(), 1);
/// ```
#[derive(Debug, Default)]
pub struct TransformCache<T: Element> {
    slots: [[OnceLock<Arc<Matrix<T>>>; 3]; 2],
    builds: AtomicUsize,
}

impl<T: Element> TransformCache<T> {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self {
            slots: Default::default(),
            builds: AtomicUsize::new(0),
        }
    }

    /// Returns the shared transform matrix for `(variant, role)`, building it on first use
    pub fn get(&self, variant: WinogradVariant, role: TransformRole) -> Arc<Matrix<T>> {
        let slot = &self.slots[variant.index()][role.index()];
        Arc::clone(slot.get_or_init(|| {
            #[cfg(feature = "tracing")]
            tracing::debug!(%variant, ?role, "building Winograd transform matrix");
            self.builds.fetch_add(1, Ordering::Relaxed);
            Arc::new(transform_matrix(variant, role).cast())
        }))
    }

    /// Builds all three matrices for `variant`
    pub fn warm(&self, variant: WinogradVariant) {
        for role in TransformRole::ALL {
            self.get(variant, role);
        }
    }

    /// Number of matrices built so far
    pub fn populated(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn correlate_1d(d: &[f64], w: &[f64]) -> Vec<f64> {
        (0..d.len() - w.len() + 1)
            .map(|i| w.iter().enumerate().map(|(k, &wk)| d[i + k] * wk).sum())
            .collect()
    }

    fn assert_close(a: &[f64], b: &[f64], tol: f64) {
        assert_eq!(a.len(), b.len());
        for (i, (x, y)) in a.iter().zip(b).enumerate() {
            assert!((x - y).abs() <= tol, "index {i}: {x} vs {y}");
        }
    }

    #[test]
    fn test_poly_from_roots() {
        // (x - 1)(x + 1) = x² - 1
        assert_eq!(poly_from_roots([1.0, -1.0]), vec![-1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_1d_shapes() {
        for v in WinogradVariant::ALL {
            let n = v.tile_in();
            assert_eq!(transform_matrix_1d(v, TransformRole::G).shape(), (n, 3));
            assert_eq!(transform_matrix_1d(v, TransformRole::B).shape(), (n, n));
            assert_eq!(transform_matrix_1d(v, TransformRole::A).shape(), (n, v.tile_out()));
        }
    }

    #[test]
    fn test_1d_transform_computes_correlation() {
        for v in WinogradVariant::ALL {
            let n = v.tile_in();
            let g = transform_matrix_1d(v, TransformRole::G);
            let b = transform_matrix_1d(v, TransformRole::B);
            let a = transform_matrix_1d(v, TransformRole::A);

            let d: Vec<f64> = (0..n).map(|i| ((i * 7 + 3) % 10) as f64 - 4.0).collect();
            let w = [0.5, -2.0, 3.0];

            let d_col = Matrix::from_vec(n, 1, d.clone()).unwrap();
            let w_col = Matrix::from_vec(3, 1, w.to_vec()).unwrap();
            let u = g.matmul(&w_col).unwrap();
            let vd = b.transpose().matmul(&d_col).unwrap();
            let prod: Vec<f64> = u
                .as_slice()
                .iter()
                .zip(vd.as_slice())
                .map(|(x, y)| x * y)
                .collect();
            let prod = Matrix::from_vec(n, 1, prod).unwrap();
            let y = a.transpose().matmul(&prod).unwrap();

            assert_close(y.as_slice(), &correlate_1d(&d, &w), 1e-9);
        }
    }

    #[test]
    fn test_2d_shapes_follow_roles() {
        for v in WinogradVariant::ALL {
            for role in TransformRole::ALL {
                assert_eq!(transform_matrix(v, role).shape(), role.shape(v));
            }
        }
    }

    #[test]
    fn test_f4x4_kernel_transform_values() {
        // Row for point 1: [1, 1, 1] / ((1-0)(1+1)(1-2)(1+2)) = -1/6
        let g = transform_matrix_1d(WinogradVariant::F4x4, TransformRole::G);
        assert!((g.get(1, 0).copied().unwrap() + 1.0 / 6.0).abs() < 1e-12);
        assert_eq!(g.get(5, 2), Some(&1.0));
        assert_eq!(g.get(5, 0), Some(&0.0));
    }

    #[test]
    fn test_cache_builds_each_matrix_once() {
        let cache = TransformCache::<f32>::new();
        assert_eq!(cache.populated(), 0);

        let g1 = cache.get(WinogradVariant::F6x6, TransformRole::G);
        let g2 = cache.get(WinogradVariant::F6x6, TransformRole::G);
        assert!(Arc::ptr_eq(&g1, &g2));
        assert_eq!(cache.populated(), 1);

        cache.warm(WinogradVariant::F6x6);
        assert_eq!(cache.populated(), 3);
        cache.warm(WinogradVariant::F4x4);
        cache.warm(WinogradVariant::F4x4);
        assert_eq!(cache.populated(), 6);
    }

    #[test]
    fn test_cache_concurrent_first_access() {
        let cache = TransformCache::<f64>::new();
        let handles: Vec<Arc<Matrix<f64>>> = std::thread::scope(|s| {
            let workers: Vec<_> = (0..8)
                .map(|_| s.spawn(|| cache.get(WinogradVariant::F4x4, TransformRole::A)))
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });
        assert_eq!(cache.populated(), 1);
        assert!(handles.windows(2).all(|p| Arc::ptr_eq(&p[0], &p[1])));
    }

    #[test]
    fn test_independent_caches_do_not_share() {
        let c1 = TransformCache::<f32>::new();
        let c2 = TransformCache::<f32>::new();
        let a = c1.get(WinogradVariant::F4x4, TransformRole::B);
        let b = c2.get(WinogradVariant::F4x4, TransformRole::B);
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(*a, *b);
    }
}
