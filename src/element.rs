//! Floating-point element types accepted by the convolution pipeline

use std::fmt::Debug;
use std::ops::AddAssign;

use num_traits::Float;

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// Element type of every buffer in the pipeline.
///
/// Implemented for `f32` and `f64`. Accumulation precision follows the element
/// type; transform matrices are derived in `f64` and narrowed with [`Element::from_f64`].
pub trait Element:
    Float + AddAssign + Debug + Default + Send + Sync + 'static + sealed::Sealed
{
    /// Lossy conversion from `f64`
    fn from_f64(value: f64) -> Self;

    /// Widening conversion to `f64`
    fn as_f64(self) -> f64;
}

impl Element for f32 {
    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self as f64
    }
}

impl Element for f64 {
    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }

    #[inline]
    fn as_f64(self) -> f64 {
        self
    }
}
