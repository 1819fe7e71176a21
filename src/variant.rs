//! Winograd algorithm variants and transform roles

use std::fmt;
use std::str::FromStr;

use crate::{Result, WinogradError};

/// Kernel side length every variant is defined for
pub const KERNEL_SIZE: usize = 3;

/// Supported Winograd configurations for 3x3 kernels with stride 1
///
/// Each variant fixes an input tile side `tile_in` and an output tile side
/// `tile_out = tile_in - KERNEL_SIZE + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WinogradVariant {
    /// F(6x6, 3x3): 8x8 input tiles, 6x6 output tiles
    F6x6,
    /// F(4x4, 3x3): 6x6 input tiles, 4x4 output tiles
    F4x4,
}

impl WinogradVariant {
    /// All defined variants
    pub const ALL: [WinogradVariant; 2] = [WinogradVariant::F6x6, WinogradVariant::F4x4];

    /// Input tile side length
    pub const fn tile_in(self) -> usize {
        match self {
            WinogradVariant::F6x6 => 8,
            WinogradVariant::F4x4 => 6,
        }
    }

    /// Output tile side length
    pub const fn tile_out(self) -> usize {
        self.tile_in() - KERNEL_SIZE + 1
    }

    /// Finite Toom-Cook interpolation points; the point at infinity is implicit
    pub(crate) fn interpolation_points(self) -> &'static [f64] {
        match self {
            WinogradVariant::F6x6 => &[0.0, 1.0, -1.0, 2.0, -2.0, 0.5, -0.5],
            WinogradVariant::F4x4 => &[0.0, 1.0, -1.0, 2.0, -2.0],
        }
    }

    /// Looks a variant up by its input tile size
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedVariant` for any tile size other than 8 or 6
    pub fn from_tile_size(tile_in: usize) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.tile_in() == tile_in)
            .ok_or_else(|| WinogradError::UnsupportedVariant(format!("tile size {tile_in}")))
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            WinogradVariant::F6x6 => 0,
            WinogradVariant::F4x4 => 1,
        }
    }
}

impl fmt::Display for WinogradVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WinogradVariant::F6x6 => write!(f, "wt8x8"),
            WinogradVariant::F4x4 => write!(f, "wt6x6"),
        }
    }
}

impl FromStr for WinogradVariant {
    type Err = WinogradError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "wt8x8" | "f6x6" | "f6x6_3x3" => Ok(WinogradVariant::F6x6),
            "wt6x6" | "f4x4" | "f4x4_3x3" => Ok(WinogradVariant::F4x4),
            other => Err(WinogradError::UnsupportedVariant(other.to_string())),
        }
    }
}

/// Which transform a matrix implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformRole {
    /// Kernel-side transform, shape `tile_in² × 9`
    G,
    /// Input-side transform, shape `tile_in² × tile_in²`
    B,
    /// Output-side inverse transform, shape `tile_in² × tile_out²`
    A,
}

impl TransformRole {
    /// All roles
    pub const ALL: [TransformRole; 3] = [TransformRole::G, TransformRole::B, TransformRole::A];

    /// Shape of the 2-D transform matrix for this role under `variant`
    pub fn shape(self, variant: WinogradVariant) -> (usize, usize) {
        let t = variant.tile_in();
        match self {
            TransformRole::G => (t * t, KERNEL_SIZE * KERNEL_SIZE),
            TransformRole::B => (t * t, t * t),
            TransformRole::A => (t * t, variant.tile_out() * variant.tile_out()),
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            TransformRole::G => 0,
            TransformRole::B => 1,
            TransformRole::A => 2,
        }
    }
}
