//! Convolution layer configuration
//!
//! # Examples
//!
//! ```
//! use winoconv::{ConvolutionConfig, WinogradVariant};
//!
//! let config = ConvolutionConfig::new(3, 7, 25, 25)
//!     .with_padding(1)
//!     .with_bias(true);
//! config.validate().unwrap();
//!
//! assert_eq!(config.out_height(), 25);
//! let geometry = config.geometry(WinogradVariant::F6x6);
//! assert_eq!((geometry.tiles_h, geometry.tiles_w), (5, 5));
//! ```

use crate::variant::{WinogradVariant, KERNEL_SIZE};
use crate::{Result, WinogradError};

/// Shape and options of one convolution layer
///
/// Inputs are NCHW; padding is symmetric and applied to both spatial axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvolutionConfig {
    /// Input channels
    pub in_channels: usize,
    /// Output channels
    pub out_channels: usize,
    /// Input height
    pub height: usize,
    /// Input width
    pub width: usize,
    /// Kernel height (must be 3)
    pub kernel_h: usize,
    /// Kernel width (must be 3)
    pub kernel_w: usize,
    /// Vertical stride (must be 1)
    pub stride_h: usize,
    /// Horizontal stride (must be 1)
    pub stride_w: usize,
    /// Zero padding on every spatial edge
    pub padding: usize,
    /// Whether a bias segment trails the kernel weights
    pub bias: bool,
    /// Group count (must be 1)
    pub groups: usize,
    /// Batch size
    pub batch: usize,
}

/// Tile geometry derived from a configuration and a variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGeometry {
    /// Input tile side
    pub tile_in: usize,
    /// Output tile side
    pub tile_out: usize,
    /// Tiles along the height
    pub tiles_h: usize,
    /// Tiles along the width
    pub tiles_w: usize,
}

impl TileGeometry {
    /// Tiles per channel plane
    pub fn tile_count(&self) -> usize {
        self.tiles_h * self.tiles_w
    }

    /// Elements per input tile (`tile_in²`), also the number of Winograd-domain positions
    pub fn positions(&self) -> usize {
        self.tile_in * self.tile_in
    }
}

impl ConvolutionConfig {
    /// Creates a configuration with a 3x3 kernel, unit stride, no padding,
    /// bias enabled, one group and a batch of one
    pub fn new(in_channels: usize, out_channels: usize, height: usize, width: usize) -> Self {
        Self {
            in_channels,
            out_channels,
            height,
            width,
            kernel_h: KERNEL_SIZE,
            kernel_w: KERNEL_SIZE,
            stride_h: 1,
            stride_w: 1,
            padding: 0,
            bias: true,
            groups: 1,
            batch: 1,
        }
    }

    /// Set kernel size
    pub fn with_kernel(mut self, kernel_h: usize, kernel_w: usize) -> Self {
        self.kernel_h = kernel_h;
        self.kernel_w = kernel_w;
        self
    }

    /// Set stride
    pub fn with_stride(mut self, stride_h: usize, stride_w: usize) -> Self {
        self.stride_h = stride_h;
        self.stride_w = stride_w;
        self
    }

    /// Set symmetric zero padding
    pub fn with_padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    /// Enable or disable the bias segment
    pub fn with_bias(mut self, bias: bool) -> Self {
        self.bias = bias;
        self
    }

    /// Set group count
    pub fn with_groups(mut self, groups: usize) -> Self {
        self.groups = groups;
        self
    }

    /// Set batch size
    pub fn with_batch(mut self, batch: usize) -> Self {
        self.batch = batch;
        self
    }

    /// Checks every constraint the Winograd variants impose
    ///
    /// # Errors
    ///
    /// - `UnsupportedKernel` unless the kernel is 3x3
    /// - `UnsupportedStride` unless the stride is 1x1
    /// - `UnsupportedGroups` unless `groups == 1`
    /// - `InvalidConfig` for zero-sized dimensions or an input smaller than the
    ///   kernel after padding
    pub fn validate(&self) -> Result<()> {
        if self.kernel_h != KERNEL_SIZE || self.kernel_w != KERNEL_SIZE {
            return Err(WinogradError::UnsupportedKernel {
                height: self.kernel_h,
                width: self.kernel_w,
            });
        }
        if self.stride_h != 1 || self.stride_w != 1 {
            return Err(WinogradError::UnsupportedStride {
                height: self.stride_h,
                width: self.stride_w,
            });
        }
        if self.groups != 1 {
            return Err(WinogradError::UnsupportedGroups(self.groups));
        }
        for (name, value) in [
            ("in_channels", self.in_channels),
            ("out_channels", self.out_channels),
            ("height", self.height),
            ("width", self.width),
            ("batch", self.batch),
        ] {
            if value == 0 {
                return Err(WinogradError::InvalidConfig(format!("{name} must be non-zero")));
            }
        }
        if self.height + 2 * self.padding < self.kernel_h
            || self.width + 2 * self.padding < self.kernel_w
        {
            return Err(WinogradError::InvalidConfig(format!(
                "padded input {}x{} is smaller than the {}x{} kernel",
                self.height + 2 * self.padding,
                self.width + 2 * self.padding,
                self.kernel_h,
                self.kernel_w
            )));
        }
        Ok(())
    }

    /// Output height: `(height + 2·padding − kernel_h) / stride_h + 1`, or 0 if the
    /// padded input is smaller than the kernel
    pub fn out_height(&self) -> usize {
        output_extent(self.height, self.padding, self.kernel_h, self.stride_h)
    }

    /// Output width, symmetric to [`ConvolutionConfig::out_height`]
    pub fn out_width(&self) -> usize {
        output_extent(self.width, self.padding, self.kernel_w, self.stride_w)
    }

    /// Tile geometry for `variant`
    ///
    /// Tiles cover `max(extent + padding − tile_in + 1, out_extent)` rounded up to a
    /// multiple of `tile_out`, so every output pixel falls in some tile's footprint.
    pub fn geometry(&self, variant: WinogradVariant) -> TileGeometry {
        let tile_in = variant.tile_in();
        let tile_out = variant.tile_out();
        let tiles = |extent: usize, out_extent: usize| {
            (extent + self.padding + 1)
                .saturating_sub(tile_in)
                .max(out_extent)
                .div_ceil(tile_out)
        };
        TileGeometry {
            tile_in,
            tile_out,
            tiles_h: tiles(self.height, self.out_height()),
            tiles_w: tiles(self.width, self.out_width()),
        }
    }

    /// Elements in the kernel block of the weight buffer
    pub fn kernel_len(&self) -> usize {
        self.in_channels * self.out_channels * self.kernel_h * self.kernel_w
    }

    /// Elements in the full weight buffer (kernel block plus optional bias)
    pub fn weight_len(&self) -> usize {
        self.kernel_len() + if self.bias { self.out_channels } else { 0 }
    }

    /// Elements in one input batch element
    pub fn input_plane_len(&self) -> usize {
        self.in_channels * self.height * self.width
    }

    /// Elements in the whole input tensor
    pub fn input_len(&self) -> usize {
        self.batch * self.input_plane_len()
    }

    /// Elements in one output batch element
    pub fn output_plane_len(&self) -> usize {
        self.out_channels * self.out_height() * self.out_width()
    }

    /// Elements in the whole output tensor
    pub fn output_len(&self) -> usize {
        self.batch * self.output_plane_len()
    }

    /// Minimum caller-supplied scratch length for `variant`:
    /// `max(in_channels, out_channels) × tiles_h × tiles_w × tile_in²`
    ///
    /// The scratch buffer first holds the tiled input, then the Winograd-domain
    /// product, so it must fit the larger of the two.
    pub fn scratch_len(&self, variant: WinogradVariant) -> usize {
        let g = self.geometry(variant);
        self.in_channels.max(self.out_channels) * g.tile_count() * g.positions()
    }
}

fn output_extent(extent: usize, padding: usize, kernel: usize, stride: usize) -> usize {
    (extent + 2 * padding)
        .checked_sub(kernel)
        .map_or(0, |span| span / stride.max(1) + 1)
}
