//! Conversion between NCHW planes and the tiled column layout
//!
//! The tiled layout nests `channel, tile_row, tile_col, y, x` in row-major
//! order. Input tiles are `tile_in` wide and overlap by `tile_in - tile_out`
//! (the kernel halo); output tiles are `tile_out` wide and never overlap.

use crate::config::{ConvolutionConfig, TileGeometry};
use crate::{Element, Result, WinogradError};

/// Tile layout of one batch element's channel stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLayout {
    /// Channels
    pub channels: usize,
    /// Spatial height of the dense plane
    pub height: usize,
    /// Spatial width of the dense plane
    pub width: usize,
    /// Input tile side
    pub tile_in: usize,
    /// Output tile side (tile stride)
    pub tile_out: usize,
    /// Tiles along the height
    pub tiles_h: usize,
    /// Tiles along the width
    pub tiles_w: usize,
    /// Zero padding subtracted from tile origins when tiling
    pub padding: usize,
}

impl TileLayout {
    /// Layout of the input side of `config`
    pub fn input(config: &ConvolutionConfig, geometry: TileGeometry) -> Self {
        Self {
            channels: config.in_channels,
            height: config.height,
            width: config.width,
            tile_in: geometry.tile_in,
            tile_out: geometry.tile_out,
            tiles_h: geometry.tiles_h,
            tiles_w: geometry.tiles_w,
            padding: config.padding,
        }
    }

    /// Layout of the output side of `config`; output planes are never padded
    pub fn output(config: &ConvolutionConfig, geometry: TileGeometry) -> Self {
        Self {
            channels: config.out_channels,
            height: config.out_height(),
            width: config.out_width(),
            tile_in: geometry.tile_in,
            tile_out: geometry.tile_out,
            tiles_h: geometry.tiles_h,
            tiles_w: geometry.tiles_w,
            padding: 0,
        }
    }

    /// Elements of the dense `channels × height × width` plane
    pub fn spatial_len(&self) -> usize {
        self.channels * self.height * self.width
    }

    /// Elements of the tiled buffer built from `tile_in`-sized tiles
    pub fn tiled_len(&self) -> usize {
        self.channels * self.tiles_h * self.tiles_w * self.tile_in * self.tile_in
    }

    /// Elements of the tiled buffer made of `tile_out`-sized tiles
    pub fn output_tiled_len(&self) -> usize {
        self.channels * self.tiles_h * self.tiles_w * self.tile_out * self.tile_out
    }

    /// Cuts `spatial` into overlapping `tile_in` tiles, writing zeros wherever a
    /// tile reaches into the padding or past the plane
    ///
    /// Tile `(th, tw)` element `(y, x)` reads spatial coordinate
    /// `(th·tile_out + y − padding, tw·tile_out + x − padding)`.
    ///
    /// # Errors
    ///
    /// `SizeMismatch` if `spatial` is shorter than the plane, `BufferTooSmall` if
    /// `tiled` cannot hold [`TileLayout::tiled_len`] elements
    pub fn to_tiled<T: Element>(&self, spatial: &[T], tiled: &mut [T]) -> Result<()> {
        check_len(spatial.len(), self.spatial_len())?;
        check_capacity("tiled input", tiled.len(), self.tiled_len())?;

        let t = self.tile_in;
        let mut idx = 0;
        for c in 0..self.channels {
            let plane = &spatial[c * self.height * self.width..(c + 1) * self.height * self.width];
            for th in 0..self.tiles_h {
                for tw in 0..self.tiles_w {
                    for y in 0..t {
                        let row = (th * self.tile_out + y).checked_sub(self.padding);
                        for x in 0..t {
                            let col = (tw * self.tile_out + x).checked_sub(self.padding);
                            tiled[idx] = match (row, col) {
                                (Some(r), Some(q)) if r < self.height && q < self.width => {
                                    plane[r * self.width + q]
                                }
                                _ => T::zero(),
                            };
                            idx += 1;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Calls `f(tiled_index, spatial_index)` for every `tile_out` tile element
    /// that lands inside the plane, in tiled-buffer order
    ///
    /// Elements past the plane's bottom/right edge are skipped; they only exist
    /// to keep every tile the same size.
    pub fn for_each_output(&self, mut f: impl FnMut(usize, usize)) {
        let t = self.tile_out;
        let mut idx = 0;
        for c in 0..self.channels {
            let base = c * self.height * self.width;
            for th in 0..self.tiles_h {
                for tw in 0..self.tiles_w {
                    for y in 0..t {
                        let row = th * t + y;
                        for x in 0..t {
                            let col = tw * t + x;
                            if row < self.height && col < self.width {
                                f(idx, base + row * self.width + col);
                            }
                            idx += 1;
                        }
                    }
                }
            }
        }
    }

    /// Reassembles non-overlapping `tile_out` tiles into the dense plane,
    /// discarding tile overflow past the plane's extent
    ///
    /// # Errors
    ///
    /// `SizeMismatch` if `tiled` is shorter than [`TileLayout::output_tiled_len`],
    /// `BufferTooSmall` if `spatial` cannot hold the plane
    pub fn from_tiled<T: Element>(&self, tiled: &[T], spatial: &mut [T]) -> Result<()> {
        check_len(tiled.len(), self.output_tiled_len())?;
        check_capacity("output plane", spatial.len(), self.spatial_len())?;

        self.for_each_output(|src, dst| spatial[dst] = tiled[src]);
        Ok(())
    }
}

fn check_len(actual: usize, expected: usize) -> Result<()> {
    if actual < expected {
        return Err(WinogradError::SizeMismatch { expected, actual });
    }
    Ok(())
}

fn check_capacity(buffer: &'static str, actual: usize, required: usize) -> Result<()> {
    if actual < required {
        return Err(WinogradError::BufferTooSmall {
            buffer,
            required,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WinogradVariant;

    fn layout(height: usize, width: usize, padding: usize, variant: WinogradVariant) -> TileLayout {
        let config = ConvolutionConfig::new(2, 3, height, width).with_padding(padding);
        TileLayout::input(&config, config.geometry(variant))
    }

    #[test]
    fn test_to_tiled_copies_with_padding() {
        let l = layout(5, 5, 1, WinogradVariant::F4x4);
        let spatial: Vec<f32> = (0..l.spatial_len()).map(|i| i as f32 + 1.0).collect();
        let mut tiled = vec![f32::NAN; l.tiled_len()];
        l.to_tiled(&spatial, &mut tiled).unwrap();

        let t = l.tile_in;
        // Tile (0,0): first row and column come from the padding
        assert_eq!(tiled[0], 0.0);
        assert_eq!(tiled[1], 0.0);
        assert_eq!(tiled[t], 0.0);
        // (y=1, x=1) -> spatial (0, 0)
        assert_eq!(tiled[t + 1], 1.0);
        // (y=2, x=3) -> spatial (1, 2)
        assert_eq!(tiled[2 * t + 3], spatial[5 + 2]);
        assert!(tiled.iter().all(|v| !v.is_nan()));
    }

    #[test]
    fn test_to_tiled_overlaps_neighbouring_tiles() {
        let l = layout(12, 12, 0, WinogradVariant::F4x4);
        let spatial: Vec<f64> = (0..l.spatial_len()).map(|i| i as f64).collect();
        let mut tiled = vec![0.0; l.tiled_len()];
        l.to_tiled(&spatial, &mut tiled).unwrap();

        let t = l.tile_in;
        let tile = |th: usize, tw: usize| ((th * l.tiles_w) + tw) * t * t;
        // Column 4 of tile (0,0) equals column 0 of tile (0,1)
        for y in 0..t {
            assert_eq!(tiled[tile(0, 0) + y * t + 4], tiled[tile(0, 1) + y * t]);
        }
    }

    #[test]
    fn test_to_tiled_second_channel_offset() {
        let l = layout(6, 6, 0, WinogradVariant::F4x4);
        let spatial: Vec<f32> = (0..l.spatial_len()).map(|i| i as f32).collect();
        let mut tiled = vec![0.0; l.tiled_len()];
        l.to_tiled(&spatial, &mut tiled).unwrap();
        let per_channel = l.tiles_h * l.tiles_w * l.tile_in * l.tile_in;
        assert_eq!(tiled[per_channel], 36.0);
    }

    #[test]
    fn test_from_tiled_clips_overflow() {
        let config = ConvolutionConfig::new(1, 2, 7, 5);
        let l = TileLayout::output(&config, config.geometry(WinogradVariant::F4x4));
        assert_eq!((l.height, l.width), (5, 3));

        let tiled: Vec<f32> = (0..l.output_tiled_len()).map(|i| i as f32).collect();
        let mut spatial = vec![f32::NAN; l.spatial_len()];
        l.from_tiled(&tiled, &mut spatial).unwrap();

        assert!(spatial.iter().all(|v| !v.is_nan()));
        // Spatial (0, 1) is element (0, 1) of tile (0, 0)
        assert_eq!(spatial[1], 1.0);
        // Spatial (4, 0) is element (0, 0) of tile (1, 0)
        let tile_elems = l.tile_out * l.tile_out;
        assert_eq!(spatial[4 * 3], (l.tiles_w * tile_elems) as f32);
    }

    #[test]
    fn test_for_each_output_visits_every_pixel_once() {
        for variant in WinogradVariant::ALL {
            let config = ConvolutionConfig::new(1, 3, 13, 9).with_padding(1);
            let l = TileLayout::output(&config, config.geometry(variant));
            let mut hits = vec![0u32; l.spatial_len()];
            l.for_each_output(|_, dst| hits[dst] += 1);
            assert!(hits.iter().all(|&h| h == 1), "{variant}");
        }
    }

    #[test]
    fn test_undersized_buffers_are_reported() {
        let l = layout(5, 5, 1, WinogradVariant::F6x6);
        let spatial = vec![0.0f32; l.spatial_len()];
        let mut tiled = vec![0.0f32; l.tiled_len() - 1];
        assert_eq!(
            l.to_tiled(&spatial, &mut tiled),
            Err(WinogradError::BufferTooSmall {
                buffer: "tiled input",
                required: l.tiled_len(),
                actual: l.tiled_len() - 1
            })
        );
        assert!(matches!(
            l.to_tiled(&spatial[1..], &mut vec![0.0; l.tiled_len()]),
            Err(WinogradError::SizeMismatch { .. })
        ));
    }
}
