//! Winograd convolution engine
//!
//! Each [`WinogradConv::infer`] call runs a fixed pipeline:
//!
//! 1. weight transform, once per call: `U = G · W`, one GEMM
//! 2. per batch element:
//!    - tiling: dense plane → overlapping `tile_in` tiles (scratch)
//!    - input transform: `V = Bᵀ · tiles`, one GEMM
//!    - domain multiply: `M[j] = U[j] · V[j]` for every tile position `j`
//!    - inverse transform: `Y = Mᵀ · A`, one GEMM
//!    - detiling into the output plane, then bias
//!
//! Batch elements run sequentially and share the workspace and the caller's
//! scratch buffer.

use std::sync::Arc;

use crate::backends::{BlockedGemm, Gemm, Transpose};
use crate::config::{ConvolutionConfig, TileGeometry};
use crate::layout::TileLayout;
use crate::transform::TransformCache;
use crate::variant::{TransformRole, WinogradVariant};
use crate::workspace::{Workspace, WorkspaceLayout};
use crate::{Element, Matrix, Result, Tensor, WinogradError};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Winograd convolution for one layer configuration
///
/// # Example
///
/// ```
/// use winoconv::{ConvolutionConfig, TransformCache, WinogradConv, WinogradVariant};
///
/// let cache = TransformCache::<f32>::new();
/// let config = ConvolutionConfig::new(1, 1, 4, 4).with_padding(1);
/// let mut conv = WinogradConv::new(WinogradVariant::F4x4, config, &cache).unwrap();
///
/// // Centre-tap kernel, bias 1.0
/// let mut weights = vec![0.0f32; 9];
/// weights[4] = 1.0;
/// weights.push(1.0);
///
/// let input: Vec<f32> = (0..16).map(|i| i as f32).collect();
/// let mut scratch = vec![0.0f32; conv.scratch_len()];
/// let output = conv.infer(&input, &weights, &mut scratch).unwrap();
///
/// assert_eq!(output.shape(), (1, 1, 4, 4));
/// assert!((output.as_slice()[5] - 6.0).abs() < 1e-4);
/// ```
#[derive(Debug)]
pub struct WinogradConv<T: Element, G: Gemm<T> = BlockedGemm> {
    variant: WinogradVariant,
    config: ConvolutionConfig,
    geometry: TileGeometry,
    input_layout: TileLayout,
    output_layout: TileLayout,
    g: Arc<Matrix<T>>,
    b: Arc<Matrix<T>>,
    a: Arc<Matrix<T>>,
    workspace: Workspace<T>,
    gemm: G,
}

impl<T: Element> WinogradConv<T, BlockedGemm> {
    /// Builds an engine using the default [`BlockedGemm`] backend
    ///
    /// # Errors
    ///
    /// Any configuration error from [`ConvolutionConfig::validate`]
    pub fn new(
        variant: WinogradVariant,
        config: ConvolutionConfig,
        cache: &TransformCache<T>,
    ) -> Result<Self> {
        Self::with_gemm(variant, config, cache, BlockedGemm::default())
    }
}

impl<T: Element, G: Gemm<T>> WinogradConv<T, G> {
    /// Builds an engine that delegates every matrix product to `gemm`
    ///
    /// The transform matrices are fetched from `cache` here, so the cache is
    /// fully populated for `variant` before the first inference.
    ///
    /// # Errors
    ///
    /// Any configuration error from [`ConvolutionConfig::validate`]
    pub fn with_gemm(
        variant: WinogradVariant,
        config: ConvolutionConfig,
        cache: &TransformCache<T>,
        gemm: G,
    ) -> Result<Self> {
        config.validate()?;
        let geometry = config.geometry(variant);
        Ok(Self {
            variant,
            config,
            geometry,
            input_layout: TileLayout::input(&config, geometry),
            output_layout: TileLayout::output(&config, geometry),
            g: cache.get(variant, TransformRole::G),
            b: cache.get(variant, TransformRole::B),
            a: cache.get(variant, TransformRole::A),
            workspace: Workspace::new(WorkspaceLayout::new(&config, variant)),
            gemm,
        })
    }

    /// Algorithm variant
    pub fn variant(&self) -> WinogradVariant {
        self.variant
    }

    /// Layer configuration
    pub fn config(&self) -> &ConvolutionConfig {
        &self.config
    }

    /// Tile geometry
    pub fn geometry(&self) -> TileGeometry {
        self.geometry
    }

    /// Engine-owned buffers
    pub fn workspace(&self) -> &Workspace<T> {
        &self.workspace
    }

    /// Minimum scratch length accepted by [`WinogradConv::infer`]
    pub fn scratch_len(&self) -> usize {
        self.workspace.layout().scratch
    }

    /// Runs the convolution over every batch element
    ///
    /// `input` is NCHW with `config.input_len()` elements. `weights` holds the
    /// OIHW kernel block followed by `out_channels` bias values when bias is
    /// enabled. `scratch` is caller-owned and reused across stages and batch
    /// elements; it must hold at least [`WinogradConv::scratch_len`] elements.
    ///
    /// # Errors
    ///
    /// - `SizeMismatch` if `input` or `weights` disagree with the configuration
    /// - `BufferTooSmall` if `scratch` is undersized
    #[cfg_attr(feature = "tracing", instrument(skip_all, fields(variant = %self.variant, batch = self.config.batch)))]
    pub fn infer(&mut self, input: &[T], weights: &[T], scratch: &mut [T]) -> Result<Tensor<T>> {
        for (expected, actual) in [
            (self.config.input_len(), input.len()),
            (self.config.weight_len(), weights.len()),
        ] {
            if expected != actual {
                return Err(WinogradError::SizeMismatch { expected, actual });
            }
        }
        let required = self.scratch_len();
        if scratch.len() < required {
            return Err(WinogradError::BufferTooSmall {
                buffer: "scratch",
                required,
                actual: scratch.len(),
            });
        }

        let kernel_len = self.config.kernel_len();
        let (kernel, bias) = weights.split_at(kernel_len);
        let bias = self.config.bias.then_some(bias);
        let plane_len = self.config.input_plane_len();

        let mut output = Tensor::zeros(
            self.config.batch,
            self.config.out_channels,
            self.config.out_height(),
            self.config.out_width(),
        );

        self.transform_weights(kernel)?;
        for n in 0..self.config.batch {
            let src = &input[n * plane_len..(n + 1) * plane_len];
            self.transform_input(src, scratch)?;
            self.multiply(scratch)?;
            self.transform_output(scratch, output.plane_mut(n))?;
            if let Some(bias) = bias {
                self.add_bias(bias, output.plane_mut(n));
            }
        }
        Ok(output)
    }

    /// [`WinogradConv::infer`] with a freshly allocated scratch buffer
    ///
    /// # Errors
    ///
    /// Same as [`WinogradConv::infer`], minus the scratch check
    pub fn infer_alloc(&mut self, input: &[T], weights: &[T]) -> Result<Tensor<T>> {
        let mut scratch = vec![T::zero(); self.scratch_len()];
        self.infer(input, weights, &mut scratch)
    }

    /// `U = G · Wᵀ-rows`: shape `tile_in² × (in_channels · out_channels)`
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
    fn transform_weights(&mut self, kernel: &[T]) -> Result<()> {
        let (positions, taps) = self.g.shape();
        self.gemm.gemm(
            Transpose::No,
            Transpose::Yes,
            positions,
            self.config.in_channels * self.config.out_channels,
            taps,
            T::one(),
            self.g.as_slice(),
            kernel,
            T::zero(),
            &mut self.workspace.transformed_weight,
        )
    }

    /// Tiles one input plane into `scratch`, then `V = Bᵀ · tilesᵀ`:
    /// shape `tile_in² × (in_channels · tiles)`
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
    fn transform_input(&mut self, src: &[T], scratch: &mut [T]) -> Result<()> {
        let tiled_len = self.input_layout.tiled_len();
        self.input_layout.to_tiled(src, &mut scratch[..tiled_len])?;

        let positions = self.geometry.positions();
        self.gemm.gemm(
            Transpose::Yes,
            Transpose::Yes,
            positions,
            self.config.in_channels * self.geometry.tile_count(),
            positions,
            T::one(),
            self.b.as_slice(),
            &scratch[..tiled_len],
            T::zero(),
            &mut self.workspace.transformed_input,
        )
    }

    /// Per tile position `j`: `M[j] = U[j] · V[j]`, written to `scratch` as
    /// `tile_in² × (out_channels · tiles)`
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
    fn multiply(&self, scratch: &mut [T]) -> Result<()> {
        let ic = self.config.in_channels;
        let oc = self.config.out_channels;
        let tiles = self.geometry.tile_count();
        let positions = self.geometry.positions();
        let weights = &self.workspace.transformed_weight;
        let inputs = &self.workspace.transformed_input;
        let product = &mut scratch[..positions * oc * tiles];

        let position = |j: usize, out: &mut [T]| {
            self.gemm.gemm(
                Transpose::No,
                Transpose::No,
                oc,
                tiles,
                ic,
                T::one(),
                &weights[j * oc * ic..(j + 1) * oc * ic],
                &inputs[j * ic * tiles..(j + 1) * ic * tiles],
                T::zero(),
                out,
            )
        };

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            product
                .par_chunks_mut(oc * tiles)
                .enumerate()
                .try_for_each(|(j, out)| position(j, out))
        }

        #[cfg(not(feature = "parallel"))]
        {
            product
                .chunks_mut(oc * tiles)
                .enumerate()
                .try_for_each(|(j, out)| position(j, out))
        }
    }

    /// `Y = Mᵀ · A` (shape `(out_channels · tiles) × tile_out²`), then detiling into `dst`
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
    fn transform_output(&mut self, scratch: &[T], dst: &mut [T]) -> Result<()> {
        let (positions, outputs) = self.a.shape();
        let rows = self.config.out_channels * self.geometry.tile_count();
        self.gemm.gemm(
            Transpose::Yes,
            Transpose::No,
            rows,
            outputs,
            positions,
            T::one(),
            &scratch[..positions * rows],
            self.a.as_slice(),
            T::zero(),
            &mut self.workspace.spatial_tiles,
        )?;
        self.output_layout
            .from_tiled(&self.workspace.spatial_tiles, dst)
    }

    fn add_bias(&self, bias: &[T], dst: &mut [T]) {
        let plane = self.config.out_height() * self.config.out_width();
        for (channel, &b) in dst.chunks_mut(plane).zip(bias) {
            for v in channel {
                *v += b;
            }
        }
    }
}
