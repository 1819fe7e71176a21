//! Engine-owned intermediate buffers
//!
//! Every buffer the pipeline needs besides the caller's scratch is allocated
//! once, at engine construction, from size formulas derived from the
//! configuration. Nothing is allocated inside the stages themselves.

use crate::config::ConvolutionConfig;
use crate::variant::WinogradVariant;
use crate::Element;

/// Sizes (in elements) of the named pipeline buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkspaceLayout {
    /// `tile_in² × in_channels × out_channels`
    pub transformed_weight: usize,
    /// `tile_in² × in_channels × tiles_h × tiles_w`
    pub transformed_input: usize,
    /// `out_channels × tiles_h × tiles_w × tile_out²`
    pub spatial_tiles: usize,
    /// Caller-owned: `max(in_channels, out_channels) × tiles_h × tiles_w × tile_in²`
    pub scratch: usize,
}

impl WorkspaceLayout {
    /// Computes buffer sizes for `config` under `variant`
    pub fn new(config: &ConvolutionConfig, variant: WinogradVariant) -> Self {
        let g = config.geometry(variant);
        let positions = g.positions();
        let tiles = g.tile_count();
        Self {
            transformed_weight: positions * config.in_channels * config.out_channels,
            transformed_input: positions * config.in_channels * tiles,
            spatial_tiles: config.out_channels * tiles * g.tile_out * g.tile_out,
            scratch: config.scratch_len(variant),
        }
    }

    /// Elements owned by the engine (scratch excluded)
    pub fn owned_len(&self) -> usize {
        self.transformed_weight + self.transformed_input + self.spatial_tiles
    }
}

/// Engine-owned buffers, sized by a [`WorkspaceLayout`]
#[derive(Debug, Clone)]
pub struct Workspace<T> {
    layout: WorkspaceLayout,
    pub(crate) transformed_weight: Vec<T>,
    pub(crate) transformed_input: Vec<T>,
    pub(crate) spatial_tiles: Vec<T>,
}

impl<T: Element> Workspace<T> {
    /// Allocates zeroed buffers for `layout`
    pub fn new(layout: WorkspaceLayout) -> Self {
        Self {
            layout,
            transformed_weight: vec![T::zero(); layout.transformed_weight],
            transformed_input: vec![T::zero(); layout.transformed_input],
            spatial_tiles: vec![T::zero(); layout.spatial_tiles],
        }
    }

    /// Buffer sizes
    pub fn layout(&self) -> WorkspaceLayout {
        self.layout
    }

    /// Bytes held by the engine-owned buffers
    pub fn allocated_bytes(&self) -> usize {
        self.layout.owned_len() * std::mem::size_of::<T>()
    }

    /// Weights in the Winograd domain, one `out × in` matrix per tile position
    pub fn transformed_weight(&self) -> &[T] {
        &self.transformed_weight
    }
}
