//! Winoconv: Winograd-Domain 2D Convolution
//!
//! **Winoconv** computes stride-1, 3×3 convolutions by moving small input tiles
//! into the Winograd domain, where the sliding-window product collapses into one
//! elementwise multiply per tile position, and transforming the result back.
//! Every transform and every channel contraction is a dense matrix multiply.
//!
//! Two algorithm variants are provided:
//!
//! 1. **F(6×6, 3×3)** ("wt8x8") - 8×8 input tiles, 6×6 output tiles
//! 2. **F(4×4, 3×3)** ("wt6x6") - 6×6 input tiles, 4×4 output tiles
//!
//! # Design Principles
//!
//! - **Build transforms once**: each `(variant, role)` matrix is constructed on first
//!   use and shared through a [`TransformCache`]
//! - **Pluggable GEMM**: the pipeline only needs a row-major [`Gemm`]; a blocked
//!   backend ships by default and a naive one serves as a baseline
//! - **No hidden allocation**: engine buffers are sized once at construction and the
//!   largest temporary is caller-owned scratch
//! - **Checked against the direct method**: [`reference::conv2d_direct`] is the oracle
//!
//! # Quick Start
//!
//! ```rust
//! use winoconv::{ConvolutionConfig, TransformCache, WinogradConv, WinogradVariant};
//!
//! let cache = TransformCache::<f32>::new();
//! let config = ConvolutionConfig::new(3, 8, 32, 32).with_padding(1);
//! let mut conv = WinogradConv::new(WinogradVariant::F6x6, config, &cache).unwrap();
//!
//! let input = vec![1.0f32; config.input_len()];
//! let weights = vec![0.01f32; config.weight_len()];
//! let mut scratch = vec![0.0f32; conv.scratch_len()];
//!
//! let output = conv.infer(&input, &weights, &mut scratch).unwrap();
//! assert_eq!(output.shape(), (1, 8, 32, 32));
//! ```
//!
//! # Features
//!
//! - `parallel`: runs tile-position multiplies and large GEMMs on rayon
//! - `tracing`: emits spans for every pipeline stage

pub mod backends;
pub mod config;
pub mod element;
pub mod engine;
pub mod error;
pub mod layout;
pub mod matrix;
pub mod reference;
pub mod tensor;
pub mod transform;
pub mod variant;
pub mod workspace;

pub use backends::{BlockedGemm, Gemm, NaiveGemm, Transpose};
pub use config::{ConvolutionConfig, TileGeometry};
pub use element::Element;
pub use engine::WinogradConv;
pub use error::{Result, WinogradError};
pub use layout::TileLayout;
pub use matrix::Matrix;
pub use tensor::Tensor;
pub use transform::TransformCache;
pub use variant::{TransformRole, WinogradVariant, KERNEL_SIZE};
pub use workspace::{Workspace, WorkspaceLayout};
