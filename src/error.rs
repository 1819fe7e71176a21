//! Error types for winoconv operations

use thiserror::Error;

/// Result type for winoconv operations
pub type Result<T> = std::result::Result<T, WinogradError>;

/// Errors that can occur while configuring or running a Winograd convolution
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WinogradError {
    /// Kernel is not 3x3
    #[error("Unsupported kernel size {height}x{width}: Winograd variants are defined for 3x3 kernels only")]
    UnsupportedKernel {
        /// Kernel height
        height: usize,
        /// Kernel width
        width: usize,
    },

    /// Stride is not 1x1
    #[error("Unsupported stride {height}x{width}: Winograd variants require stride 1")]
    UnsupportedStride {
        /// Vertical stride
        height: usize,
        /// Horizontal stride
        width: usize,
    },

    /// Grouped convolution requested
    #[error("Unsupported group count {0}: only groups = 1 is supported")]
    UnsupportedGroups(usize),

    /// Name or tile size that does not identify a defined variant
    #[error("Unsupported Winograd variant: {0}")]
    UnsupportedVariant(String),

    /// Degenerate or inconsistent convolution geometry
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Caller-supplied buffer cannot hold the computed tile geometry
    #[error("Buffer too small for {buffer}: need {required} elements, got {actual}")]
    BufferTooSmall {
        /// Which buffer was undersized
        buffer: &'static str,
        /// Minimum number of elements
        required: usize,
        /// Elements actually supplied
        actual: usize,
    },

    /// Operand length disagrees with its declared shape
    #[error("Size mismatch: expected {expected}, got {actual}")]
    SizeMismatch {
        /// Expected size
        expected: usize,
        /// Actual size
        actual: usize,
    },
}

impl WinogradError {
    /// Returns true for errors raised while validating a configuration.
    ///
    /// These are fatal to the engine being built; there is no degraded mode.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            WinogradError::UnsupportedKernel { .. }
                | WinogradError::UnsupportedStride { .. }
                | WinogradError::UnsupportedGroups(_)
                | WinogradError::UnsupportedVariant(_)
                | WinogradError::InvalidConfig(_)
        )
    }
}
