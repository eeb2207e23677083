//! Error types for the color_probe library

use thiserror::Error;

/// Result type alias for color_probe operations
pub type Result<T> = std::result::Result<T, VisionError>;

#[derive(Error, Debug)]
pub enum VisionError {
    /// Kernel matrix is empty, not square, even-sized or holds a non-finite weight
    #[error("Invalid kernel: {reason}")]
    InvalidKernel { reason: String },

    /// Buffer length does not match the declared dimensions
    #[error("Size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Frame dimensions cannot describe a valid frame for the requested format
    #[error("Invalid frame dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    /// Capture session was asked to move between two states that are not linked
    #[error("Invalid session transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Frame source failed to open or to deliver a frame
    #[error("Frame source error: {message}")]
    Source { message: String },

    /// Background capture task ended abnormally
    #[error("Capture task failed: {message}")]
    CaptureTask { message: String },

    /// Configuration value is missing or out of range
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl VisionError {
    pub fn invalid_kernel(reason: impl Into<String>) -> Self {
        Self::InvalidKernel {
            reason: reason.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn source_message(message: impl Into<String>) -> Self {
        Self::Source {
            message: message.into(),
        }
    }
}
