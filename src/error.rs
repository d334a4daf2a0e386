//! Error types for the watermark-compositor crate.

/// Errors that can occur while building alpha maps or processing images.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to decode a background capture PNG.
    #[error("failed to decode background capture PNG: {0}")]
    AlphaMapDecode(image::ImageError),

    /// A background capture does not have the dimensions its size class requires.
    #[error("background capture is {width}x{height}, expected {expected}x{expected}")]
    BadCaptureDimensions {
        /// Required edge length for the size class (48 or 96).
        expected: u32,
        /// Actual capture width in pixels.
        width: u32,
        /// Actual capture height in pixels.
        height: u32,
    },

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred during image processing (load, save, encode).
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
