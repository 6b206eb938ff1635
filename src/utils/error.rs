// src/utils/error.rs

use std::fmt;

/// The primary error type for all operations in the separation engine.
#[derive(Debug)]
pub enum SepError {
    /// An error occurred during I/O operations (e.g., file not found, permission denied).
    Io(std::io::Error),
    /// The file could not be opened or its header/directory structure is unreadable.
    OpenFailed(String),
    /// The image uses a bit depth other than 8 bits per sample.
    UnsupportedBitDepth(u16),
    /// Width, height, or samples-per-pixel is zero.
    InvalidDimensions {
        width: u32,
        height: u32,
        samples_per_pixel: u16,
    },
    /// Reading a pixel row failed; the partially filled buffer is discarded.
    ScanlineReadFailed { row: u32 },
    /// Writing a pixel row failed; the destination file is left indeterminate.
    ScanlineWriteFailed { row: u32 },
    /// The raster buffer is empty where pixel data is required.
    EmptyBuffer,
    /// The image's channel fingerprint does not match the donor template.
    TemplateMismatch {
        image_samples: u16,
        image_extras: u16,
        template_samples: u16,
        template_extras: u16,
    },
    /// The photometric interpretation, layout, or compression is not handled.
    Unsupported(String),
    /// An invalid argument or malformed raster was provided to a stage.
    InvalidInput(String),
    /// Occurs when raster dimensions do not match the expected dimensions.
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
    /// A threshold parameter lies outside its valid range.
    InvalidThreshold(u16),
}

impl std::error::Error for SepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SepError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for SepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SepError::Io(err) => write!(f, "I/O error: {}", err),
            SepError::OpenFailed(msg) => write!(f, "Open failed: {}", msg),
            SepError::UnsupportedBitDepth(bits) => {
                write!(f, "Unsupported bit depth: {} (only 8 bits per sample)", bits)
            }
            SepError::InvalidDimensions {
                width,
                height,
                samples_per_pixel,
            } => write!(
                f,
                "Invalid dimensions: {}x{} with {} samples per pixel",
                width, height, samples_per_pixel
            ),
            SepError::ScanlineReadFailed { row } => {
                write!(f, "Failed to read scanline {}", row)
            }
            SepError::ScanlineWriteFailed { row } => {
                write!(f, "Failed to write scanline {}", row)
            }
            SepError::EmptyBuffer => write!(f, "Raster buffer is empty"),
            SepError::TemplateMismatch {
                image_samples,
                image_extras,
                template_samples,
                template_extras,
            } => write!(
                f,
                "Template mismatch: image has {} samples / {} extras, template expects {} / {}",
                image_samples, image_extras, template_samples, template_extras
            ),
            SepError::Unsupported(msg) => write!(f, "Unsupported: {}", msg),
            SepError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            SepError::DimensionMismatch { expected, actual } => write!(
                f,
                "Dimension mismatch: expected ({}, {}), but got ({}, {})",
                expected.0, expected.1, actual.0, actual.1
            ),
            SepError::InvalidThreshold(t) => {
                write!(f, "Invalid threshold: {} (must be in 1..=255)", t)
            }
        }
    }
}

impl From<std::io::Error> for SepError {
    fn from(err: std::io::Error) -> Self {
        SepError::Io(err)
    }
}

/// A specialized `Result` type for separation-engine operations.
pub type Result<T> = std::result::Result<T, SepError>;
