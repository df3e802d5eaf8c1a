//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the pipeline needs
//! from an imaging engine: identify, read_metadata and resize. The pipeline
//! never touches pixels or EXIF bytes itself.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): pure Rust decoders from
//! the `image` crate, lossy WebP through `webp` (libwebp), EXIF through `kamadak-exif`.

use super::params::ResizeParams;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// GPS position in signed decimal degrees (south and west are negative).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsCoordinates {
    pub lat: f64,
    pub lon: f64,
}

/// EXIF fields the pipeline cares about. Every field is optional; cameras
/// and editors write wildly different subsets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExifData {
    pub orientation: Option<u32>,
    /// DateTimeOriginal as ISO-8601 (`2023-06-01T18:30:00`).
    pub taken_at: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub lens: Option<String>,
    pub iso: Option<u32>,
    /// F-number, e.g. `2.8`.
    pub aperture: Option<f64>,
    /// Focal length in millimetres.
    pub focal_length: Option<f64>,
    /// Exposure time in seconds.
    pub exposure_time: Option<f64>,
    pub gps: Option<GpsCoordinates>,
}

/// Decoded metadata of a source image.
///
/// `exif` is `None` when the file carries no EXIF block at all, which is
/// different from an EXIF block whose fields are all missing.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    /// Container format in lowercase (`jpeg`, `png`, `webp`).
    pub format: Option<String>,
    pub exif: Option<ExifData>,
}

/// Trait for image processing backends.
pub trait ImageBackend {
    /// Get image dimensions.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode metadata: dimensions, format and EXIF if present.
    fn read_metadata(&self, path: &Path) -> Result<ImageMetadata, BackendError>;

    /// Resize to the exact dimensions in `params` and encode to `params.output`.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;
}
