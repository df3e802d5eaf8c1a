//! Image processing: identify, EXIF extraction and WebP variant encoding.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `ImageReader::into_dimensions` (header only) |
//! | **EXIF metadata** | `kamadak-exif` (JPEG, PNG, WebP containers) |
//! | **Resize** | Lanczos3 via `image::DynamicImage::resize_exact` |
//! | **Encode → WebP** | `webp::Encoder` (lossy, per-variant quality) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
pub mod calculations;
pub(crate) mod exif_reader;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ExifData, GpsCoordinates, ImageBackend, ImageMetadata};
pub use operations::{create_variant, get_dimensions, plan_variant};
pub use params::{Quality, ResizeParams, VariantSpec};
pub use rust_backend::RustBackend;
