//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take a variant spec, compute parameters, and call the backend.

use super::backend::{BackendError, ImageBackend};
use super::calculations::fit_to_width;
use super::params::{ResizeParams, VariantSpec};
use crate::types::Variant;
use std::path::{Path, PathBuf};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// Plan a variant resize without executing it.
pub fn plan_variant(
    source: &Path,
    output_path: &Path,
    original_dims: (u32, u32),
    spec: &VariantSpec,
) -> ResizeParams {
    let (width, height) = fit_to_width(original_dims, spec.width);

    ResizeParams {
        source: source.to_path_buf(),
        output: output_path.to_path_buf(),
        width,
        height,
        quality: spec.quality(),
    }
}

/// Encode one variant of `source` into `output_dir`.
///
/// Returns the path of the written file (`<output_dir>/<variant>.webp`).
pub fn create_variant(
    backend: &impl ImageBackend,
    source: &Path,
    output_dir: &Path,
    variant: Variant,
    original_dims: (u32, u32),
    spec: &VariantSpec,
) -> Result<PathBuf> {
    let output = output_dir.join(variant.filename());
    let params = plan_variant(source, &output, original_dims, spec);
    backend.resize(&params)?;
    Ok(output)
}
