//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the output dimensions for a width-bounded resize.
///
/// The source is scaled down so its width does not exceed `max_width`,
/// keeping the aspect ratio. Images already at or below `max_width` keep
/// their original dimensions. Variants are never upscaled.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `max_width` - Upper bound on the output width
///
/// # Returns
/// * `(width, height)` - Output dimensions, each at least 1px
pub fn fit_to_width(source: (u32, u32), max_width: u32) -> (u32, u32) {
    let (src_w, src_h) = source;

    if src_w <= max_width || src_w == 0 {
        return source;
    }

    let scale = max_width as f64 / src_w as f64;
    let h = ((src_h as f64 * scale).round() as u32).max(1);
    (max_width, h)
}

/// Compression ratio of a processed image: `1 - (variant bytes / original bytes)`.
///
/// `None` when the original is empty (the ratio is undefined).
pub fn compression_ratio(original_bytes: u64, variant_bytes: u64) -> Option<f64> {
    if original_bytes == 0 {
        return None;
    }
    Some(1.0 - variant_bytes as f64 / original_bytes as f64)
}
