//! Shared types used by both jobs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Extension of every encoded variant file.
pub const VARIANT_EXTENSION: &str = "webp";

/// Name of the per-image metadata sidecar.
pub const SIDECAR_FILENAME: &str = "meta.json";

/// Name of the per-album manifest inside the generated tree.
pub const MANIFEST_FILENAME: &str = "_manifest.json";

/// Source extensions accepted as originals (matched case-insensitively).
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// One of the fixed renditions produced for every original.
///
/// The set is closed: widths and qualities are configurable, names are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Thumb,
    Medium,
    Full,
}

impl Variant {
    /// All variants, in generation order.
    pub const ALL: [Variant; 3] = [Variant::Thumb, Variant::Medium, Variant::Full];

    pub fn name(self) -> &'static str {
        match self {
            Variant::Thumb => "thumb",
            Variant::Medium => "medium",
            Variant::Full => "full",
        }
    }

    /// File name of this variant inside a sequence directory, e.g. `thumb.webp`.
    pub fn filename(self) -> String {
        format!("{}.{}", self.name(), VARIANT_EXTENSION)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Title and description an album is published with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlbumInfo {
    pub title: String,
    #[serde(default)]
    pub description: String,
}
