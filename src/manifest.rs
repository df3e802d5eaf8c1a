//! Per-album processing manifest.
//!
//! The manifest is the single source of truth for "has this original been
//! processed". It maps each original filename to its padded sequence id and
//! lives at `<generated>/<album>/_manifest.json`:
//!
//! ```json
//! {
//!   "a.jpg": "001",
//!   "b.jpg": "002"
//! }
//! ```
//!
//! # Contract
//!
//! - **load**: an absent file is an empty manifest. A file that exists but
//!   does not parse is an error. It is never silently replaced, because
//!   that would hand out already-used sequence numbers again.
//! - **assign**: gives a new filename `max(existing) + 1` (or 1) and records
//!   it immediately. Existing entries are never changed.
//! - **save**: writes the whole map once, creating the album directory if
//!   needed.
//!
//! Numbering tolerates gaps: if an earlier run died after reserving `004`
//! but before saving, the next run simply continues from the highest saved
//! value.

use crate::naming::{pad_sequence, parse_sequence};
use crate::types::MANIFEST_FILENAME;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("cannot access manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("manifest {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot encode manifest {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Filename → padded sequence mapping for one album.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlbumManifest {
    entries: BTreeMap<String, String>,
}

impl AlbumManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Location of the manifest inside an album's output directory.
    pub fn path(album_dir: &Path) -> PathBuf {
        album_dir.join(MANIFEST_FILENAME)
    }

    /// Load the manifest of an album output directory (empty if absent).
    pub fn load(album_dir: &Path) -> Result<Self, ManifestError> {
        let path = Self::path(album_dir);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(source) => return Err(ManifestError::Io { path, source }),
        };
        serde_json::from_str(&content).map_err(|source| ManifestError::Parse { path, source })
    }

    /// Persist the manifest, creating the album output directory if needed.
    pub fn save(&self, album_dir: &Path) -> Result<(), ManifestError> {
        let path = Self::path(album_dir);
        std::fs::create_dir_all(album_dir).map_err(|source| ManifestError::Io {
            path: path.clone(),
            source,
        })?;
        let json = serde_json::to_string_pretty(self).map_err(|source| ManifestError::Encode {
            path: path.clone(),
            source,
        })?;
        std::fs::write(&path, json).map_err(|source| ManifestError::Io { path, source })
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.entries.contains_key(filename)
    }

    pub fn get(&self, filename: &str) -> Option<&str> {
        self.entries.get(filename).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Next free sequence number: highest assigned value + 1, or 1.
    ///
    /// Values that don't parse as integers are ignored.
    pub fn next_sequence(&self) -> u32 {
        self.entries
            .values()
            .filter_map(|v| parse_sequence(v))
            .max()
            .map_or(1, |max| max.saturating_add(1))
    }

    /// Assign the next sequence number to `filename` and record it.
    ///
    /// Returns `None` (and changes nothing) if the file already has one.
    pub fn assign(&mut self, filename: &str) -> Option<u32> {
        if self.contains(filename) {
            return None;
        }
        let seq = self.next_sequence();
        self.entries.insert(filename.to_string(), pad_sequence(seq));
        Some(seq)
    }
}
