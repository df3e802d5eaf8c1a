//! Per-image metadata sidecar (`<seq>/meta.json`).
//!
//! The sidecar is a flat JSON record built from the decoded metadata of an
//! original. Every field is present in the output and serializes as `null`
//! when unknown, so consumers can rely on a fixed shape:
//!
//! ```json
//! {
//!   "original_file": "a.jpg",
//!   "album": "doors",
//!   "sequence": "001",
//!   "width": 4000,
//!   "height": 3000,
//!   "format": "jpeg",
//!   "orientation": 1,
//!   "taken_at": "2023-06-01T18:30:00",
//!   "camera": { "make": "FUJIFILM", "model": "X-T4" },
//!   "lens": "XF23mmF1.4 R",
//!   "iso": 400,
//!   "aperture": 2.8,
//!   "focal_length": 23.0,
//!   "exposure_time": 0.004,
//!   "gps": { "lat": 48.8584, "lon": 2.2945 }
//! }
//! ```
//!
//! A sidecar is only built when the original carries an EXIF block; the
//! processor treats a missing block as a non-fatal item error. Once written,
//! a sidecar is never replaced.

use crate::imaging::{GpsCoordinates, ImageMetadata};
use crate::types::SIDECAR_FILENAME;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SidecarError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub make: Option<String>,
    pub model: Option<String>,
}

/// Contents of `meta.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataSidecar {
    pub original_file: String,
    pub album: String,
    pub sequence: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub format: Option<String>,
    pub orientation: Option<u32>,
    pub taken_at: Option<String>,
    pub camera: Camera,
    pub lens: Option<String>,
    pub iso: Option<u32>,
    pub aperture: Option<f64>,
    pub focal_length: Option<f64>,
    pub exposure_time: Option<f64>,
    pub gps: Option<GpsCoordinates>,
}

impl MetadataSidecar {
    /// Build the sidecar for one original.
    ///
    /// Returns `None` when the metadata has no EXIF block. Zero dimensions
    /// are reported as unknown.
    pub fn from_metadata(
        original_file: &str,
        album: &str,
        sequence: &str,
        meta: &ImageMetadata,
    ) -> Option<Self> {
        let exif = meta.exif.as_ref()?;
        Some(Self {
            original_file: original_file.to_string(),
            album: album.to_string(),
            sequence: sequence.to_string(),
            width: non_zero(meta.width),
            height: non_zero(meta.height),
            format: meta.format.clone(),
            orientation: exif.orientation,
            taken_at: exif.taken_at.clone(),
            camera: Camera {
                make: exif.make.clone(),
                model: exif.model.clone(),
            },
            lens: exif.lens.clone(),
            iso: exif.iso,
            aperture: exif.aperture,
            focal_length: exif.focal_length,
            exposure_time: exif.exposure_time,
            gps: exif.gps,
        })
    }

    /// Location of the sidecar inside a sequence directory.
    pub fn path(seq_dir: &Path) -> PathBuf {
        seq_dir.join(SIDECAR_FILENAME)
    }

    /// Write the sidecar as pretty JSON into `seq_dir`.
    pub fn write(&self, seq_dir: &Path) -> Result<PathBuf, SidecarError> {
        let path = Self::path(seq_dir);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).map_err(|source| SidecarError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

fn non_zero(value: u32) -> Option<u32> {
    (value > 0).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::ExifData;
    use crate::imaging::backend::tests::sample_exif;
    use tempfile::TempDir;

    fn metadata(exif: Option<ExifData>) -> ImageMetadata {
        ImageMetadata {
            width: 4000,
            height: 3000,
            format: Some("jpeg".to_string()),
            exif,
        }
    }

    #[test]
    fn builds_from_full_exif() {
        let sidecar =
            MetadataSidecar::from_metadata("a.jpg", "doors", "001", &metadata(Some(sample_exif())))
                .unwrap();

        assert_eq!(sidecar.sequence, "001");
        assert_eq!(sidecar.width, Some(4000));
        assert_eq!(sidecar.camera.make.as_deref(), Some("FUJIFILM"));
        assert_eq!(sidecar.iso, Some(400));
        assert_eq!(sidecar.gps.map(|g| g.lat), Some(48.8584));
    }

    #[test]
    fn no_exif_block_means_no_sidecar() {
        assert!(MetadataSidecar::from_metadata("a.jpg", "doors", "001", &metadata(None)).is_none());
    }

    #[test]
    fn absent_fields_serialize_as_null() {
        let sidecar = MetadataSidecar::from_metadata(
            "a.jpg",
            "doors",
            "002",
            &metadata(Some(ExifData::default())),
        )
        .unwrap();

        let value = serde_json::to_value(&sidecar).unwrap();
        assert_eq!(value["taken_at"], serde_json::Value::Null);
        assert_eq!(value["gps"], serde_json::Value::Null);
        assert_eq!(value["lens"], serde_json::Value::Null);
        assert_eq!(
            value["camera"],
            serde_json::json!({"make": null, "model": null})
        );
        assert_eq!(value["format"], "jpeg");
    }

    #[test]
    fn zero_dimensions_are_unknown() {
        let mut meta = metadata(Some(ExifData::default()));
        meta.width = 0;
        let sidecar = MetadataSidecar::from_metadata("a.jpg", "doors", "001", &meta).unwrap();
        assert_eq!(sidecar.width, None);
        assert_eq!(sidecar.height, Some(3000));
    }

    #[test]
    fn write_produces_parseable_file() {
        let tmp = TempDir::new().unwrap();
        let sidecar =
            MetadataSidecar::from_metadata("a.jpg", "doors", "001", &metadata(Some(sample_exif())))
                .unwrap();

        let path = sidecar.write(tmp.path()).unwrap();
        assert_eq!(path, tmp.path().join("meta.json"));

        let back: MetadataSidecar =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, sidecar);
    }
}
