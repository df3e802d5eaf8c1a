//! Shared test utilities for the photo-ingest test suite.
//!
//! Provides synthetic image writers (plain JPEG/PNG and JPEG with an embedded
//! EXIF block) and a small builder for `originals/` + `generated/` trees.
//!
//! # Usage
//!
//! ```text
//! use crate::test_helpers::*;
//!
//! let ws = Workspace::new();
//! ws.add_original("doors", "a.jpg");
//! ws.add_original("doors", "notes.txt");
//! let manifest = ws.read_manifest("doors");
//! ```

use exif::experimental::Writer;
use exif::{Field, In, Tag, Value};
use image::{ImageEncoder, RgbImage, RgbaImage};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =========================================================================
// Synthetic images
// =========================================================================

/// Create a small valid JPEG file with the given dimensions.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::write(path, encode_jpeg(width, height)).unwrap();
}

/// Create a small valid RGBA PNG file with the given dimensions.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 64, 200])
    });
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}

fn encode_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    out
}

/// Create a JPEG carrying an APP1 EXIF segment with Make and Model set.
pub fn jpeg_with_exif(path: &Path, width: u32, height: u32, make: &str, model: &str) {
    let fields = [
        Field {
            tag: Tag::Make,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![make.as_bytes().to_vec()]),
        },
        Field {
            tag: Tag::Model,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![model.as_bytes().to_vec()]),
        },
    ];
    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).unwrap();
    let tiff = tiff.into_inner();

    let jpeg = encode_jpeg(width, height);
    let segment_len = (2 + 6 + tiff.len()) as u16;

    // SOI, then APP1 "Exif\0\0" + TIFF, then the rest of the encoded stream
    let mut out = Vec::with_capacity(jpeg.len() + tiff.len() + 10);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    std::fs::write(path, out).unwrap();
}

// =========================================================================
// Workspace fixture
// =========================================================================

/// Temp directory laid out like a project: `originals/`, `generated/`, `logs/`.
pub struct Workspace {
    pub tmp: TempDir,
}

impl Workspace {
    /// Create a workspace with an (empty) originals root.
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("originals")).unwrap();
        Self { tmp }
    }

    /// Create a workspace without the originals root.
    pub fn without_originals() -> Self {
        Self {
            tmp: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    pub fn originals(&self) -> PathBuf {
        self.root().join("originals")
    }

    pub fn generated(&self) -> PathBuf {
        self.root().join("generated")
    }

    pub fn logs(&self) -> PathBuf {
        self.root().join("logs")
    }

    /// Write a placeholder original of 10 000 bytes; returns its path.
    pub fn add_original(&self, album: &str, filename: &str) -> PathBuf {
        let dir = self.originals().join(album);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(filename);
        std::fs::write(&path, vec![7u8; 10_000]).unwrap();
        path
    }

    /// Pre-seed an album manifest in the generated tree.
    pub fn write_manifest(&self, album: &str, entries: &[(&str, &str)]) {
        let dir = self.generated().join(album);
        std::fs::create_dir_all(&dir).unwrap();
        let map: BTreeMap<&str, &str> = entries.iter().copied().collect();
        std::fs::write(
            dir.join("_manifest.json"),
            serde_json::to_string_pretty(&map).unwrap(),
        )
        .unwrap();
    }

    /// Read an album manifest back as a plain map. Panics if missing.
    pub fn read_manifest(&self, album: &str) -> BTreeMap<String, String> {
        let path = self.generated().join(album).join("_manifest.json");
        let content = std::fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("manifest for '{album}' not found at {}", path.display()));
        serde_json::from_str(&content).unwrap()
    }

    /// Path of a file inside a sequence directory.
    pub fn output(&self, album: &str, seq: &str, file: &str) -> PathBuf {
        self.generated().join(album).join(seq).join(file)
    }

    /// All files (relative paths) below the generated root, sorted.
    pub fn generated_files(&self) -> Vec<String> {
        let root = self.generated();
        if !root.exists() {
            return Vec::new();
        }
        let mut files: Vec<String> = walkdir::WalkDir::new(&root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                e.path()
                    .strip_prefix(&root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        files.sort();
        files
    }

    /// The single log file written under `logs/<subdir>/`, parsed as JSON.
    pub fn single_log(&self, subdir: &str) -> serde_json::Value {
        let dir = self.logs().join(subdir);
        let entries: Vec<PathBuf> = std::fs::read_dir(&dir)
            .unwrap_or_else(|_| panic!("log dir {} missing", dir.display()))
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(entries.len(), 1, "expected one log in {}: {entries:?}", dir.display());
        serde_json::from_str(&std::fs::read_to_string(&entries[0]).unwrap()).unwrap()
    }
}
