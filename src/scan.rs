//! Directory listing for both jobs.
//!
//! Both jobs see the filesystem through two flat listings:
//!
//! ```text
//! images/originals/                # list_albums → ["doors", "nature"]
//! ├── doors/                       # list_images → ["a.jpg", "b.PNG"]
//! │   ├── a.jpg
//! │   ├── b.PNG
//! │   └── notes.txt                # not an image, never listed
//! ├── nature/
//! │   └── fern.webp
//! └── README.md                    # not a directory, never an album
//! ```
//!
//! Listings are one level deep and sorted by file name, so runs are
//! deterministic. Entries whose names are not valid UTF-8 cannot become
//! manifest keys or SQL values; they are returned separately in
//! [`Listing::invalid`] so the caller can report them. Entries that cannot
//! be inspected at all (a dangling symlink, a permission error) go to
//! [`Listing::unreadable`]. Only a root that is missing or cannot be read
//! fails the whole listing.

use crate::types::IMAGE_EXTENSIONS;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {0}")]
    NotFound(PathBuf),
    #[error("Cannot list {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// A listed entry with a UTF-8 name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub path: PathBuf,
}

/// Result of listing one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub entries: Vec<Entry>,
    /// Matching entries whose names are not valid UTF-8.
    pub invalid: Vec<PathBuf>,
    /// Entries that could not be inspected, with the reason.
    pub unreadable: Vec<(PathBuf, String)>,
}

impl Listing {
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.invalid.is_empty() && self.unreadable.is_empty()
    }

    /// Number of entries, listed or not.
    pub fn discovered(&self) -> usize {
        self.entries.len() + self.invalid.len() + self.unreadable.len()
    }
}

/// Immediate subdirectories of `root`, sorted by name.
///
/// Symlinked directories count as albums. Any entry that cannot be
/// inspected is reported as unreadable, since it may be an album.
pub fn list_albums(root: &Path) -> Result<Listing, ScanError> {
    list(root, |entry| entry.file_type().is_dir(), |_| true)
}

/// Image files directly inside `album_dir`, sorted by name.
///
/// Extensions are matched case-insensitively against [`IMAGE_EXTENSIONS`].
pub fn list_images(album_dir: &Path) -> Result<Listing, ScanError> {
    list(
        album_dir,
        |entry| entry.file_type().is_file() && is_image(entry.path()),
        is_image,
    )
}

/// Whether `path` has one of the accepted image extensions.
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}

fn list(
    dir: &Path,
    keep: impl Fn(&walkdir::DirEntry) -> bool,
    keep_unreadable: impl Fn(&Path) -> bool,
) -> Result<Listing, ScanError> {
    if !dir.is_dir() {
        return Err(ScanError::NotFound(dir.to_path_buf()));
    }

    let mut listing = Listing::default();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) if source.depth() == 0 => {
                return Err(ScanError::Walk {
                    path: dir.to_path_buf(),
                    source,
                });
            }
            Err(source) => {
                let path = source.path().unwrap_or(dir).to_path_buf();
                if keep_unreadable(&path) {
                    let reason = source
                        .io_error()
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| source.to_string());
                    listing.unreadable.push((path, reason));
                }
                continue;
            }
        };
        if !keep(&entry) {
            continue;
        }
        match entry.file_name().to_str() {
            Some(name) => listing.entries.push(Entry {
                name: name.to_string(),
                path: entry.path().to_path_buf(),
            }),
            None => listing.invalid.push(entry.path().to_path_buf()),
        }
    }

    Ok(listing)
}
