//! # photo-ingest
//!
//! Batch ingestion for a photo portfolio. Originals are dropped into album
//! directories; this crate turns them into web-sized WebP variants with
//! EXIF sidecars, and emits the database commands that register the albums.
//!
//! # Architecture: Two Independent Jobs
//!
//! The jobs share no runtime state. They communicate only through the
//! filesystem, so each can be rerun on its own:
//!
//! ```text
//! 1. Process   images/originals/  →  images/generated/   (variants, sidecars, manifests)
//! 2. Sync      images/generated/  →  sync-db.sh + db-sync/sync_<stamp>.sql
//! ```
//!
//! Both jobs are idempotent. The processor never touches an original twice
//! (the per-album manifest remembers it) and never overwrites an output file.
//! The sync generator emits `INSERT OR IGNORE` statements, so running its
//! script repeatedly is harmless. Each run leaves a JSON log under `logs/`.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`process`] | Album processor: sequence assignment, variants, sidecars, progress events |
//! | [`sync`] | Album sync generator: SQL literals, shell quoting, script and SQL files |
//! | [`manifest`] | Per-album filename → sequence map with its load / assign / save contract |
//! | [`sidecar`] | `meta.json` record built from decoded metadata |
//! | [`run_log`] | Per-run JSON audit record with status and counts |
//! | [`scan`] | Sorted one-level listings of albums and images |
//! | [`config`] | `photo-ingest.toml` loading, merging over stock defaults, validation |
//! | [`imaging`] | Backend trait, dimension math, `image` + `webp` + `kamadak-exif` backend |
//! | [`naming`] | Sequence padding, fallback titles, run stamps |
//! | [`types`] | Variant set and shared file-name constants |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## The Manifest Is the Source of Truth
//!
//! Whether an original was processed is answered by its album manifest, not
//! by looking for output files. Sequence numbers are therefore stable even if
//! outputs are deleted, and a renamed original is treated as a new photo.
//!
//! ## Backend Behind a Trait
//!
//! All pixel and EXIF work goes through [`imaging::ImageBackend`]. The job
//! logic is tested against a recording mock; only the backend's own tests
//! and the integration tests decode real images.
//!
//! ## Logs Are Values
//!
//! A [`run_log::RunLog`] is created at the start of a job, threaded through
//! it by `&mut`, and written exactly once. Errors of individual files are
//! appended to it instead of aborting the run.

pub mod config;
pub mod imaging;
pub mod manifest;
pub mod naming;
pub mod output;
pub mod process;
pub mod run_log;
pub mod scan;
pub mod sidecar;
pub mod sync;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
