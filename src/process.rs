//! Album processor.
//!
//! Walks the originals tree album by album and brings the generated tree up
//! to date. Every original that is not yet in its album's manifest gets the
//! next sequence number, three WebP variants and a metadata sidecar:
//!
//! ```text
//! images/originals/doors/a.jpg   →  images/generated/doors/_manifest.json   {"a.jpg": "001"}
//!                                   images/generated/doors/001/thumb.webp    320px, q70
//!                                   images/generated/doors/001/medium.webp   1200px, q80
//!                                   images/generated/doors/001/full.webp     2400px, q85
//!                                   images/generated/doors/001/meta.json
//! ```
//!
//! ## Idempotence
//!
//! The manifest decides what is new. Files already listed are skipped
//! outright; nothing under their sequence directory is looked at. Within a
//! new image, each variant file and the sidecar are only written if absent,
//! so an interrupted run can be resumed without clobbering anything.
//!
//! ## Error policy
//!
//! - A missing originals root fails the run before anything under the
//!   generated tree is touched.
//! - A manifest that cannot be parsed skips that album and leaves the file
//!   as it is.
//! - A failing image is recorded in the run log and the loop moves on. Its
//!   sequence number stays assigned.
//! - A missing or unreadable EXIF block only costs the sidecar; the image
//!   still counts as processed.
//!
//! Progress is reported through an optional channel of [`ProcessEvent`]s,
//! which the CLI prints from a separate thread.

use crate::config::{PathsConfig, VariantsConfig};
use crate::imaging::calculations::compression_ratio;
use crate::imaging::{BackendError, ImageBackend, create_variant, get_dimensions};
use crate::manifest::{AlbumManifest, ManifestError};
use crate::naming::pad_sequence;
use crate::run_log::{RunLog, RunLogError};
use crate::scan::{self, ScanError};
use crate::sidecar::{MetadataSidecar, SidecarError};
use crate::types::Variant;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info};

/// Prefix of processor log file names.
pub const PROCESS_PREFIX: &str = "process";

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Sidecar(#[from] SidecarError),
    #[error("no EXIF metadata")]
    NoExif,
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Log(#[from] RunLogError),
}

/// Counters of a processor run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessCounts {
    /// Album directories visited.
    pub albums: usize,
    /// Image files discovered across all albums.
    pub total_files: usize,
    /// Newly assigned images whose variants were all produced.
    pub processed: usize,
    /// Images already in their manifest.
    pub skipped: usize,
    /// Images that could not be processed.
    pub failed: usize,
    /// One entry per processed image.
    pub compression: Vec<CompressionRecord>,
}

/// Size saving of one processed image.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionRecord {
    pub album: String,
    pub file: String,
    pub sequence: String,
    pub original_bytes: u64,
    pub variant_bytes: u64,
    /// `1 - variant_bytes / original_bytes`; `null` for an empty original.
    pub ratio: Option<f64>,
}

pub type ProcessLog = RunLog<ProcessCounts>;

/// The persisted log of a finished run and where it was written.
#[derive(Debug)]
pub struct ProcessReport {
    pub log: ProcessLog,
    pub log_path: PathBuf,
}

/// Whether a variant file was produced by this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantStatus {
    /// Already on disk, left alone.
    Existing,
    /// Encoded from the original.
    Encoded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantInfo {
    pub variant: Variant,
    pub status: VariantStatus,
}

/// What happened to an image's `meta.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidecarStatus {
    Existing,
    Written,
    /// Metadata could not be read or had no EXIF block.
    Unavailable,
}

/// Progress events emitted while processing.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    AlbumStarted {
        album: String,
        image_count: usize,
        pending: usize,
    },
    AlbumFailed {
        album: String,
        error: String,
    },
    ImageProcessed {
        album: String,
        sequence: String,
        filename: String,
        variants: Vec<VariantInfo>,
        sidecar: SidecarStatus,
        ratio: Option<f64>,
    },
    ImageSkipped {
        album: String,
        sequence: String,
        filename: String,
    },
    ImageFailed {
        album: String,
        sequence: Option<String>,
        filename: String,
        error: String,
    },
}

/// Per-album counts for `check`: discovered images and how many are new.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumSurvey {
    pub album: String,
    pub discovered: usize,
    pub pending: usize,
    pub problem: Option<String>,
}

fn emit(progress: Option<&Sender<ProcessEvent>>, event: ProcessEvent) {
    if let Some(tx) = progress {
        tx.send(event).ok();
    }
}

/// Run the processor and persist its log under `<logs>/image-processing/`.
///
/// Item problems and missing input end up in the log; only a failure to
/// write the log itself is returned as an error.
pub fn process(
    paths: &PathsConfig,
    variants: &VariantsConfig,
    backend: &impl ImageBackend,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<ProcessReport, ProcessError> {
    let mut log = ProcessLog::start(ProcessCounts::default());
    process_albums(
        &paths.originals,
        &paths.generated,
        variants,
        backend,
        progress.as_ref(),
        &mut log,
    );
    log.finish();
    let log_path = log.save(&paths.process_logs(), PROCESS_PREFIX)?;
    Ok(ProcessReport { log, log_path })
}

/// Process every album under `originals`, accumulating into `log`.
pub fn process_albums(
    originals: &Path,
    generated: &Path,
    variants: &VariantsConfig,
    backend: &impl ImageBackend,
    progress: Option<&Sender<ProcessEvent>>,
    log: &mut ProcessLog,
) {
    let albums = match scan::list_albums(originals) {
        Ok(listing) => listing,
        Err(ScanError::NotFound(root)) => {
            log.fail(format!("{} does not exist", root.display()));
            return;
        }
        Err(e) => {
            log.fail(e.to_string());
            return;
        }
    };

    for path in &albums.invalid {
        log.error(format!(
            "{}: album name is not valid UTF-8",
            path.display()
        ));
    }
    for (path, reason) in &albums.unreadable {
        log.error(format!("{}: cannot read album: {}", path.display(), reason));
    }

    for album in &albums.entries {
        log.counts.albums += 1;
        process_album(
            &album.name,
            &album.path,
            &generated.join(&album.name),
            variants,
            backend,
            progress,
            log,
        );
    }
}

fn process_album(
    album: &str,
    album_dir: &Path,
    output_dir: &Path,
    variants: &VariantsConfig,
    backend: &impl ImageBackend,
    progress: Option<&Sender<ProcessEvent>>,
    log: &mut ProcessLog,
) {
    let images = match scan::list_images(album_dir) {
        Ok(listing) => listing,
        Err(e) => {
            album_failed(album, e.to_string(), progress, log);
            return;
        }
    };
    log.counts.total_files += images.discovered();

    let unlisted = images
        .invalid
        .iter()
        .map(|path| (path, "file name is not valid UTF-8".to_string()))
        .chain(
            images
                .unreadable
                .iter()
                .map(|(path, reason)| (path, format!("cannot read file: {}", reason))),
        );
    for (path, error) in unlisted {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        log.counts.failed += 1;
        log.error(format!("{}/{}: {}", album, filename, error));
        emit(
            progress,
            ProcessEvent::ImageFailed {
                album: album.to_string(),
                sequence: None,
                filename,
                error,
            },
        );
    }

    let mut manifest = match AlbumManifest::load(output_dir) {
        Ok(m) => m,
        Err(e) => {
            album_failed(album, e.to_string(), progress, log);
            return;
        }
    };

    let pending = images
        .entries
        .iter()
        .filter(|e| !manifest.contains(&e.name))
        .count();
    info!(album, images = images.entries.len(), pending, "album scanned");
    emit(
        progress,
        ProcessEvent::AlbumStarted {
            album: album.to_string(),
            image_count: images.entries.len(),
            pending,
        },
    );

    for image in &images.entries {
        let Some(seq) = manifest.assign(&image.name) else {
            log.counts.skipped += 1;
            let sequence = manifest.get(&image.name).unwrap_or_default().to_string();
            debug!(album, file = %image.name, %sequence, "already processed");
            emit(
                progress,
                ProcessEvent::ImageSkipped {
                    album: album.to_string(),
                    sequence,
                    filename: image.name.clone(),
                },
            );
            continue;
        };

        let sequence = pad_sequence(seq);
        let seq_dir = output_dir.join(&sequence);
        match write_variants(backend, variants, &image.path, &seq_dir) {
            Ok(variant_infos) => {
                let sidecar = match write_sidecar(
                    backend,
                    &image.path,
                    album,
                    &image.name,
                    &sequence,
                    &seq_dir,
                ) {
                    Ok(status) => status,
                    Err(e) => {
                        log.error(format!("{}/{}: metadata: {}", album, image.name, e));
                        SidecarStatus::Unavailable
                    }
                };
                let record = measure(album, &image.name, &sequence, &image.path, &seq_dir, log);
                let ratio = record.ratio;
                log.counts.processed += 1;
                log.counts.compression.push(record);
                emit(
                    progress,
                    ProcessEvent::ImageProcessed {
                        album: album.to_string(),
                        sequence,
                        filename: image.name.clone(),
                        variants: variant_infos,
                        sidecar,
                        ratio,
                    },
                );
            }
            Err(e) => {
                log.counts.failed += 1;
                log.error(format!("{}/{}: {}", album, image.name, e));
                emit(
                    progress,
                    ProcessEvent::ImageFailed {
                        album: album.to_string(),
                        sequence: Some(sequence),
                        filename: image.name.clone(),
                        error: e.to_string(),
                    },
                );
            }
        }
    }

    if let Err(e) = manifest.save(output_dir) {
        log.error(format!("{}: {}", album, e));
    }
}

fn album_failed(
    album: &str,
    error: String,
    progress: Option<&Sender<ProcessEvent>>,
    log: &mut ProcessLog,
) {
    log.error(format!("{}: {}", album, error));
    emit(
        progress,
        ProcessEvent::AlbumFailed {
            album: album.to_string(),
            error,
        },
    );
}

/// Produce every missing variant of `source` inside `seq_dir`.
///
/// Source dimensions are read at most once, and only when some variant is
/// missing.
pub fn write_variants(
    backend: &impl ImageBackend,
    variants: &VariantsConfig,
    source: &Path,
    seq_dir: &Path,
) -> Result<Vec<VariantInfo>, ProcessError> {
    std::fs::create_dir_all(seq_dir).map_err(|source| ProcessError::Io {
        path: seq_dir.to_path_buf(),
        source,
    })?;

    let mut dims = None;
    let mut infos = Vec::with_capacity(Variant::ALL.len());
    for variant in Variant::ALL {
        let output = seq_dir.join(variant.filename());
        let status = if output.exists() {
            debug!(output = %output.display(), "variant exists");
            VariantStatus::Existing
        } else {
            let original = match dims {
                Some(d) => d,
                None => {
                    let d = get_dimensions(backend, source)?;
                    dims = Some(d);
                    d
                }
            };
            create_variant(
                backend,
                source,
                seq_dir,
                variant,
                original,
                &variants.spec(variant),
            )?;
            VariantStatus::Encoded
        };
        infos.push(VariantInfo { variant, status });
    }
    Ok(infos)
}

/// Write `meta.json` for `source` unless it already exists.
pub fn write_sidecar(
    backend: &impl ImageBackend,
    source: &Path,
    album: &str,
    filename: &str,
    sequence: &str,
    seq_dir: &Path,
) -> Result<SidecarStatus, ProcessError> {
    if MetadataSidecar::path(seq_dir).exists() {
        return Ok(SidecarStatus::Existing);
    }
    let meta = backend.read_metadata(source)?;
    let sidecar = MetadataSidecar::from_metadata(filename, album, sequence, &meta)
        .ok_or(ProcessError::NoExif)?;
    sidecar.write(seq_dir)?;
    Ok(SidecarStatus::Written)
}

/// Compare the original's size with the variants now in `seq_dir`.
///
/// A size that cannot be read is logged and leaves the ratio unset.
fn measure(
    album: &str,
    file: &str,
    sequence: &str,
    source: &Path,
    seq_dir: &Path,
    log: &mut ProcessLog,
) -> CompressionRecord {
    let mut complete = true;
    let mut bytes_of = |p: &Path| match std::fs::metadata(p) {
        Ok(m) => m.len(),
        Err(e) => {
            complete = false;
            log.error(format!(
                "{}/{}: cannot measure {}: {}",
                album,
                file,
                p.display(),
                e
            ));
            0
        }
    };
    let original_bytes = bytes_of(source);
    let variant_bytes = Variant::ALL
        .iter()
        .map(|v| bytes_of(&seq_dir.join(v.filename())))
        .sum();
    CompressionRecord {
        album: album.to_string(),
        file: file.to_string(),
        sequence: sequence.to_string(),
        original_bytes,
        variant_bytes,
        ratio: if complete {
            compression_ratio(original_bytes, variant_bytes)
        } else {
            None
        },
    }
}

/// Count discovered and pending images per album without writing anything.
pub fn survey(originals: &Path, generated: &Path) -> Result<Vec<AlbumSurvey>, ScanError> {
    let albums = scan::list_albums(originals)?;
    let mut surveys = Vec::with_capacity(albums.entries.len());

    for (path, reason) in &albums.unreadable {
        surveys.push(AlbumSurvey {
            album: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            discovered: 0,
            pending: 0,
            problem: Some(format!("cannot read album: {}", reason)),
        });
    }

    for album in &albums.entries {
        let mut survey = AlbumSurvey {
            album: album.name.clone(),
            discovered: 0,
            pending: 0,
            problem: None,
        };
        match scan::list_images(&album.path) {
            Ok(images) => {
                survey.discovered = images.entries.len();
                match AlbumManifest::load(&generated.join(&album.name)) {
                    Ok(manifest) => {
                        survey.pending = images
                            .entries
                            .iter()
                            .filter(|e| !manifest.contains(&e.name))
                            .count();
                    }
                    Err(e) => survey.problem = Some(e.to_string()),
                }
                if !images.invalid.is_empty() {
                    survey.problem = Some(format!(
                        "{} file name(s) are not valid UTF-8",
                        images.invalid.len()
                    ));
                }
                if !images.unreadable.is_empty() {
                    survey.problem = Some(format!(
                        "{} file(s) cannot be read",
                        images.unreadable.len()
                    ));
                }
            }
            Err(e) => survey.problem = Some(e.to_string()),
        }
        surveys.push(survey);
    }
    Ok(surveys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::run_log::RunStatus;
    use crate::test_helpers::Workspace;
    use std::fs;

    fn paths_for(ws: &Workspace) -> PathsConfig {
        PathsConfig {
            originals: ws.originals(),
            generated: ws.generated(),
            logs: ws.logs(),
            sync_script: ws.root().join("sync-db.sh"),
            sync_sql_dir: ws.root().join("db-sync"),
        }
    }

    fn run(ws: &Workspace, backend: &MockBackend) -> ProcessReport {
        process(&paths_for(ws), &VariantsConfig::default(), backend, None).unwrap()
    }

    fn resize_count(backend: &MockBackend) -> usize {
        backend.resize_outputs().len()
    }

    fn identify_count(backend: &MockBackend) -> usize {
        backend
            .get_operations()
            .iter()
            .filter(|op| matches!(op, RecordedOp::Identify(_)))
            .count()
    }

    // =========================================================================
    // First run
    // =========================================================================

    #[test]
    fn first_run_assigns_sequences_in_name_order() {
        let ws = Workspace::new();
        ws.add_original("doors", "b.jpg");
        ws.add_original("doors", "a.jpg");
        let backend = MockBackend::new();

        let report = run(&ws, &backend);

        let manifest = ws.read_manifest("doors");
        assert_eq!(manifest["a.jpg"], "001");
        assert_eq!(manifest["b.jpg"], "002");
        assert_eq!(report.log.status, RunStatus::Success);
        assert_eq!(report.log.counts.processed, 2);
        assert_eq!(report.log.counts.total_files, 2);
        assert_eq!(report.log.counts.albums, 1);
    }

    #[test]
    fn first_run_writes_variants_and_sidecar() {
        let ws = Workspace::new();
        ws.add_original("doors", "a.jpg");
        let backend = MockBackend::new();

        run(&ws, &backend);

        assert_eq!(
            ws.generated_files(),
            vec![
                "doors/001/full.webp",
                "doors/001/medium.webp",
                "doors/001/meta.json",
                "doors/001/thumb.webp",
                "doors/_manifest.json",
            ]
        );

        let meta: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(ws.output("doors", "001", "meta.json")).unwrap())
                .unwrap();
        assert_eq!(meta["original_file"], "a.jpg");
        assert_eq!(meta["album"], "doors");
        assert_eq!(meta["sequence"], "001");
        assert_eq!(meta["camera"]["make"], "FUJIFILM");
    }

    #[test]
    fn variants_use_configured_sizes_without_upscaling() {
        let ws = Workspace::new();
        ws.add_original("doors", "a.jpg");
        let backend = MockBackend::with_dimensions(1600, 1200);

        run(&ws, &backend);

        let resizes: Vec<(u32, u32, u32)> = backend
            .get_operations()
            .into_iter()
            .filter_map(|op| match op {
                RecordedOp::Resize {
                    width,
                    height,
                    quality,
                    ..
                } => Some((width, height, quality)),
                _ => None,
            })
            .collect();
        assert_eq!(
            resizes,
            vec![(320, 240, 70), (1200, 900, 80), (1600, 1200, 85)]
        );
    }

    #[test]
    fn dimensions_read_once_per_image() {
        let ws = Workspace::new();
        ws.add_original("doors", "a.jpg");
        let backend = MockBackend::new();

        run(&ws, &backend);

        assert_eq!(identify_count(&backend), 1);
    }

    // =========================================================================
    // Idempotence and monotonic numbering
    // =========================================================================

    #[test]
    fn second_run_changes_nothing() {
        let ws = Workspace::new();
        ws.add_original("doors", "a.jpg");
        ws.add_original("doors", "b.jpg");
        run(&ws, &MockBackend::new());
        let manifest_before = ws.read_manifest("doors");
        let files_before = ws.generated_files();

        let backend = MockBackend::new();
        let report = run(&ws, &backend);

        assert!(backend.get_operations().is_empty());
        assert_eq!(ws.read_manifest("doors"), manifest_before);
        assert_eq!(ws.generated_files(), files_before);
        assert_eq!(report.log.counts.skipped, 2);
        assert_eq!(report.log.counts.processed, 0);
        assert_eq!(report.log.status, RunStatus::Success);
    }

    #[test]
    fn new_file_continues_from_highest_sequence() {
        let ws = Workspace::new();
        ws.add_original("X", "a.jpg");
        ws.add_original("X", "b.jpg");
        ws.add_original("X", "c.jpg");
        ws.write_manifest("X", &[("a.jpg", "001"), ("b.jpg", "002")]);
        let backend = MockBackend::new();

        let report = run(&ws, &backend);

        let manifest = ws.read_manifest("X");
        assert_eq!(manifest["a.jpg"], "001");
        assert_eq!(manifest["b.jpg"], "002");
        assert_eq!(manifest["c.jpg"], "003");
        assert_eq!(report.log.counts.skipped, 2);
        assert_eq!(report.log.counts.processed, 1);
        assert!(ws.output("X", "003", "thumb.webp").exists());
    }

    #[test]
    fn manifest_entries_for_removed_files_are_kept() {
        let ws = Workspace::new();
        ws.add_original("doors", "new.jpg");
        ws.write_manifest("doors", &[("gone.jpg", "004")]);

        run(&ws, &MockBackend::new());

        let manifest = ws.read_manifest("doors");
        assert_eq!(manifest["gone.jpg"], "004");
        assert_eq!(manifest["new.jpg"], "005");
    }

    // =========================================================================
    // Non-destructive outputs
    // =========================================================================

    #[test]
    fn existing_variant_is_left_alone() {
        let ws = Workspace::new();
        ws.add_original("X", "a.jpg");
        let thumb = ws.output("X", "001", "thumb.webp");
        fs::create_dir_all(thumb.parent().unwrap()).unwrap();
        fs::write(&thumb, b"hand-made thumbnail").unwrap();
        let backend = MockBackend::new();

        run(&ws, &backend);

        assert_eq!(fs::read(&thumb).unwrap(), b"hand-made thumbnail");
        let outputs = backend.resize_outputs();
        assert_eq!(outputs.len(), 2);
        assert!(outputs.iter().all(|o| !o.ends_with("thumb.webp")));
        assert!(ws.output("X", "001", "medium.webp").exists());
        assert!(ws.output("X", "001", "full.webp").exists());
    }

    #[test]
    fn all_variants_present_skips_identify() {
        let ws = Workspace::new();
        ws.add_original("X", "a.jpg");
        for variant in Variant::ALL {
            let path = ws.output("X", "001", &variant.filename());
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"x").unwrap();
        }
        let backend = MockBackend::new();

        run(&ws, &backend);

        assert_eq!(identify_count(&backend), 0);
        assert_eq!(resize_count(&backend), 0);
    }

    #[test]
    fn existing_sidecar_is_never_rewritten() {
        let ws = Workspace::new();
        ws.add_original("X", "a.jpg");
        let meta = ws.output("X", "001", "meta.json");
        fs::create_dir_all(meta.parent().unwrap()).unwrap();
        fs::write(&meta, r#"{"curated": true}"#).unwrap();
        let backend = MockBackend::new();

        run(&ws, &backend);

        assert_eq!(fs::read_to_string(&meta).unwrap(), r#"{"curated": true}"#);
        assert!(
            !backend
                .get_operations()
                .iter()
                .any(|op| matches!(op, RecordedOp::ReadMetadata(_)))
        );
    }

    // =========================================================================
    // Filtering
    // =========================================================================

    #[test]
    fn unknown_extensions_are_ignored() {
        let ws = Workspace::new();
        ws.add_original("doors", "a.jpg");
        ws.add_original("doors", "notes.txt");
        let backend = MockBackend::new();

        let report = run(&ws, &backend);

        let manifest = ws.read_manifest("doors");
        assert_eq!(manifest.len(), 1);
        assert!(!manifest.contains_key("notes.txt"));
        assert_eq!(report.log.counts.total_files, 1);
        assert!(
            backend
                .get_operations()
                .iter()
                .all(|op| !format!("{op:?}").contains("notes.txt"))
        );
    }

    #[test]
    fn files_at_originals_root_are_not_albums() {
        let ws = Workspace::new();
        fs::write(ws.originals().join("stray.jpg"), b"x").unwrap();
        ws.add_original("nature", "fern.png");

        let report = run(&ws, &MockBackend::new());

        assert_eq!(report.log.counts.albums, 1);
        assert!(!ws.generated().join("stray.jpg").exists());
    }

    #[test]
    fn empty_album_still_gets_manifest() {
        let ws = Workspace::new();
        fs::create_dir_all(ws.originals().join("empty")).unwrap();

        run(&ws, &MockBackend::new());

        assert!(ws.read_manifest("empty").is_empty());
    }

    // =========================================================================
    // Errors
    // =========================================================================

    #[test]
    fn missing_originals_root_fails_without_writes() {
        let ws = Workspace::without_originals();
        let backend = MockBackend::new();

        let report = run(&ws, &backend);

        assert_eq!(report.log.status, RunStatus::Failed);
        assert!(!ws.generated().exists());
        assert!(backend.get_operations().is_empty());
        let log = ws.single_log("image-processing");
        assert_eq!(log["status"], "FAILED");
        assert!(log["errors"][0].as_str().unwrap().contains("does not exist"));
    }

    #[test]
    fn failing_image_does_not_stop_the_run() {
        let ws = Workspace::new();
        ws.add_original("doors", "a-broken.jpg");
        ws.add_original("doors", "b.jpg");
        ws.add_original("nature", "c.jpg");
        let backend = MockBackend::failing_on("broken");

        let report = run(&ws, &backend);

        assert_eq!(report.log.status, RunStatus::CompletedWithErrors);
        assert_eq!(report.log.counts.failed, 1);
        assert_eq!(report.log.counts.processed, 2);
        assert!(report.log.errors[0].starts_with("doors/a-broken.jpg"));
        // the failed file keeps its number
        assert_eq!(ws.read_manifest("doors")["a-broken.jpg"], "001");
        assert_eq!(ws.read_manifest("doors")["b.jpg"], "002");
        assert!(ws.output("nature", "001", "full.webp").exists());
    }

    #[test]
    fn corrupt_manifest_skips_album_untouched() {
        let ws = Workspace::new();
        ws.add_original("doors", "a.jpg");
        ws.add_original("nature", "b.jpg");
        let manifest_path = ws.generated().join("doors/_manifest.json");
        fs::create_dir_all(manifest_path.parent().unwrap()).unwrap();
        fs::write(&manifest_path, "{ broken").unwrap();

        let report = run(&ws, &MockBackend::new());

        assert_eq!(fs::read_to_string(&manifest_path).unwrap(), "{ broken");
        assert!(!ws.generated().join("doors/001").exists());
        assert_eq!(ws.read_manifest("nature")["b.jpg"], "001");
        assert_eq!(report.log.status, RunStatus::CompletedWithErrors);
        assert!(report.log.errors[0].starts_with("doors:"));
    }

    #[test]
    fn missing_exif_skips_sidecar_but_counts_processed() {
        let ws = Workspace::new();
        ws.add_original("doors", "a.jpg");

        let report = run(&ws, &MockBackend::without_exif());

        assert!(!ws.output("doors", "001", "meta.json").exists());
        assert!(ws.output("doors", "001", "thumb.webp").exists());
        assert_eq!(report.log.counts.processed, 1);
        assert_eq!(report.log.status, RunStatus::CompletedWithErrors);
        assert!(report.log.errors[0].contains("no EXIF"));
    }

    #[test]
    fn unreadable_metadata_is_non_fatal() {
        let ws = Workspace::new();
        ws.add_original("doors", "a.jpg");

        let report = run(&ws, &MockBackend::with_failing_metadata());

        assert!(!ws.output("doors", "001", "meta.json").exists());
        assert_eq!(report.log.counts.processed, 1);
        assert_eq!(report.log.counts.failed, 0);
        assert_eq!(report.log.errors.len(), 1);
    }

    // =========================================================================
    // Run log
    // =========================================================================

    #[test]
    fn compression_ratio_recorded_per_image() {
        let ws = Workspace::new();
        ws.add_original("doors", "a.jpg");

        let report = run(&ws, &MockBackend::new());

        // mock variants are width bytes each: 320 + 1200 + 2400
        let record = &report.log.counts.compression[0];
        assert_eq!(record.original_bytes, 10_000);
        assert_eq!(record.variant_bytes, 3920);
        let ratio = record.ratio.unwrap();
        assert!((ratio - 0.608).abs() < 1e-9);
    }

    #[test]
    fn empty_original_has_no_ratio() {
        let ws = Workspace::new();
        let path = ws.add_original("doors", "a.jpg");
        fs::write(&path, b"").unwrap();

        let report = run(&ws, &MockBackend::new());

        assert_eq!(report.log.counts.compression[0].ratio, None);
        let log = ws.single_log("image-processing");
        assert_eq!(log["compression"][0]["ratio"], serde_json::Value::Null);
    }

    #[test]
    fn unmeasurable_size_is_logged_without_ratio() {
        let ws = Workspace::new();
        let seq_dir = ws.generated().join("doors/001");
        let mut log = ProcessLog::start(ProcessCounts::default());

        let record = measure(
            "doors",
            "a.jpg",
            "001",
            &ws.originals().join("doors/gone.jpg"),
            &seq_dir,
            &mut log,
        );

        assert_eq!(record.ratio, None);
        assert_eq!(log.errors.len(), 1 + Variant::ALL.len());
        assert!(log.errors[0].starts_with("doors/a.jpg: cannot measure"));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_album_entry_does_not_block_other_albums() {
        let ws = Workspace::new();
        ws.add_original("doors", "a.jpg");
        std::os::unix::fs::symlink(
            ws.root().join("nowhere"),
            ws.originals().join("zz-dangling"),
        )
        .unwrap();

        let report = run(&ws, &MockBackend::new());

        assert_eq!(report.log.status, RunStatus::CompletedWithErrors);
        assert_eq!(report.log.counts.albums, 1);
        assert_eq!(report.log.counts.processed, 1);
        assert_eq!(report.log.errors.len(), 1);
        assert!(report.log.errors[0].contains("zz-dangling"));
        assert!(ws.output("doors", "001", "full.webp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn dangling_image_fails_alone() {
        let ws = Workspace::new();
        ws.add_original("doors", "a.jpg");
        std::os::unix::fs::symlink(
            ws.root().join("nowhere.jpg"),
            ws.originals().join("doors/b.jpg"),
        )
        .unwrap();

        let report = run(&ws, &MockBackend::new());

        let counts = &report.log.counts;
        assert_eq!(report.log.status, RunStatus::CompletedWithErrors);
        assert_eq!(counts.total_files, 2);
        assert_eq!(counts.processed, 1);
        assert_eq!(counts.failed, 1);
        assert!(report.log.errors[0].starts_with("doors/b.jpg: cannot read file"));
        assert_eq!(ws.read_manifest("doors").len(), 1);
        assert_eq!(ws.read_manifest("doors")["a.jpg"], "001");
    }

    #[test]
    fn log_is_persisted_with_camel_case_counts() {
        let ws = Workspace::new();
        ws.add_original("doors", "a.jpg");

        let report = run(&ws, &MockBackend::new());

        assert_eq!(
            report.log_path,
            ws.logs()
                .join("image-processing")
                .join(format!("process_{}.json", report.log.stamp()))
        );
        let log = ws.single_log("image-processing");
        assert_eq!(log["totalFiles"], 1);
        assert_eq!(log["processed"], 1);
        assert_eq!(log["status"], "SUCCESS");
        assert_eq!(log["compression"][0]["originalBytes"], 10_000);
        assert!(log["startTime"].is_string());
        assert!(log["endTime"].is_string());
    }

    // =========================================================================
    // Progress events
    // =========================================================================

    #[test]
    fn events_describe_the_run() {
        let ws = Workspace::new();
        ws.add_original("doors", "a.jpg");
        ws.add_original("doors", "b.jpg");
        ws.write_manifest("doors", &[("a.jpg", "001")]);
        let (tx, rx) = std::sync::mpsc::channel();

        process(
            &paths_for(&ws),
            &VariantsConfig::default(),
            &MockBackend::new(),
            Some(tx),
        )
        .unwrap();
        let events: Vec<ProcessEvent> = rx.iter().collect();

        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            ProcessEvent::AlbumStarted {
                album: "doors".to_string(),
                image_count: 2,
                pending: 1,
            }
        );
        assert!(matches!(
            &events[1],
            ProcessEvent::ImageSkipped { sequence, .. } if sequence == "001"
        ));
        match &events[2] {
            ProcessEvent::ImageProcessed {
                sequence,
                variants,
                sidecar,
                ..
            } => {
                assert_eq!(sequence, "002");
                assert!(variants.iter().all(|v| v.status == VariantStatus::Encoded));
                assert_eq!(*sidecar, SidecarStatus::Written);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    // =========================================================================
    // Survey
    // =========================================================================

    #[test]
    fn survey_counts_pending_without_writing() {
        let ws = Workspace::new();
        ws.add_original("doors", "a.jpg");
        ws.add_original("doors", "b.jpg");
        ws.add_original("nature", "c.jpg");
        ws.write_manifest("doors", &[("a.jpg", "001")]);
        let before = ws.generated_files();

        let surveys = survey(&ws.originals(), &ws.generated()).unwrap();

        assert_eq!(
            surveys,
            vec![
                AlbumSurvey {
                    album: "doors".to_string(),
                    discovered: 2,
                    pending: 1,
                    problem: None,
                },
                AlbumSurvey {
                    album: "nature".to_string(),
                    discovered: 1,
                    pending: 1,
                    problem: None,
                },
            ]
        );
        assert_eq!(ws.generated_files(), before);
    }

    #[test]
    fn survey_reports_corrupt_manifest() {
        let ws = Workspace::new();
        ws.add_original("doors", "a.jpg");
        let path = ws.generated().join("doors/_manifest.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "[").unwrap();

        let surveys = survey(&ws.originals(), &ws.generated()).unwrap();
        assert!(surveys[0].problem.as_deref().unwrap().contains("not valid JSON"));
    }

    #[test]
    fn survey_missing_root_errors() {
        let ws = Workspace::without_originals();
        assert!(matches!(
            survey(&ws.originals(), &ws.generated()),
            Err(ScanError::NotFound(_))
        ));
    }
}
