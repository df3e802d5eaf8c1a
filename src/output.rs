//! CLI output formatting for both jobs.
//!
//! # Entity Display Contract
//!
//! Every entity follows the same two-level pattern:
//!
//! 1. **Header line**: positional index or sequence id + name
//! 2. **Context lines**: indented variant status, descriptions, errors
//!
//! # Output Format
//!
//! ## Process
//!
//! ```text
//! doors (3 photos, 1 new)
//!     001 a.jpg (already processed)
//!     002 b.jpg (already processed)
//!     003 c.jpg
//!         thumb: encoded
//!         medium: encoded
//!         full: existing
//!         meta.json: written
//!         Saved: 81.2%
//!
//! Processed 1, skipped 2, failed 0 (3 files in 1 album)
//! Status: SUCCESS
//! Log: logs/image-processing/process_2026-10-16_10_51_00.json
//! ```
//!
//! ## Sync
//!
//! ```text
//! Albums
//! 001 Doors & Windows (doors)
//!     Description: Unique doors and windows from around the world.
//! 002 Mystery (mystery)
//!
//! Generated 2 album inserts for portfolio-db
//!     SQL: db-sync/sync_2026-10-16_10_51_00.sql
//!     Script: sync-db.sh
//! Run: ./sync-db.sh
//! Status: SUCCESS
//! Log: logs/database-sync/sync_2026-10-16_10_51_00.json
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::config::PipelineConfig;
use crate::process::{AlbumSurvey, ProcessEvent, ProcessReport, SidecarStatus, VariantStatus};
use crate::run_log::{RunLog, RunStatus};
use crate::sync::SyncReport;
use crate::types::{SIDECAR_FILENAME, Variant};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{} {}", n, one)
    } else {
        format!("{} {}", n, many)
    }
}

/// Status, error list and log path shared by both job summaries.
fn run_footer<C>(log: &RunLog<C>, log_path: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    if !log.errors.is_empty() {
        lines.push(format!("Errors ({})", log.errors.len()));
        for error in &log.errors {
            lines.push(format!("{}{}", indent(1), error));
        }
    }
    lines.push(format!("Status: {}", log.status.label()));
    lines.push(format!("Log: {}", log_path.display()));
    lines
}

// ============================================================================
// Process output
// ============================================================================

/// Format a single process progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::AlbumStarted {
            album,
            image_count,
            pending,
        } => vec![format!(
            "{} ({}, {} new)",
            album,
            plural(*image_count, "photo", "photos"),
            pending
        )],
        ProcessEvent::AlbumFailed { album, error } => vec![
            format!("{} (skipped)", album),
            format!("{}Error: {}", indent(1), error),
        ],
        ProcessEvent::ImageSkipped {
            sequence, filename, ..
        } => vec![format!(
            "{}{} {} (already processed)",
            indent(1),
            sequence,
            filename
        )],
        ProcessEvent::ImageProcessed {
            sequence,
            filename,
            variants,
            sidecar,
            ratio,
            ..
        } => {
            let mut lines = vec![format!("{}{} {}", indent(1), sequence, filename)];
            for info in variants {
                let status = match info.status {
                    VariantStatus::Existing => "existing",
                    VariantStatus::Encoded => "encoded",
                };
                lines.push(format!("{}{}: {}", indent(2), info.variant, status));
            }
            let sidecar_status = match sidecar {
                SidecarStatus::Existing => "existing",
                SidecarStatus::Written => "written",
                SidecarStatus::Unavailable => "unavailable",
            };
            lines.push(format!(
                "{}{}: {}",
                indent(2),
                SIDECAR_FILENAME,
                sidecar_status
            ));
            if let Some(r) = ratio {
                lines.push(format!("{}Saved: {:.1}%", indent(2), r * 100.0));
            }
            lines
        }
        ProcessEvent::ImageFailed {
            sequence,
            filename,
            error,
            ..
        } => vec![
            format!(
                "{}{} {} (failed)",
                indent(1),
                sequence.as_deref().unwrap_or("---"),
                filename
            ),
            format!("{}Error: {}", indent(2), error),
        ],
    }
}

/// Format the end-of-run summary of the processor.
pub fn format_process_summary(report: &ProcessReport) -> Vec<String> {
    let counts = &report.log.counts;
    let mut lines = vec![
        String::new(),
        format!(
            "Processed {}, skipped {}, failed {} ({} in {})",
            counts.processed,
            counts.skipped,
            counts.failed,
            plural(counts.total_files, "file", "files"),
            plural(counts.albums, "album", "albums"),
        ),
    ];
    lines.extend(run_footer(&report.log, &report.log_path));
    lines
}

pub fn print_process_summary(report: &ProcessReport) {
    for line in format_process_summary(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Sync output
// ============================================================================

/// Format the result of a sync run.
pub fn format_sync_output(report: &SyncReport) -> Vec<String> {
    let mut lines = Vec::new();

    if !report.statements.is_empty() {
        lines.push("Albums".to_string());
        for (i, statement) in report.statements.iter().enumerate() {
            lines.push(format!(
                "{} {} ({})",
                format_index(i + 1),
                statement.info.title,
                statement.slug
            ));
            if !statement.info.description.is_empty() {
                lines.push(format!(
                    "{}Description: {}",
                    indent(1),
                    statement.info.description
                ));
            }
        }
        lines.push(String::new());
    }

    match (&report.sql_file, &report.script) {
        (Some(sql), Some(script)) => {
            lines.push(format!(
                "Generated {} for {}",
                plural(report.statements.len(), "album insert", "album inserts"),
                report.database
            ));
            lines.push(format!("{}SQL: {}", indent(1), sql.display()));
            lines.push(format!("{}Script: {}", indent(1), script.display()));
            lines.push(format!("Run: {}", runnable(script)));
        }
        _ if report.log.status == RunStatus::NoChanges => {
            lines.push("No albums to sync".to_string());
        }
        _ => {}
    }

    lines.extend(run_footer(&report.log, &report.log_path));
    lines
}

/// How to invoke the script from the working directory.
fn runnable(script: &Path) -> String {
    if script.is_relative() && script.components().count() == 1 {
        format!("./{}", script.display())
    } else {
        script.display().to_string()
    }
}

pub fn print_sync_output(report: &SyncReport) {
    for line in format_sync_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Check output
// ============================================================================

/// Format the effective configuration and the per-album survey.
pub fn format_check_output(
    config: &PipelineConfig,
    database: &str,
    surveys: &[AlbumSurvey],
) -> Vec<String> {
    let paths = &config.paths;
    let mut lines = vec![
        "Config".to_string(),
        format!("{}Originals: {}", indent(1), paths.originals.display()),
        format!("{}Generated: {}", indent(1), paths.generated.display()),
        format!("{}Logs: {}", indent(1), paths.logs.display()),
        format!("{}Database: {}", indent(1), database),
    ];
    let variants: Vec<String> = Variant::ALL
        .iter()
        .map(|v| {
            let spec = config.variants.spec(*v);
            format!("{} {}px q{}", v, spec.width, spec.quality)
        })
        .collect();
    lines.push(format!("{}Variants: {}", indent(1), variants.join(", ")));

    lines.push(String::new());
    lines.push("Albums".to_string());
    if surveys.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    for (i, survey) in surveys.iter().enumerate() {
        lines.push(format!(
            "{} {} ({}, {} pending)",
            format_index(i + 1),
            survey.album,
            plural(survey.discovered, "photo", "photos"),
            survey.pending
        ));
        if let Some(problem) = &survey.problem {
            lines.push(format!("{}Problem: {}", indent(1), problem));
        }
    }
    lines
}

pub fn print_check_output(config: &PipelineConfig, database: &str, surveys: &[AlbumSurvey]) {
    for line in format_check_output(config, database, surveys) {
        println!("{}", line);
    }
}
