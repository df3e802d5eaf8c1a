//! Centralized naming conventions.
//!
//! Everything the pipeline writes to disk is named by one of three rules,
//! and all of them live here so the processor, the sync generator and the
//! run logs agree on them:
//!
//! ## Sequence identifiers
//!
//! Each processed original gets a positive sequence number, rendered
//! zero-padded to three digits (`7` → `"007"`). Wider numbers are kept
//! intact (`1000` → `"1000"`), never truncated. The padded form is both the
//! manifest value and the name of the output directory.
//!
//! ## Album titles
//!
//! Albums without a curated title are displayed as their slug with the
//! first character uppercased: `mystery` → "Mystery", `street-art` →
//! "Street-art". Nothing else about the slug changes.
//!
//! ## Run stamps
//!
//! Log and artifact file names carry the local run time formatted as
//! `%Y-%m-%d %H:%M:%S`, with every `/`, `,`, `:` and space replaced by `_`:
//! `2026-10-16 10:51:00` → `2026-10-16_10_51_00`. Log *contents* use
//! RFC 3339 instead ([`iso_timestamp`]).

use chrono::{DateTime, Local, SecondsFormat, TimeZone};

/// Width of the zero-padded sequence string.
pub const SEQUENCE_WIDTH: usize = 3;

/// Render a sequence number as its padded identifier.
///
/// - `1` → `"001"`
/// - `42` → `"042"`
/// - `1000` → `"1000"`
pub fn pad_sequence(seq: u32) -> String {
    format!("{:0>width$}", seq, width = SEQUENCE_WIDTH)
}

/// Parse a padded identifier back into its number.
///
/// Returns `None` for anything that is not a plain non-negative integer.
pub fn parse_sequence(value: &str) -> Option<u32> {
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

/// Fallback display title for an album slug: first character uppercased.
pub fn fallback_title(slug: &str) -> String {
    let mut chars = slug.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Replace the characters that are unsafe in file names (`/`, `,`, `:`, space) with `_`.
pub fn filename_safe(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '/' | ',' | ':' | ' ' => '_',
            other => other,
        })
        .collect()
}

/// File-name stamp for a run started at `at`.
pub fn run_stamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    filename_safe(&at.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// RFC 3339 timestamp (second precision) used inside run logs.
pub fn iso_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Current local time.
pub fn now() -> DateTime<Local> {
    Local::now()
}
