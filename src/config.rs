//! Pipeline configuration.
//!
//! Handles loading, validating, and merging the `photo-ingest.toml` file.
//! The user file is sparse: it is deep-merged over the stock defaults, so it
//! only needs the keys it wants to change. A missing file means stock
//! defaults.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [paths]
//! originals = "images/originals"    # Album directories of source photos
//! generated = "images/generated"    # Variants, sidecars and manifests
//! logs = "logs"                     # Run logs (one subdirectory per job)
//! sync_script = "sync-db.sh"        # Executable database sync script
//! sync_sql_dir = "db-sync"          # Raw SQL files, one per sync run
//!
//! [variants.thumb]
//! width = 320                       # Max width in pixels (never upscaled)
//! quality = 70                      # WebP quality (1-100)
//!
//! [variants.medium]
//! width = 1200
//! quality = 80
//!
//! [variants.full]
//! width = 2400
//! quality = 85
//!
//! [sync]
//! database = "portfolio-db"         # Overridden by the DB_NAME env var
//!
//! [sync.albums.doors]
//! title = "Doors & Windows"
//! description = "Unique doors and windows from around the world."
//! ```
//!
//! ## Album Table
//!
//! `[sync.albums.<slug>]` entries are merged over the built-in table, so a
//! file can add a new album or change one field of a known album:
//!
//! ```toml
//! [sync.albums.street]
//! title = "Street"
//!
//! [sync.albums.macro]
//! description = "Tiny worlds."
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::VariantSpec;
use crate::sync::known_albums;
use crate::types::{AlbumInfo, Variant};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default location of the config file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "photo-ingest.toml";

/// Database used when neither `DB_NAME` nor the config file name one.
pub const DEFAULT_DATABASE: &str = "portfolio-db";

/// Environment variable that overrides the configured database name.
pub const DATABASE_ENV_VAR: &str = "DB_NAME";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML encode error: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Full pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Input and output locations.
    pub paths: PathsConfig,
    /// Width and quality of each variant.
    pub variants: VariantsConfig,
    /// Database sync settings.
    pub sync: SyncConfig,
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for variant in Variant::ALL {
            let spec = self.variants.spec(variant);
            if spec.width == 0 {
                return Err(ConfigError::Validation(format!(
                    "variants.{variant}.width must be non-zero"
                )));
            }
            if !(1..=100).contains(&spec.quality) {
                return Err(ConfigError::Validation(format!(
                    "variants.{variant}.quality must be 1-100"
                )));
            }
        }
        if self.sync.database.trim().is_empty() {
            return Err(ConfigError::Validation(
                "sync.database must not be empty".into(),
            ));
        }
        if let Some((slug, _)) = self
            .sync
            .albums
            .iter()
            .find(|(_, info)| info.title.trim().is_empty())
        {
            return Err(ConfigError::Validation(format!(
                "sync.albums.{slug}.title must not be empty"
            )));
        }
        Ok(())
    }
}

/// Filesystem locations used by both jobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub originals: PathBuf,
    pub generated: PathBuf,
    pub logs: PathBuf,
    pub sync_script: PathBuf,
    pub sync_sql_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            originals: PathBuf::from("images/originals"),
            generated: PathBuf::from("images/generated"),
            logs: PathBuf::from("logs"),
            sync_script: PathBuf::from("sync-db.sh"),
            sync_sql_dir: PathBuf::from("db-sync"),
        }
    }
}

impl PathsConfig {
    /// Directory of the processor's run logs.
    pub fn process_logs(&self) -> PathBuf {
        self.logs.join("image-processing")
    }

    /// Directory of the sync generator's run logs.
    pub fn sync_logs(&self) -> PathBuf {
        self.logs.join("database-sync")
    }
}

/// Per-variant encoding targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VariantsConfig {
    pub thumb: VariantSpec,
    pub medium: VariantSpec,
    pub full: VariantSpec,
}

impl Default for VariantsConfig {
    fn default() -> Self {
        Self {
            thumb: VariantSpec::new(320, 70),
            medium: VariantSpec::new(1200, 80),
            full: VariantSpec::new(2400, 85),
        }
    }
}

impl VariantsConfig {
    pub fn spec(&self, variant: Variant) -> VariantSpec {
        match variant {
            Variant::Thumb => self.thumb,
            Variant::Medium => self.medium,
            Variant::Full => self.full,
        }
    }
}

/// Database sync settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Target D1 database name.
    pub database: String,
    /// Title and description per album slug.
    pub albums: BTreeMap<String, AlbumInfo>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            albums: known_albums(),
        }
    }
}

/// Pick the database name: a non-empty env value wins, then the config.
///
/// The env value is passed in rather than read here so callers (and tests)
/// control where it comes from.
pub fn resolve_database_name(sync: &SyncConfig, env_value: Option<String>) -> String {
    env_value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            let configured = sync.database.trim();
            (!configured.is_empty()).then(|| configured.to_string())
        })
        .unwrap_or_else(|| DEFAULT_DATABASE.to_string())
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(PipelineConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<PipelineConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config file at `path` (stock defaults if absent).
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    resolve_config(load_raw_config(path)?)
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# photo-ingest configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Paths (relative to the working directory)
# ---------------------------------------------------------------------------
[paths]
# One subdirectory per album, holding the original photos.
originals = "images/originals"

# Output tree: <album>/_manifest.json and <album>/<seq>/{thumb,medium,full}.webp
generated = "images/generated"

# Run logs go to <logs>/image-processing/ and <logs>/database-sync/.
logs = "logs"

# Executable script of wrangler commands, rewritten by every sync run.
sync_script = "sync-db.sh"

# Directory of raw SQL files, one sync_<timestamp>.sql per sync run.
sync_sql_dir = "db-sync"

# ---------------------------------------------------------------------------
# Variants
# ---------------------------------------------------------------------------
# Every original gets exactly these three WebP renditions. Widths are maximums:
# images narrower than the width are never enlarged.
[variants.thumb]
width = 320
quality = 70

[variants.medium]
width = 1200
quality = 80

[variants.full]
width = 2400
quality = 85

# ---------------------------------------------------------------------------
# Database sync
# ---------------------------------------------------------------------------
[sync]
# Target database. The DB_NAME environment variable takes precedence.
database = "portfolio-db"

# Album titles and descriptions. Albums not listed here use their directory
# name with the first letter uppercased and an empty description.
[sync.albums.doors]
title = "Doors & Windows"
description = "Unique doors and windows from around the world."

[sync.albums.macro]
title = "Macro"
description = "Get closer to the world around you."

[sync.albums.minimal]
title = "Minimal"
description = "Less is the new more"

[sync.albums.nature]
title = "Nature"
description = "Indeed the most beautiful mother nature"

[sync.albums.patterns]
title = "Patterns"
description = "They are everywhere, just look around"
"##
}
