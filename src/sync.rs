//! Album sync generator.
//!
//! Turns the album directories of the generated tree into idempotent SQL
//! inserts, and writes them out twice: as an executable script of
//! `wrangler d1 execute` commands, and as a plain `.sql` file.
//!
//! ```text
//! images/generated/doors/    →  INSERT OR IGNORE INTO albums (slug, title, description)
//! images/generated/mystery/       VALUES ('doors', 'Doors & Windows', '...');
//!                                 INSERT OR IGNORE INTO albums ... VALUES ('mystery', 'Mystery', '');
//!
//! sync-db.sh                     #!/bin/bash + one wrangler command per insert (mode 0755)
//! db-sync/sync_<stamp>.sql       the inserts, one per line
//! logs/database-sync/sync_<stamp>.json
//! ```
//!
//! ## Quoting
//!
//! Album slugs are directory names and are treated as untrusted. Every value
//! goes through [`sql_literal`] before it reaches SQL, and every SQL statement
//! goes through [`shell_quote`] before it reaches the script. The two layers
//! are independent: the SQL text is complete before it is shell-quoted.
//!
//! ## Outcomes
//!
//! | Situation | Status | Artifacts |
//! |---|---|---|
//! | generated root missing | `FAILED` | none |
//! | no album directories | `NO_CHANGES` | none |
//! | artifacts cannot be written | `FAILED` | partial |
//! | some slugs not valid UTF-8 or unreadable | `COMPLETED_WITH_ERRORS` | valid albums only |
//! | otherwise | `SUCCESS` | both |

use crate::config::{PathsConfig, SyncConfig};
use crate::naming::fallback_title;
use crate::run_log::{RunLog, RunLogError, create_unique};
use crate::scan::{self, ScanError};
use crate::types::AlbumInfo;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Curated titles and descriptions of the known albums.
const KNOWN_ALBUMS: &[(&str, &str, &str)] = &[
    (
        "doors",
        "Doors & Windows",
        "Unique doors and windows from around the world.",
    ),
    ("macro", "Macro", "Get closer to the world around you."),
    ("minimal", "Minimal", "Less is the new more"),
    ("nature", "Nature", "Indeed the most beautiful mother nature"),
    ("patterns", "Patterns", "They are everywhere, just look around"),
];

/// Prefix of sync log and SQL file names.
pub const SYNC_PREFIX: &str = "sync";

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Log(#[from] RunLogError),
}

/// Counters of a sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncCounts {
    pub total_rows: usize,
    pub successful_inserts: usize,
    pub failed_inserts: usize,
}

pub type SyncLog = RunLog<SyncCounts>;

/// One album and the statement generated for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumStatement {
    pub slug: String,
    pub info: AlbumInfo,
    pub sql: String,
}

/// Everything a sync run produced.
#[derive(Debug)]
pub struct SyncReport {
    pub log: SyncLog,
    pub log_path: PathBuf,
    pub statements: Vec<AlbumStatement>,
    pub script: Option<PathBuf>,
    pub sql_file: Option<PathBuf>,
    pub database: String,
}

/// The built-in album table.
pub fn known_albums() -> BTreeMap<String, AlbumInfo> {
    KNOWN_ALBUMS
        .iter()
        .map(|(slug, title, description)| {
            (
                slug.to_string(),
                AlbumInfo {
                    title: title.to_string(),
                    description: description.to_string(),
                },
            )
        })
        .collect()
}

/// Title and description for `slug`, falling back to the capitalized slug.
pub fn album_info(albums: &BTreeMap<String, AlbumInfo>, slug: &str) -> AlbumInfo {
    albums.get(slug).cloned().unwrap_or_else(|| AlbumInfo {
        title: fallback_title(slug),
        description: String::new(),
    })
}

/// Render `value` as an SQL string literal: wrapped in `'`, with every `'`
/// doubled.
///
/// ```
/// # use photo_ingest::sync::sql_literal;
/// assert_eq!(sql_literal("it's"), "'it''s'");
/// ```
pub fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Quote `value` as a single POSIX shell word.
///
/// The value is wrapped in single quotes, inside which the shell interprets
/// nothing; an embedded `'` is written as `'\''` (close, escaped quote, reopen).
///
/// ```
/// # use photo_ingest::sync::shell_quote;
/// assert_eq!(shell_quote("it's"), r"'it'\''s'");
/// ```
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Shell word for a database name: bare when it only uses `[A-Za-z0-9_.-]`.
fn shell_word(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if plain {
        value.to_string()
    } else {
        shell_quote(value)
    }
}

/// The idempotent insert for one album.
pub fn album_insert(slug: &str, info: &AlbumInfo) -> String {
    format!(
        "INSERT OR IGNORE INTO albums (slug, title, description) VALUES ({}, {}, {});",
        sql_literal(slug),
        sql_literal(&info.title),
        sql_literal(&info.description)
    )
}

/// The script line that runs one statement against `database`.
pub fn wrangler_command(database: &str, sql: &str) -> String {
    format!(
        "npx wrangler d1 execute {} --command {}",
        shell_word(database),
        shell_quote(sql)
    )
}

/// Full text of the sync script.
pub fn render_script(database: &str, statements: &[AlbumStatement], stamp: &str) -> String {
    let commands: Vec<String> = statements
        .iter()
        .map(|s| wrangler_command(database, &s.sql))
        .collect();
    format!(
        "#!/bin/bash\n# Database sync script - {}\n\n{}\n\necho \"✅ Database sync completed\"",
        stamp,
        commands.join("\n")
    )
}

/// Full text of the SQL file.
pub fn render_sql(statements: &[AlbumStatement]) -> String {
    statements
        .iter()
        .map(|s| s.sql.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build one statement per album directory under `generated_root`.
///
/// Slugs that are not valid UTF-8 and entries that cannot be read are
/// recorded as failed inserts.
pub fn plan_statements(
    generated_root: &Path,
    albums: &BTreeMap<String, AlbumInfo>,
    log: &mut SyncLog,
) -> Result<Vec<AlbumStatement>, ScanError> {
    let listing = scan::list_albums(generated_root)?;
    log.counts.total_rows = listing.discovered();

    for path in &listing.invalid {
        log.counts.failed_inserts += 1;
        log.error(format!(
            "Failed to create album insert for {}: name is not valid UTF-8",
            path.display()
        ));
    }
    for (path, reason) in &listing.unreadable {
        log.counts.failed_inserts += 1;
        log.error(format!(
            "Failed to create album insert for {}: {}",
            path.display(),
            reason
        ));
    }

    Ok(listing
        .entries
        .iter()
        .map(|entry| {
            let info = album_info(albums, &entry.name);
            let sql = album_insert(&entry.name, &info);
            debug!(slug = %entry.name, "planned album insert");
            AlbumStatement {
                slug: entry.name.clone(),
                info,
                sql,
            }
        })
        .collect())
}

fn write_file(path: &Path, content: &str) -> Result<(), SyncError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| SyncError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, content).map_err(|source| SyncError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), SyncError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|source| {
        SyncError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), SyncError> {
    Ok(())
}

/// Write the script and the SQL file; returns their paths.
///
/// The script is replaced on every run. An SQL file from an earlier run in
/// the same second is kept and this one gets a numeric suffix.
pub fn write_artifacts(
    paths: &PathsConfig,
    database: &str,
    statements: &[AlbumStatement],
    stamp: &str,
) -> Result<(PathBuf, PathBuf), SyncError> {
    let script = paths.sync_script.clone();
    write_file(&script, &render_script(database, statements, stamp))?;
    make_executable(&script)?;

    let sql_dir = &paths.sync_sql_dir;
    fs::create_dir_all(sql_dir).map_err(|source| SyncError::Io {
        path: sql_dir.clone(),
        source,
    })?;
    let stem = format!("{}_{}", SYNC_PREFIX, stamp);
    let (sql_file, mut file) =
        create_unique(sql_dir, &stem, "sql").map_err(|source| SyncError::Io {
            path: sql_dir.join(format!("{}.sql", stem)),
            source,
        })?;
    file.write_all(render_sql(statements).as_bytes())
        .map_err(|source| SyncError::Io {
            path: sql_file.clone(),
            source,
        })?;

    Ok((script, sql_file))
}

/// Run the sync generator and persist its log.
///
/// Item problems and missing input end up in the log; only a failure to
/// write the log itself is returned as an error.
pub fn sync(
    paths: &PathsConfig,
    config: &SyncConfig,
    database: &str,
) -> Result<SyncReport, SyncError> {
    let mut log = SyncLog::start(SyncCounts::default());
    let mut report_statements = Vec::new();
    let mut script = None;
    let mut sql_file = None;

    match plan_statements(&paths.generated, &config.albums, &mut log) {
        Err(ScanError::NotFound(root)) => {
            log.fail(format!("{} directory not found", root.display()));
        }
        Err(e) => log.fail(e.to_string()),
        Ok(statements) if statements.is_empty() => {
            if log.errors.is_empty() {
                log.no_changes();
            }
        }
        Ok(statements) => {
            match write_artifacts(paths, database, &statements, log.stamp()) {
                Ok((script_path, sql_path)) => {
                    log.counts.successful_inserts = statements.len();
                    script = Some(script_path);
                    sql_file = Some(sql_path);
                }
                Err(e) => {
                    log.counts.failed_inserts += statements.len();
                    log.fail(e.to_string());
                }
            }
            report_statements = statements;
        }
    }

    log.finish();
    let log_path = log.save(&paths.sync_logs(), SYNC_PREFIX)?;

    Ok(SyncReport {
        log,
        log_path,
        statements: report_statements,
        script,
        sql_file,
        database: database.to_string(),
    })
}
