use clap::{Parser, Subcommand};
use photo_ingest::config::{self, PipelineConfig};
use photo_ingest::imaging::RustBackend;
use photo_ingest::{output, process, sync};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "photo-ingest")]
#[command(about = "Batch ingestion of album photos into web variants and database sync scripts")]
#[command(long_about = "\
Batch ingestion of album photos into web variants and database sync scripts

Every subdirectory of the originals root is an album. New photos get the next
sequence number of their album and three WebP variants plus an EXIF sidecar:

  images/originals/doors/a.jpg
      → images/generated/doors/_manifest.json     {\"a.jpg\": \"001\"}
      → images/generated/doors/001/thumb.webp     320px
      → images/generated/doors/001/medium.webp    1200px
      → images/generated/doors/001/full.webp      2400px
      → images/generated/doors/001/meta.json

The sync step writes one INSERT OR IGNORE per generated album to sync-db.sh
(run it to apply) and db-sync/sync_<timestamp>.sql. Both steps are safe to
rerun and log to logs/.

Environment:
  DB_NAME    target database for sync (overrides the config file)
  RUST_LOG   diagnostic log filter (default: warn)

Run 'photo-ingest gen-config' to generate a documented photo-ingest.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (stock defaults if it does not exist)
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Originals root (overrides paths.originals)
    #[arg(long, global = true)]
    originals: Option<PathBuf>,

    /// Generated output root (overrides paths.generated)
    #[arg(long, global = true)]
    generated: Option<PathBuf>,

    /// Run log root (overrides paths.logs)
    #[arg(long, global = true)]
    logs: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate variants and sidecars for new originals
    Process,
    /// Write the database sync script and SQL file
    Sync,
    /// Run process, then sync
    All,
    /// Validate the config and report pending photos without writing
    Check,
    /// Print a stock photo-ingest.toml with all options documented
    GenConfig,
}

impl Cli {
    /// Load the config file and apply path overrides from the command line.
    fn load_config(&self) -> Result<PipelineConfig, config::ConfigError> {
        let mut config = config::load_config(&self.config)?;
        if let Some(originals) = &self.originals {
            config.paths.originals = originals.clone();
        }
        if let Some(generated) = &self.generated {
            config.paths.generated = generated.clone();
        }
        if let Some(logs) = &self.logs {
            config.paths.logs = logs.clone();
        }
        Ok(config)
    }
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let failed = match cli.command {
        Command::Process => run_process(&cli.load_config()?)?,
        Command::Sync => run_sync(&cli.load_config()?)?,
        Command::All => {
            let config = cli.load_config()?;
            println!("==> Processing images");
            let process_failed = run_process(&config)?;
            println!();
            println!("==> Generating database sync");
            let sync_failed = run_sync(&config)?;
            process_failed || sync_failed
        }
        Command::Check => {
            let config = cli.load_config()?;
            let database = database_name(&config);
            let surveys = process::survey(&config.paths.originals, &config.paths.generated)?;
            output::print_check_output(&config, &database, &surveys);
            println!("==> Config is valid");
            false
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            false
        }
    };

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn database_name(config: &PipelineConfig) -> String {
    config::resolve_database_name(
        &config.sync,
        std::env::var(config::DATABASE_ENV_VAR).ok(),
    )
}

/// Run the processor with a progress printer; returns whether it failed.
fn run_process(config: &PipelineConfig) -> Result<bool, Box<dyn std::error::Error>> {
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_process_event(&event) {
                println!("{}", line);
            }
        }
    });
    let backend = RustBackend::new();
    let report = process::process(&config.paths, &config.variants, &backend, Some(tx))?;
    printer
        .join()
        .map_err(|_| "progress printer thread panicked")?;
    output::print_process_summary(&report);
    Ok(report.log.status.is_failure())
}

/// Run the sync generator; returns whether it failed.
fn run_sync(config: &PipelineConfig) -> Result<bool, Box<dyn std::error::Error>> {
    let database = database_name(config);
    let report = sync::sync(&config.paths, &config.sync, &database)?;
    output::print_sync_output(&report);
    Ok(report.log.status.is_failure())
}
