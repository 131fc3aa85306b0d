//! CLI for albumsync.
//!
//! Pipeline: load config -> scan library -> per folder: fetch assets -> check album -> create.

mod logging;

use albumsync_core::{FileConfig, LibraryRoot, SyncConfig, SyncError, SyncResult};
use albumsync_engine::sink::json_stream::JsonStreamSink;
use albumsync_engine::{scan_library, ExclusionSet, ScanOutcome, SyncOptions, SyncReport};
use albumsync_provider::ImmichGateway;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Clean run.
const EXIT_OK: u8 = 0;
/// Config, library root, or output failure; nothing (more) was synced.
const EXIT_FATAL: u8 = 1;
/// Run finished but some folders or remote calls failed.
const EXIT_PARTIAL: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "albumsync", version, about = "Create Immich albums from library folders")]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    /// Log filter, e.g. `debug` or `albumsync_engine=debug,info`. Defaults to RUST_LOG, then `info`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append log lines to this file.
    #[arg(long, global = true, env = "ALBUMSYNC_LOG_FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct ConfigArgs {
    /// TOML file with `host`, `library_root`, `api_key`, `exclusion_patterns`.
    #[arg(short, long, global = true, env = "ALBUMSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Server as `host:port` or a full base URL.
    #[arg(long, global = true, env = "ALBUMSYNC_HOST")]
    host: Option<String>,

    #[arg(long, global = true, env = "ALBUMSYNC_LIBRARY_ROOT")]
    library_root: Option<PathBuf>,

    #[arg(long, global = true, env = "ALBUMSYNC_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Directory-name glob to skip; repeat or comma-separate. Replaces the defaults.
    #[arg(long = "exclude", global = true, env = "ALBUMSYNC_EXCLUDE", value_delimiter = ',')]
    exclude: Option<Vec<String>>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an album for every candidate folder that has assets.
    Sync {
        /// Perform all reads and log intended actions without creating albums.
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Print the report as JSON instead of the summary table.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Sink output: "ndjson" writes NDJSON to stdout,
        /// "ndjson:/path/to/file" writes to file.
        #[arg(long, value_parser = parse_sink)]
        sink: Option<SinkTarget>,
    },
    /// List the folders that would become albums. No network access.
    Scan {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SinkTarget {
    Stdout,
    File(PathBuf),
}

fn parse_sink(spec: &str) -> Result<SinkTarget, String> {
    if spec == "ndjson" {
        Ok(SinkTarget::Stdout)
    } else if let Some(path) = spec.strip_prefix("ndjson:").filter(|p| !p.is_empty()) {
        Ok(SinkTarget::File(PathBuf::from(path)))
    } else {
        Err(format!("unknown sink {spec:?}, use 'ndjson' or 'ndjson:/path'"))
    }
}

impl ConfigArgs {
    fn load(&self) -> SyncResult<SyncConfig> {
        let file = match &self.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        let overrides = FileConfig {
            host: self.host.clone(),
            scheme: None,
            library_root: self.library_root.clone(),
            api_key: self.api_key.clone(),
            exclusion_patterns: self.exclude.clone(),
        };
        SyncConfig::from_layers(file.merge(overrides))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match logging::init(cli.log_level.as_deref(), cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("albumsync: {e}");
            return ExitCode::from(EXIT_FATAL);
        }
    };

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!(error = %e, "run aborted");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

async fn run(cli: Cli) -> SyncResult<u8> {
    let config = cli.config.load()?;
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Scan { json } => {
            let root = LibraryRoot::open(&config.library_root)?;
            let exclusions = ExclusionSet::new(config.exclusion_patterns.iter().cloned())?;
            let scan = scan_library(&root, &exclusions)?;

            if json {
                println!("{}", to_json(&scan)?);
            } else {
                for c in &scan.candidates {
                    println!("{}\t{}", c.name, c.path.display());
                }
            }
            Ok(if scan.unreadable.is_empty() { EXIT_OK } else { EXIT_PARTIAL })
        }
        Commands::Sync {
            dry_run,
            json,
            sink,
        } => {
            tracing::info!(
                server = %config.base_url,
                root = %config.library_root.display(),
                dry_run,
                "starting run"
            );

            let gateway = ImmichGateway::new(&config)
                .map_err(|e| SyncError::Config(format!("cannot build HTTP client: {e}")))?;
            let (scan, report) =
                albumsync_engine::sync_library(&config, &gateway, SyncOptions { dry_run }).await?;

            emit(&scan, &report, json, sink.as_ref())?;
            Ok(exit_code(&scan, &report))
        }
    }
}

fn emit(
    scan: &ScanOutcome,
    report: &SyncReport,
    json: bool,
    sink: Option<&SinkTarget>,
) -> SyncResult<()> {
    if let Some(target) = sink {
        let (summary, outcomes) = report.to_rows(scan);
        match target {
            SinkTarget::Stdout => {
                let mut s = JsonStreamSink::stdout();
                s.write_outcomes(&outcomes)?;
                s.write_summary(&summary)?;
                let n = s.finish()?;
                tracing::info!(rows = n, "ndjson sink: wrote to stdout");
            }
            SinkTarget::File(path) => {
                let file = std::fs::File::create(path)?;
                let mut s = JsonStreamSink::new(file);
                s.write_outcomes(&outcomes)?;
                s.write_summary(&summary)?;
                let n = s.finish()?;
                tracing::info!(rows = n, path = %path.display(), "ndjson sink: wrote to file");
            }
        }
        // Still print report to stderr so it's visible.
        eprint!("{}", report.render(scan));
    } else if json {
        println!("{}", to_json(report)?);
    } else {
        print!("{}", report.render(scan));
    }
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> SyncResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| SyncError::Sink(std::io::Error::other(e)))
}

fn exit_code(scan: &ScanOutcome, report: &SyncReport) -> u8 {
    if report.has_failures() || !scan.unreadable.is_empty() {
        EXIT_PARTIAL
    } else {
        EXIT_OK
    }
}
