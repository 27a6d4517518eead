//! Vibdose - vibration exposure analysis for triaxial accelerometer logs
//!
//! Entry point for the command line tool.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use vibdose::config::AppConfig;
use vibdose::export::{Report, ReportFormat};
use vibdose::ingest::source::{collect_log_files, resolve_files};
use vibdose::{ImportSession, SqliteStore};

#[derive(Debug, Parser)]
#[command(name = "vibdose", version, about = "Accelerometer log vibration analysis")]
struct Cli {
    /// Config file (default: <config_dir>/vibdose/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import a log directory and write the trace, VDV and event report
    Report {
        /// Directory holding the log files and exclusion store
        dir: PathBuf,
        /// Import only these files (names relative to DIR)
        files: Vec<PathBuf>,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = Format::Csv)]
        format: Format,
        /// Skip event segmentation and the windowed maximum column
        #[arg(long)]
        no_windowed_max: bool,
    },
    /// Set or clear the exclusion class of one trace
    Exclude {
        dir: PathBuf,
        /// Trace index as printed by `list`
        #[arg(short, long)]
        trace: usize,
        /// Exclusion class; 0 clears
        #[arg(short, long)]
        code: u32,
    },
    /// Import a log directory and print one line per trace
    List { dir: PathBuf },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
}

impl From<Format> for ReportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Csv => ReportFormat::Csv,
            Format::Json => ReportFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so reports on stdout stay clean
    let default_level = if cli.verbose { "vibdose=debug" } else { "vibdose=info" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };

    match cli.command {
        Command::Report {
            dir,
            files,
            output,
            format,
            no_windowed_max,
        } => {
            let windowed_max = config.windowed_max && !no_windowed_max;
            let session = load_session(&dir, &files, &config, windowed_max)?;
            write_report(&session, output.as_deref(), format.into(), windowed_max)
        }
        Command::Exclude { dir, trace, code } => {
            let mut session = load_session(&dir, &[], &config, false)?;
            let mut store = SqliteStore::open_in(&dir, &config.store_file_name)
                .context("Exclusion store unavailable")?;
            session
                .set_exclusion(trace, code, &mut store)
                .with_context(|| format!("Failed to set exclusion on trace {}", trace))?;
            if let Some(t) = session.trace(trace) {
                println!(
                    "{} {} -> exclusion {}",
                    t.file_name,
                    t.start_time.format("%d/%m/%Y %H:%M:%S"),
                    code
                );
            }
            Ok(())
        }
        Command::List { dir } => {
            let session = load_session(&dir, &[], &config, config.windowed_max)?;
            print_traces(&session, config.windowed_max)
        }
    }
}

/// Run one import cycle: enumerate, parse, merge exclusions, segment events
fn load_session(
    dir: &Path,
    files: &[PathBuf],
    config: &AppConfig,
    windowed_max: bool,
) -> Result<ImportSession> {
    let paths = if files.is_empty() {
        collect_log_files(dir, &config.extension)
            .with_context(|| format!("Failed to list logs in {}", dir.display()))?
    } else {
        resolve_files(dir, files, &config.extension)
    };
    if paths.is_empty() {
        warn!(dir = %dir.display(), extension = %config.extension, "No log files selected");
    }

    let mut session = ImportSession::new();
    session.begin_import();
    session.import_files(&paths);

    // Traces keep exclusion code 0 when the store cannot be opened
    match SqliteStore::open_in(dir, &config.store_file_name) {
        Ok(store) => {
            // A failed merge is already logged and leaves every code at 0
            let _ = session.apply_exclusions(&store);
        }
        Err(e) => warn!(error = %e, "Exclusion store unavailable, no exclusions applied"),
    }

    if windowed_max {
        let events = session.apply_windowed_max();
        info!(events, "Computed windowed maxima");
    }

    Ok(session)
}

fn write_report(
    session: &ImportSession,
    output: Option<&Path>,
    format: ReportFormat,
    windowed_max: bool,
) -> Result<()> {
    let buckets = session.vdv_buckets();
    let report = Report::build(session.traces(), &buckets, session.extras(), windowed_max);

    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            report.write(BufWriter::new(file), format)?;
            info!(path = %path.display(), "Report saved");
        }
        None => {
            let stdout = io::stdout();
            report.write(stdout.lock(), format)?;
        }
    }
    Ok(())
}

fn print_traces(session: &ImportSession, windowed_max: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for (i, t) in session.traces().iter().enumerate() {
        let wmax = if windowed_max && t.windowed_max > 0.0 {
            format!("{:.3}", t.windowed_max)
        } else {
            String::new()
        };
        writeln!(
            out,
            "{:>5}  {:<20} {}  {:>10}  {:>10}  {:>10}  {}",
            i,
            t.file_name,
            t.start_time.format("%d-%H:%M:%S"),
            t.max_deviation,
            t.rms_deviation,
            wmax,
            if t.is_excluded() { "X" } else { "" }
        )?;
    }
    Ok(())
}
