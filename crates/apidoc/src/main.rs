use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use apidoc_check::{CheckOptions, NormalizeOptions, Report, ReportFormat};
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use itertools::Itertools;
use mimalloc::MiMalloc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Validate and normalize API reference snapshots produced by a
/// documentation extractor.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a snapshot and report every problem found
    ///
    /// Exits with an error if any element is invalid.
    Check {
        /// Snapshot JSON file (reads stdin if not specified)
        input: Option<PathBuf>,

        /// Output file path (writes to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report format
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,

        /// Treat warnings (unknown kinds, ignored fields, unresolved
        /// back-references) as errors
        #[arg(long)]
        deny_warnings: bool,
    },

    /// Rewrite a snapshot keeping only valid elements
    Normalize {
        /// Snapshot JSON file (reads stdin if not specified)
        input: Option<PathBuf>,

        /// Output file path (writes to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also drop elements and members marked @hidden or @internal
        #[arg(long)]
        drop_hidden: bool,
    },

    /// Print the JSON Schema of the snapshot format
    Schema {
        /// Output file path (writes to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Text,
}

impl From<Format> for ReportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => ReportFormat::Json,
            Format::Text => ReportFormat::Text,
        }
    }
}

fn open_input(path: Option<PathBuf>) -> Result<Box<dyn Read>> {
    Ok(match path {
        Some(path) => {
            let file = File::open(&path)
                .with_context(|| format!("opening {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(std::io::stdin().lock()),
    })
}

fn open_output(path: Option<PathBuf>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("creating {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(std::io::stdout().lock()),
    })
}

fn finish(report: &Report, deny_warnings: bool) -> Result<()> {
    if !report.passes(deny_warnings) {
        bail!(
            "{}: {} errors, {} warnings",
            report.snapshot,
            report.errors,
            report.warnings
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON on stdout stays clean for piping. Default to
    // warn, allowlist our crates.
    const CRATES: &[&str] = &["apidoc", "apidoc_check", "apidoc_schemas"];
    let level = cli.verbose.tracing_level_filter();
    let allowlist = CRATES.iter().map(|c| format!("{c}={level}")).join(",");
    let filter = EnvFilter::new(format!("warn,{allowlist}"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::ENTER | FmtSpan::CLOSE)
        .init();

    match cli.command {
        Commands::Check {
            input,
            output,
            format,
            deny_warnings,
        } => {
            let input = open_input(input)?;
            let mut writer = open_output(output)?;
            let options = CheckOptions {
                format: format.into(),
            };
            let report = apidoc_check::check(input, &mut *writer, &options)?;
            writer.flush()?;
            finish(&report, deny_warnings)
        }
        Commands::Normalize {
            input,
            output,
            drop_hidden,
        } => {
            let input = open_input(input)?;
            let mut writer = open_output(output)?;
            let options = NormalizeOptions { drop_hidden };
            let report =
                apidoc_check::normalize(input, &mut *writer, &options)?;
            writer.flush()?;
            if report.errors > 0 {
                tracing::warn!(
                    errors = report.errors,
                    "invalid elements were dropped; run `apidoc check` for details"
                );
            }
            Ok(())
        }
        Commands::Schema { output } => {
            let mut writer = open_output(output)?;
            apidoc_check::write_json_schema(&mut *writer)?;
            writer.flush()?;
            Ok(())
        }
    }
}
