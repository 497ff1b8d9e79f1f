use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use logzip::compress::{PARAMETER_MAPPING_FILE, TEMPLATE_MAPPING_FILE};
use logzip::{read_archive, CompressionLevel, Kernel, LogZipper, LogzipError, ZipConfig};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Template-driven log compressor
#[derive(Parser)]
#[command(name = "logzip")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Configuration file path (JSON)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a log file into a columnar tar archive
    Compress {
        /// Log file to compress
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Template file, one template per line (levels 2 and 3)
        #[arg(short, long, value_name = "FILE")]
        templates: Option<PathBuf>,

        /// Log line format, e.g. "<Date> <Time> <Level>: <Content>"
        #[arg(short, long, value_name = "FORMAT")]
        format: Option<String>,

        /// Directory the archive is written to
        #[arg(short, long, value_name = "DIR")]
        out_dir: Option<PathBuf>,

        /// Archive base name (".tar.<kernel>" is appended)
        #[arg(short = 'n', long, value_name = "NAME")]
        out_name: Option<String>,

        /// Keep intermediate files in this directory
        #[arg(long, value_name = "DIR")]
        tmp_dir: Option<PathBuf>,

        /// 1: raw columns, 2: parsed, 3: parsed and dictionary coded
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=3))]
        level: Option<u8>,

        /// Drop parameter columns instead of storing them
        #[arg(long)]
        lossy: bool,

        /// Archive codec: gz, bz2, lzma or zst
        #[arg(short, long)]
        kernel: Option<Kernel>,

        /// Worker threads for loading and matching (0 = one per core)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Print the run report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// List the entries of a logzip archive
    Inspect {
        /// Archive file (.tar.gz, .tar.bz2, .tar.lzma or .tar.zst)
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
    },
}

/// Options of the compress command that override the configuration file
struct CompressArgs {
    templates: Option<PathBuf>,
    format: Option<String>,
    out_dir: Option<PathBuf>,
    out_name: Option<String>,
    tmp_dir: Option<PathBuf>,
    level: Option<u8>,
    lossy: bool,
    kernel: Option<Kernel>,
    workers: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = if let Some(config_path) = &cli.config {
        load_config(config_path)?
    } else {
        ZipConfig::default()
    };

    match cli.command {
        Commands::Compress {
            input,
            templates,
            format,
            out_dir,
            out_name,
            tmp_dir,
            level,
            lossy,
            kernel,
            workers,
            json,
        } => {
            let args = CompressArgs {
                templates,
                format,
                out_dir,
                out_name,
                tmp_dir,
                level,
                lossy,
                kernel,
                workers,
            };
            compress_command(&input, args, config, json, cli.quiet)?;
        }
        Commands::Inspect { input } => {
            inspect_command(&input, cli.quiet)?;
        }
    }

    Ok(())
}

/// Set up logging based on verbosity flags
fn setup_logging(verbose: bool, quiet: bool) {
    let log_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    debug!("Logging initialized at {} level", log_level);
}

/// Load configuration from a JSON file
fn load_config(path: &Path) -> Result<ZipConfig> {
    let config = ZipConfig::from_json_file(path)
        .map_err(|e| map_logzip_error(e, "Loading configuration"))
        .with_context(|| format!("Failed to load config file: {}", path.display()))?;
    debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Apply command line overrides on top of the file configuration
fn apply_overrides(mut config: ZipConfig, args: &CompressArgs) -> Result<ZipConfig> {
    if let Some(format) = &args.format {
        config = config.with_log_format(format.clone());
    }
    if let Some(out_dir) = &args.out_dir {
        config = config.with_out_dir(out_dir.clone());
    }
    if let Some(out_name) = &args.out_name {
        config = config.with_out_name(out_name.clone());
    }
    if let Some(tmp_dir) = &args.tmp_dir {
        config = config.with_tmp_dir(tmp_dir.clone());
    }
    if let Some(level) = args.level {
        let level = CompressionLevel::try_from(level).map_err(|e| map_logzip_error(e, "Level"))?;
        config = config.with_level(level);
    }
    if args.lossy {
        config = config.with_lossy(true);
    }
    if let Some(kernel) = args.kernel {
        config = config.with_kernel(kernel);
    }
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    Ok(config)
}

/// Execute the compress command
fn compress_command(
    input: &Path,
    args: CompressArgs,
    config: ZipConfig,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let start_time = Instant::now();
    let config = apply_overrides(config, &args)?;
    info!(
        "Starting compression: {} -> {}",
        input.display(),
        config.archive_path().display()
    );

    if args.templates.is_none() && config.level.is_structured() {
        warn!("Level {} needs a template file (--templates)", config.level);
    }

    let zipper = LogZipper::new(config).map_err(|e| map_logzip_error(e, "Configuration"))?;

    let progress = create_progress_bar(quiet || json, "Compressing");
    let result = zipper.zip_file(input, args.templates.as_deref());
    progress.finish_and_clear();
    let report = result
        .map_err(|e| map_logzip_error(e, "Compression"))
        .with_context(|| format!("Failed to compress {}", input.display()))?;

    let total_duration = start_time.elapsed();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
    } else if !quiet {
        eprintln!("✓ Compression complete");
        eprintln!("  Archive:     {}", report.archive.display());
        eprintln!("  Input:       {}", format_bytes(report.raw_bytes));
        eprintln!("  Output:      {}", format_bytes(report.archive_bytes));
        eprintln!("  Ratio:       {:.2}x", report.compression_ratio());
        eprintln!(
            "  Lines:       {} loaded, {} failed",
            report.loaded_lines, report.failed_lines
        );
        eprintln!(
            "  Matched:     {:.1}% ({} events)",
            report.match_rate() * 100.0,
            report.events
        );
        eprintln!("  Time:        {:.3}s", total_duration.as_secs_f64());
    }

    info!(
        "Compression completed in {:.3}s",
        total_duration.as_secs_f64()
    );

    Ok(())
}

/// Execute the inspect command
fn inspect_command(input: &Path, quiet: bool) -> Result<()> {
    let progress = create_progress_bar(quiet, "Reading archive");
    let entries = read_archive(input).map_err(|e| map_logzip_error(e, "Reading archive"));
    progress.finish_and_clear();
    let entries = entries.with_context(|| format!("Failed to read {}", input.display()))?;

    let mut total = 0;
    let mut templates = None;
    let mut codes = None;
    println!("{:<40} {:>12}", "Entry", "Size");
    for entry in &entries {
        total += entry.data.len() as u64;
        println!("{:<40} {:>12}", entry.name, format_bytes(entry.data.len() as u64));
        if entry.name == TEMPLATE_MAPPING_FILE {
            templates = Some(count_keys(&entry.data, &entry.name)?);
        } else if entry.name == PARAMETER_MAPPING_FILE {
            codes = Some(count_keys(&entry.data, &entry.name)?);
        }
    }

    println!();
    println!("Entries:     {}", entries.len());
    println!("Unpacked:    {}", format_bytes(total));
    match templates {
        Some(n) => println!("Templates:   {}", n),
        None => println!("Templates:   none (level 1)"),
    }
    match codes {
        Some(n) => println!("Dictionary:  {} codes", n),
        None => println!("Dictionary:  none"),
    }

    Ok(())
}

/// Number of keys of a JSON object entry
fn count_keys(data: &[u8], name: &str) -> Result<usize> {
    let map: BTreeMap<String, serde_json::Value> =
        serde_json::from_slice(data).with_context(|| format!("Malformed {}", name))?;
    Ok(map.len())
}

/// Create a progress bar with the given message
fn create_progress_bar(quiet: bool, message: &str) -> ProgressBar {
    if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Format bytes in human-readable format
fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Map LogzipError to anyhow::Error with context
fn map_logzip_error(error: LogzipError, context: &str) -> anyhow::Error {
    match error {
        LogzipError::MissingLogFormat => {
            anyhow::anyhow!("{}: a log format is required (--format or \"log_format\" in the config file)", context)
        }
        LogzipError::MissingContentField { format, level } => {
            anyhow::anyhow!(
                "{}: format '{}' has no <Content> field; use --level 1 or add <Content> (level {} needs it)",
                context,
                format,
                level
            )
        }
        LogzipError::EmptyTemplates => {
            anyhow::anyhow!("{}: no templates given; pass a non-empty --templates file or use --level 1", context)
        }
        LogzipError::WorkerFailure { phase, message } => {
            anyhow::anyhow!("{}: worker failed during {}: {}", context, phase, message)
        }
        other => anyhow::Error::new(other).context(context.to_string()),
    }
}
