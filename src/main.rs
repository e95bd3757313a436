//! # charset-policy CLI - Legacy Charset Detection and Conversion
//!
//! Command-line interface that detects the legacy encoding of a file within
//! an encoding group and converts it to a target encoding.

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::io::{self, Read, Write};
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use serde::Serialize;
#[cfg(feature = "cli")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
use charset_policy::{CharsetTranscoder, Converter, ConverterConfig, Encoding, GroupId};

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI features disabled. Enable with --features cli");
    std::process::exit(1);
}

/// charset-policy: legacy charset detection and conversion
#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "charset-policy")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// TOML file with the default group and per-group default encodings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Group used when a command does not name one (overrides the config)
    #[arg(long, global = true)]
    default_group: Option<GroupId>,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Convert a file to a target encoding
    Convert(ConvertArgs),

    /// Detect the encoding of a file
    Detect(DetectArgs),

    /// List registered encoding groups
    Groups,

    /// List supported encodings and their owning group
    Encodings,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ConvertArgs {
    /// Target encoding
    #[arg(short = 't', long = "to")]
    to: Encoding,

    /// Source encoding (detected if not specified)
    #[arg(short = 'f', long = "from")]
    from: Option<Encoding>,

    /// Encoding group whose detect order is used
    #[arg(short, long)]
    group: Option<GroupId>,

    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct DetectArgs {
    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Encoding group whose detect order is used
    #[arg(short, long)]
    group: Option<GroupId>,

    /// Trust structurally valid UTF-8 without the strict validity pass
    #[arg(long)]
    no_malformed_check: bool,
}

#[cfg(feature = "cli")]
#[derive(Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct ConversionReport {
    source_encoding: Option<Encoding>,
    target_encoding: Encoding,
    bytes_processed: usize,
    bytes_written: usize,
    processing_time_ms: u64,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct DetectionReport {
    detected_encoding: Encoding,
    group: GroupId,
    malformed_check: bool,
    sample_size: usize,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct GroupReport {
    group: GroupId,
    is_default: bool,
    default_encoding: Encoding,
    detect_order: Vec<Encoding>,
    encodings: Vec<Encoding>,
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let converter = build_converter(&cli)?;

    match cli.command {
        Commands::Convert(ref args) => convert_command(args, &cli, &converter)?,
        Commands::Detect(ref args) => detect_command(args, &cli, &converter)?,
        Commands::Groups => groups_command(&cli, &converter)?,
        Commands::Encodings => encodings_command(&cli, &converter)?,
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[cfg(feature = "cli")]
fn build_converter(cli: &Cli) -> Result<Converter> {
    let mut config = match cli.config {
        Some(ref path) => ConverterConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => ConverterConfig::default(),
    };
    if let Some(group) = cli.default_group {
        config.default_group = Some(group.name().to_string());
    }

    let registry = config
        .build_registry()
        .context("Invalid converter configuration")?;
    Ok(Converter::with_transcoder(registry, CharsetTranscoder::new()))
}

#[cfg(feature = "cli")]
fn read_input(input: Option<&Path>, verbose: bool) -> Result<Vec<u8>> {
    match input {
        Some(path) => {
            if verbose {
                eprintln!("Reading from: {}", path.display());
            }
            fs::read(path).with_context(|| format!("Failed to read input file: {}", path.display()))
        }
        None => {
            if verbose {
                eprintln!("Reading from stdin");
            }
            let mut buffer = Vec::new();
            io::stdin()
                .read_to_end(&mut buffer)
                .context("Failed to read from stdin")?;
            Ok(buffer)
        }
    }
}

#[cfg(feature = "cli")]
fn convert_command(args: &ConvertArgs, cli: &Cli, converter: &Converter) -> Result<()> {
    let start_time = std::time::Instant::now();

    let input_data = read_input(args.input.as_deref(), cli.verbose)?;

    let converted = converter
        .convert_string(&input_data, args.to, args.from, args.group)
        .with_context(|| format!("Conversion to {} failed", args.to))?;

    if cli.verbose {
        match converted.source_encoding {
            Some(source) => eprintln!("Converting from {} to {}", source, args.to),
            None => eprintln!("Empty input, nothing to convert"),
        }
    }

    if let Some(ref output_path) = args.output {
        fs::write(output_path, &converted.value)
            .with_context(|| format!("Failed to write output file: {}", output_path.display()))?;
        if cli.verbose {
            eprintln!("Wrote to: {}", output_path.display());
        }
    } else {
        io::stdout()
            .write_all(&converted.value)
            .context("Failed to write to stdout")?;
    }

    let processing_time = start_time.elapsed();

    match cli.format {
        OutputFormat::Json => {
            let report = ConversionReport {
                source_encoding: converted.source_encoding,
                target_encoding: args.to,
                bytes_processed: input_data.len(),
                bytes_written: converted.value.len(),
                processing_time_ms: processing_time.as_millis() as u64,
            };
            eprintln!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            if cli.verbose {
                eprintln!(
                    "Processed {} bytes -> {} bytes in {:?}",
                    input_data.len(),
                    converted.value.len(),
                    processing_time
                );
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn detect_command(args: &DetectArgs, cli: &Cli, converter: &Converter) -> Result<()> {
    let sample_data = read_input(args.input.as_deref(), cli.verbose)?;
    let group = args.group.unwrap_or(converter.registry().default_group());
    let malformed_check = !args.no_malformed_check;

    let detected = converter
        .detect_encoding(&sample_data, Some(group), malformed_check)
        .with_context(|| format!("Detection failed in group {group}"))?;

    match cli.format {
        OutputFormat::Json => {
            let report = DetectionReport {
                detected_encoding: detected,
                group,
                malformed_check,
                sample_size: sample_data.len(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!("Detected encoding: {detected}");
            if cli.verbose {
                println!("Group: {group}");
                println!("Sample size: {} bytes", sample_data.len());
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn groups_command(cli: &Cli, converter: &Converter) -> Result<()> {
    let registry = converter.registry();
    let reports: Vec<GroupReport> = registry
        .list_groups()
        .into_iter()
        .filter_map(|group| registry.profile(group))
        .map(|profile| GroupReport {
            group: profile.id(),
            is_default: profile.id() == registry.default_group(),
            default_encoding: profile.default_encoding(),
            detect_order: profile.detect_order().to_vec(),
            encodings: profile.encodings().to_vec(),
        })
        .collect();

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        OutputFormat::Text => {
            for report in reports {
                let marker = if report.is_default { " (default)" } else { "" };
                println!("{}{}", report.group, marker);
                println!("    Default encoding: {}", report.default_encoding);
                println!("    Detect order:     {}", join(&report.detect_order));
                println!("    Encodings:        {}", join(&report.encodings));
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn encodings_command(cli: &Cli, converter: &Converter) -> Result<()> {
    let catalog = converter.registry().catalog();

    match cli.format {
        OutputFormat::Json => {
            let entries: Vec<_> = catalog
                .entries()
                .map(|(encoding, group)| {
                    serde_json::json!({
                        "name": encoding.name(),
                        "group": group.name(),
                        "single_byte": encoding.is_single_byte(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Text => {
            println!("Supported Encodings:");
            println!();
            for (encoding, group) in catalog.entries() {
                println!("{:15} [{}]", encoding.name(), group);
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn join(encodings: &[Encoding]) -> String {
    encodings
        .iter()
        .map(|encoding| encoding.name())
        .collect::<Vec<_>>()
        .join(", ")
}
