//! munch CLI - convert database records between input specs and output formats.
//!
//! The input filename drives the defaults: its extension is the spec
//! fallback and its basename (minus extension) the target fallback for the
//! configuration cascade. The output filename extension is the format
//! fallback.

use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use munch::{FormatRegistry, Pipeline, RunOptions, TargetTable};

#[derive(Parser)]
#[command(name = "munch")]
#[command(version, about = "Convert database records between input specs and output formats", long_about = None)]
struct Cli {
    /// Target table (YAML)
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Input file [default: STDIN]
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file [default: STDOUT]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Input format (spec) [default: file extension of the input file]
    #[arg(short, long)]
    spec: Option<String>,

    /// Output format [default: file extension of the output file]
    #[arg(short, long)]
    format: Option<String>,

    /// Target whose config to use [default: cascade derived from the input filename]
    #[arg(short, long)]
    target: Option<String>,

    /// List available input formats (specs) and exit
    #[arg(short = 'L', long)]
    list_specs: bool,

    /// List available output formats and exit
    #[arg(short = 'l', long)]
    list_formats: bool,

    /// Input file as positional argument
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let registry = FormatRegistry::builtin();

    if cli.list_specs {
        println!("Available input formats (specs):");
        for tag in registry.input_tags() {
            println!("  - {}", tag);
        }
        return;
    }

    if cli.list_formats {
        println!("Available output formats:");
        for tag in registry.output_tags() {
            println!("  - {}", tag);
        }
        return;
    }

    if let Err(e) = run(&cli, &registry) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli, registry: &FormatRegistry) -> Result<(), String> {
    let input_path = cli.input.clone().or_else(|| cli.file.clone());

    let (spec_fallback, target_fallback) = input_path
        .as_deref()
        .map(filename_fallbacks)
        .unwrap_or((None, None));

    let spec = cli
        .spec
        .as_deref()
        .map(str::to_lowercase)
        .or(spec_fallback)
        .ok_or("No input format (spec) specified and none could be inferred.")?;
    if !registry.has_input(&spec) {
        return Err(format!(
            "Invalid input format (spec): {}. Use --list-specs to get a list of available specs.",
            spec
        ));
    }

    let format = cli
        .format
        .as_deref()
        .map(str::to_lowercase)
        .or_else(|| cli.output.as_deref().and_then(format_fallback))
        .ok_or("No output format specified and none could be inferred.")?;
    if !registry.has_output(&format) {
        return Err(format!(
            "Invalid output format: {}. Use --list-formats to get a list of available formats.",
            format
        ));
    }

    let table = TargetTable::load_from_file(&cli.config).map_err(|e| e.to_string())?;

    let mut reader: Box<dyn BufRead> = match &input_path {
        Some(path) => Box::new(BufReader::new(File::open(path).map_err(|e| {
            format!("Can't open input file {}: {}", path.display(), e)
        })?)),
        None => Box::new(io::stdin().lock()),
    };

    let mut writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(File::create(path).map_err(|e| {
            format!("Can't open output file {}: {}", path.display(), e)
        })?)),
        None => Box::new(io::stdout().lock()),
    };

    let pipeline = Pipeline::new(registry, &table);
    let opts = RunOptions {
        spec: &spec,
        format: &format,
        target: cli.target.as_deref(),
        target_fallback: target_fallback.as_deref(),
    };
    pipeline
        .run(&opts, &mut reader, &mut writer)
        .map_err(|e| e.to_string())?;

    Ok(())
}

/// Derive (spec fallback, target fallback) from the input filename.
///
/// `ford.midos` yields spec `midos` and target base `ford`; a dotless
/// filename is its own target base.
fn filename_fallbacks(path: &Path) -> (Option<String>, Option<String>) {
    let Some(basename) = path.file_name().and_then(|n| n.to_str()) else {
        return (None, None);
    };

    let parts: Vec<&str> = basename.split('.').collect();
    let spec = parts.last().map(|s| s.to_lowercase());
    let target = if parts.len() > 1 {
        Some(parts[..parts.len() - 1].join("."))
    } else {
        parts.first().map(|s| s.to_string())
    };

    (spec, target)
}

/// Derive the format fallback from the output filename extension.
fn format_fallback(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
}
