//! clif - inspect and validate CLI slice files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clif::{DecodeOptions, Decoder, File};
use clif_math::format_fixed;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "clif")]
#[command(about = "Decode and inspect Common Layer Interface slice files", long_about = None)]
struct Cli {
    /// Decode options file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log decoder details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display header, models and layers of a file
    Info {
        /// Path to the .cli file
        file: PathBuf,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Decode files and report which ones fail
    Check {
        /// Paths to .cli files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .finish(),
    )?;

    let options = match &cli.config {
        Some(path) => load_options(path)?,
        None => DecodeOptions::default(),
    };
    let decoder = Decoder::new(options);

    match cli.command {
        Commands::Info { file, json } => show_info(&decoder, &file, json),
        Commands::Check { files } => {
            let failed = check_files(&decoder, &files);
            if failed > 0 {
                anyhow::bail!("{failed} of {} files failed to decode", files.len());
            }
            Ok(())
        }
    }
}

fn load_options(path: &Path) -> Result<DecodeOptions> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let options: DecodeOptions =
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
    options.validate()?;
    Ok(options)
}

fn decode_file(decoder: &Decoder, path: &Path) -> Result<File> {
    if !path.is_file() {
        anyhow::bail!("no such file: {}", path.display());
    }
    decoder
        .decode(path)
        .with_context(|| format!("decoding {}", path.display()))
}

fn show_info(decoder: &Decoder, path: &Path, json: bool) -> Result<()> {
    let file = decode_file(decoder, path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&file.summary())?);
        return Ok(());
    }

    let header = file.header();
    println!("CLI file: {}", path.display());
    println!("  Type: {}", header.file_type);
    println!("  Units: {} mm", header.units);
    println!("  Version: {}", header.version);
    if let Some(date) = header.date {
        println!("  Date: {}", date.format("%Y-%m-%d"));
    }
    if let Some(dimension) = &header.dimension {
        println!("  Dimension: {dimension}");
    }
    if let Some(layers) = header.layers {
        println!("  Declared layers: {layers}");
    }
    println!("  Align: {}", header.align);
    for label in &header.labels {
        println!("  Label {label}");
    }
    if let Some(user_data) = &header.user_data {
        println!("  User data: {user_data}");
    }

    for model in file.models() {
        let label = header.label_for(model.id()).unwrap_or("unnamed");
        println!(
            "\nModel {} ({label}): {} layers, area {}",
            model.id(),
            model.layers().len(),
            format_fixed(model.total_area())
        );
        for layer in model.layers() {
            println!(
                "  [{}] z={} area={} perimeter={} polylines={} hatches={}",
                layer.index(),
                format_fixed(layer.z()),
                format_fixed(layer.area()),
                format_fixed(layer.perimeter()),
                layer.polylines().len(),
                layer.hatches().len()
            );
        }
    }

    Ok(())
}

/// Decode each file, printing one status line per file. Returns the failure count.
fn check_files(decoder: &Decoder, files: &[PathBuf]) -> usize {
    let mut failed = 0;
    for path in files {
        match decode_file(decoder, path) {
            Ok(file) => println!(
                "ok     {} ({} models, {} layers)",
                path.display(),
                file.models().len(),
                file.geometry().layer_count()
            ),
            Err(e) => {
                failed += 1;
                println!("error  {}: {e:#}", path.display());
            }
        }
    }
    failed
}
