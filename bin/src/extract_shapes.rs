mod config;

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use clap::Parser;
use lumise_tools::{extract_shapes, write_json, write_pairs};
use crate::config::{Config, OutputFormat};

#[derive(Parser)]
#[command(name = "extract-shapes")]
#[command(about = "Extract shape records from a Lumise SQL dump")]
#[command(version = "1.0")]
struct Args {
    /// Input SQL dump path (reads standard input when omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Keep only records whose content is a complete <svg> document
    #[arg(long)]
    require_svg: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Generate default configuration file and exit
    #[arg(long)]
    generate_config: bool,

    /// Verbose output
    #[arg(long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Handle config generation
    if args.generate_config {
        let config_path = args.config.unwrap_or_else(|| PathBuf::from("extract_shapes.json"));
        Config::save_default(&config_path)?;
        return Ok(());
    }

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        Config::load(config_path)?
    } else {
        Config::default()
    };

    // Override config with command line arguments
    if args.input.is_some() {
        config.input = args.input;
    }
    if let Some(output) = args.output {
        config.output = output;
    }
    if let Some(format) = args.format {
        config.format = format;
    }
    if args.require_svg {
        config.require_svg = true;
    }
    if args.verbose {
        config.verbose = true;
    }

    let sql = match &config.input {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| format!("Failed to read standard input: {}", e))?;
            buffer
        }
    };

    let mut shapes = extract_shapes(&sql);
    if config.require_svg {
        shapes.retain(|record| record.is_svg());
    }

    if config.verbose {
        for record in &shapes {
            println!("  - {} ({} bytes)", record.name, record.content.len());
        }
    }

    match config.format {
        OutputFormat::Json => write_json(&shapes, &config.output)
            .map_err(|e| format!("Failed to write {}: {}", config.output.display(), e))?,
        OutputFormat::Pairs => write_pairs(&shapes, &config.output)
            .map_err(|e| format!("Failed to write {}: {}", config.output.display(), e))?,
    }

    println!("Extracted {} shapes to {}", shapes.len(), config.output.display());

    Ok(())
}
