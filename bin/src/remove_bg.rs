use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use clap::Parser;
use lumise_tools::BackgroundRemover;

#[derive(Parser)]
#[command(name = "remove-bg")]
#[command(about = "Remove the background from an image read on standard input")]
#[command(version = "1.0")]
struct Args {
    /// Path to the ONNX matting model
    #[arg(short, long, default_value = "u2net.onnx")]
    model: PathBuf,
}

fn process(model_path: &Path, input: &[u8]) -> anyhow::Result<Vec<u8>> {
    let remover = BackgroundRemover::new(model_path)?;
    remover.remove_background_bytes(input)
}

fn main() {
    let args = Args::parse();

    let mut input = Vec::new();
    if let Err(e) = std::io::stdin().read_to_end(&mut input) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    if input.is_empty() {
        eprintln!("No input data");
        std::process::exit(1);
    }

    match process(&args.model, &input) {
        Ok(output) => {
            let mut stdout = std::io::stdout();
            if let Err(e) = stdout.write_all(&output).and_then(|_| stdout.flush()) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
