use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum OutputFormat {
    /// JSON array of { name, content } objects
    Json,
    /// Newline-separated name|svg pairs
    Pairs,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Json
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Config {
    /// Input SQL dump path (stdin when omitted)
    pub input: Option<PathBuf>,
    /// Output file path
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Output format
    #[serde(default)]
    pub format: OutputFormat,
    /// Keep only records whose content is a complete <svg> document
    #[serde(default)]
    pub require_svg: bool,
    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,
}

fn default_output() -> PathBuf {
    PathBuf::from("lumise_shapes_data.json")
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input: None,
            output: default_output(),
            format: OutputFormat::Json,
            require_svg: false,
            verbose: false,
        }
    }
}

impl Config {

    pub fn load(config_path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
        let config_str = fs::read_to_string(config_path)?;
        let config: Config = match config_path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&config_str)?,
            Some("toml") => toml::from_str(&config_str)?,
            _ => return Err("Unsupported config file format. Use .json or .toml".into()),
        };
        Ok(config)
    }

    pub fn save_default(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let config = Config::default();
        let config_str = match config_path.extension().and_then(|s| s.to_str()) {
            Some("toml") => toml::to_string_pretty(&config)?,
            _ => serde_json::to_string_pretty(&config)?, // Default to JSON
        };

        let mut file = File::create(config_path)?;
        file.write_all(config_str.as_bytes())?;
        println!("Generated default configuration file: {}", config_path.display());
        Ok(())
    }

}

// ============================================================================
// tests
// ============================================================================
