use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::source::event_source::SourceSettings;
use crate::source::vision_model::{DEFAULT_VISION_ENDPOINT, DEFAULT_VISION_MODEL, DEFAULT_VISION_TIMEOUT_SECS};

pub const DEFAULT_CONFIG_PATH: &str = "screen-tagging.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "screen-tagging",
    version,
    about = "Turn UI screenshots into a tagged list of user-interaction events"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Vision model API endpoint (Ollama /api/generate)
    #[arg(long, global = true)]
    pub vision_endpoint: Option<String>,

    /// Vision model name
    #[arg(long, global = true)]
    pub vision_model: Option<String>,

    /// Path to config file (default: screen-tagging.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Tag a batch of screenshots and write the event report
    Tag {
        /// Screenshot files, in page order
        #[arg(required = true)]
        images: Vec<String>,

        /// Event source: heuristic or annotation
        #[arg(long)]
        source: Option<String>,

        /// Output format: console, csv, html, json
        #[arg(long)]
        format: Option<String>,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Append JSONL trace records to this file
        #[arg(long)]
        trace_file: Option<String>,
    },

    /// Run the keyword rules on raw OCR text and print the matched events
    Text {
        /// Text file to read (default: stdin)
        file: Option<String>,
    },

    /// Print the keyword rule table
    Rules,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `screen-tagging.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub vision: VisionConfig,
    #[serde(default)]
    pub tag: TagConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_ocr_command")]
    pub command: String,

    #[serde(default = "default_ocr_language")]
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            command: default_ocr_command(),
            language: default_ocr_language(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: None,
            timeout_secs: DEFAULT_VISION_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagConfig {
    #[serde(default = "default_source")]
    pub source: String,

    #[serde(default = "default_format")]
    pub format: String,

    pub trace_file: Option<String>,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            format: default_format(),
            trace_file: None,
        }
    }
}

// Serde default helpers
fn default_ocr_command() -> String { "tesseract".to_string() }
fn default_ocr_language() -> String { "eng".to_string() }
fn default_timeout_secs() -> u64 { DEFAULT_VISION_TIMEOUT_SECS }
fn default_source() -> String { "heuristic".to_string() }
fn default_format() -> String { "console".to_string() }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("ignoring malformed config '{}': {}", config_path, e);
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Resolve source settings: CLI > config > defaults.
pub fn build_source_settings(
    config: &AppConfig,
    vision_endpoint: Option<&str>,
    vision_model: Option<&str>,
) -> SourceSettings {
    SourceSettings {
        ocr_command: config.ocr.command.clone(),
        ocr_language: config.ocr.language.clone(),
        vision_endpoint: vision_endpoint
            .or(config.vision.endpoint.as_deref())
            .unwrap_or(DEFAULT_VISION_ENDPOINT)
            .to_string(),
        vision_model: vision_model
            .or(config.vision.model.as_deref())
            .unwrap_or(DEFAULT_VISION_MODEL)
            .to_string(),
        vision_timeout_secs: config.vision.timeout_secs,
    }
}
