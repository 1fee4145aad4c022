//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.statdash.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Histogram settings.
    #[serde(default)]
    pub histogram: HistogramSettings,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "statdash_report.md".to_string()
}

/// Statistics API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the statistics API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Records per page request.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Upper bound on pages fetched in one cycle.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_size: default_page_size(),
            timeout_seconds: default_timeout(),
            max_pages: default_max_pages(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_page_size() -> u32 {
    5000 // The upstream endpoint caps `size` at 5000
}

fn default_timeout() -> u64 {
    60
}

fn default_max_pages() -> u32 {
    1000
}

/// Histogram bucket settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramSettings {
    /// Counts at or above this value land in the overflow bucket.
    #[serde(default = "default_cap")]
    pub cap: u64,

    /// Width of each regular bucket.
    #[serde(default = "default_bin_size")]
    pub bin_size: u64,
}

impl Default for HistogramSettings {
    fn default() -> Self {
        Self {
            cap: default_cap(),
            bin_size: default_bin_size(),
        }
    }
}

fn default_cap() -> u64 {
    200
}

fn default_bin_size() -> u64 {
    10
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include the ASCII bar chart in the Markdown report.
    #[serde(default = "default_true")]
    pub include_chart: bool,

    /// Maximum width of a chart bar, in characters.
    #[serde(default = "default_chart_width")]
    pub chart_width: usize,

    /// Number of rows in the top-papers table.
    #[serde(default = "default_top_papers")]
    pub top_papers: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_chart: true,
            chart_width: default_chart_width(),
            top_papers: default_top_papers(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_chart_width() -> usize {
    40
}

fn default_top_papers() -> usize {
    10
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".statdash.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        // API settings - always override since they have defaults in CLI
        self.api.base_url = args.api_base.clone();
        self.api.page_size = args.page_size;
        self.api.max_pages = args.max_pages;

        // Timeout - only override if explicitly provided via CLI
        if let Some(timeout) = args.timeout {
            self.api.timeout_seconds = timeout;
        }

        // Histogram settings - always override
        self.histogram.cap = args.cap;
        self.histogram.bin_size = args.bin_size;

        // General settings
        self.general.output = args.output.display().to_string();

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
