//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analysis::HistogramConfig;
use clap::Parser;
use std::path::PathBuf;

/// Statdash - histogram and summary statistics for statement-count APIs
///
/// Fetch every page of a paginated statistics endpoint, bucket the
/// statement counts into a fixed-width histogram, and write a Markdown
/// or JSON report with mean and median.
///
/// Examples:
///   statdash
///   statdash --api-base https://stats.example.org --page-size 2500
///   statdash --title "knowledge graph" --format json -o stats.json
///   statdash --probe
///   statdash --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Base URL of the statistics API
    ///
    /// Resolved once at startup. Can also be set via the STATDASH_API_BASE
    /// env var or .statdash.toml config.
    #[arg(
        short,
        long,
        default_value = "http://localhost:8000",
        env = "STATDASH_API_BASE",
        value_name = "URL"
    )]
    pub api_base: String,

    /// Records per page request
    ///
    /// The upstream endpoint accepts sizes between 1 and 5000.
    #[arg(long, default_value = "5000", value_name = "COUNT")]
    pub page_size: u32,

    /// Only include papers whose title matches this filter (server-side)
    #[arg(short, long, value_name = "TEXT")]
    pub title: Option<String>,

    /// Histogram cap: counts at or above this land in the overflow bucket
    #[arg(long, default_value = "200", value_name = "COUNT")]
    pub cap: u64,

    /// Width of each histogram bucket
    ///
    /// The cap must be a multiple of this width.
    #[arg(long, default_value = "10", value_name = "COUNT")]
    pub bin_size: u64,

    /// Upper bound on pages fetched in one cycle
    ///
    /// Guards against a server reporting an inflated page count.
    #[arg(long, default_value = "1000", value_name = "COUNT")]
    pub max_pages: u32,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output file path for the report
    #[arg(
        short,
        long,
        default_value = "statdash_report.md",
        value_name = "FILE"
    )]
    pub output: PathBuf,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .statdash.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Check that the API is reachable and exit (no fetch, no report)
    #[arg(long)]
    pub probe: bool,

    /// Generate a default .statdash.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Validate API base URL format
        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            return Err("API base URL must start with 'http://' or 'https://'".to_string());
        }

        // Validate page size against the range the endpoint accepts
        if self.page_size == 0 || self.page_size > 5000 {
            return Err("Page size must be between 1 and 5000".to_string());
        }

        // Validate histogram settings
        self.histogram_config().validate()?;

        // Validate page bound
        if self.max_pages == 0 {
            return Err("Max pages must be at least 1".to_string());
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Histogram configuration from the cap and bucket width flags.
    pub fn histogram_config(&self) -> HistogramConfig {
        HistogramConfig {
            cap: self.cap,
            bin_size: self.bin_size,
        }
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
