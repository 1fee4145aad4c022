//! Statdash - Statement Count Histogram CLI
//!
//! A CLI tool that fetches every page of a paginated statement-count API,
//! aggregates the counts into a fixed-width histogram plus mean/median,
//! and writes a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (connection, decode, config, I/O failure)

mod analysis;
mod cli;
mod config;
mod fetch;
mod models;
mod report;
mod session;

use analysis::HistogramConfig;
use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::Config;
use fetch::{FetchOptions, StatementClient};
use indicatif::{ProgressBar, ProgressStyle};
use models::{FetchState, Snapshot};
use session::Session;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Statdash v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Run the fetch-aggregate cycle
    match run_dashboard(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Run failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .statdash.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(".statdash.toml");

    if path.exists() {
        eprintln!("⚠️  .statdash.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .statdash.toml")?;

    println!("✅ Created .statdash.toml with default settings.");
    println!("   Edit it to customize API endpoint, histogram buckets, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete fetch-aggregate-report workflow.
async fn run_dashboard(args: Args) -> Result<()> {
    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let histogram_config = HistogramConfig {
        cap: config.histogram.cap,
        bin_size: config.histogram.bin_size,
    };

    let options = FetchOptions {
        page_size: config.api.page_size,
        title_filter: args.title.clone(),
        timeout_seconds: config.api.timeout_seconds,
    };
    let client = StatementClient::new(config.api.base_url.clone(), options);

    // Handle --probe: health-check the API and exit
    if args.probe {
        return handle_probe(&client, &config.api.base_url).await;
    }

    // Step 1: Fetch every page
    println!("📥 Fetching statements from {}", config.api.base_url);
    println!("   Page size: {}", config.api.page_size);
    if let Some(ref title) = args.title {
        println!("   Title filter: {}", title);
    }

    let progress = make_progress_bar(args.quiet);

    let mut session = Session::new(histogram_config);
    session
        .refresh(&client, config.api.max_pages, |done, total| {
            progress.set_length(total as u64);
            progress.set_position(done as u64);
        })
        .await;
    progress.finish_and_clear();

    let snapshot = match session.state() {
        FetchState::Ready(snapshot) => snapshot,
        FetchState::Failed { message } => anyhow::bail!("{}", message),
        other => anyhow::bail!("Unexpected state after refresh: {}", other),
    };

    // Step 2: Generate and save the report
    println!("📝 Generating report...");

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(snapshot, &config.api.base_url)?,
        OutputFormat::Markdown => {
            report::generate_markdown_report(snapshot, &config.api.base_url, &config.report)
        }
    };

    let output_path = std::path::PathBuf::from(&config.general.output);
    report::write_report(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    // Print summary
    print_summary(snapshot, &config);

    Ok(())
}

/// Handle --probe: check API reachability, print the verdict, exit.
async fn handle_probe(client: &StatementClient, base_url: &str) -> Result<()> {
    println!("🔍 Probing API at {}", base_url);

    let healthy = client
        .health()
        .await
        .with_context(|| format!("Health check against {} failed", base_url))?;

    if healthy {
        println!("✅ API is reachable and healthy.");
        Ok(())
    } else {
        anyhow::bail!("API responded but reported an unhealthy state")
    }
}

/// Progress bar for the page fetch loop (hidden in quiet mode).
fn make_progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(1);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages ({eta})",
            )
            .unwrap()
            .progress_chars("#>-"),
    );
    pb
}

/// Print the closing summary block.
fn print_summary(snapshot: &Snapshot, config: &Config) {
    println!("\n📊 Summary:");
    println!("   Papers: {}", snapshot.records.len());
    println!("   Pages fetched: {}", snapshot.pages_fetched);
    println!("   Avg statements: {:.2}", snapshot.stats.mean);
    println!("   Median statements: {:.2}", snapshot.stats.median);
    println!(
        "   Papers at {}+ statements: {}",
        config.histogram.cap,
        snapshot.histogram.overflow()
    );
    println!("   Duration: {:.1}s", snapshot.duration_seconds);
    println!("\n✅ Report saved to: {}", config.general.output);
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .statdash.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
