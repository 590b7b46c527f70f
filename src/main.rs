//! ChanMetric - per-channel detector readout metrics
//!
//! Evaluates a scalar metric for every channel of each event, groups
//! channels into named ranges and accumulates per-channel running
//! statistics across events.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, input, no valid channel ranges, etc.)
//!   2 - Channels without a metric value found and --fail-on-skipped set

use anyhow::{Context, Result};
use chanmetric::analysis::{BatchOrchestrator, MetricSettings};
use chanmetric::cli::Args;
use chanmetric::config::{Config, CONFIG_FILE};
use chanmetric::error::BatchError;
use chanmetric::scanner::EventScanner;
use chanmetric::{metric, report};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Instant;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
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

    // Load configuration before logging so its log level applies
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(
        args.log_level()
            .map(LevelFilter::from_level)
            .unwrap_or_else(|| config.log_level()),
    );

    info!("ChanMetric v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(&args, &config) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .chanmetric.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to choose the metric, channel ranges, axis and output names.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: LevelFilter) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: tracing subscriber already set");
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    Ok(Config::load_default()?.unwrap_or_default())
}

/// Process every event under the input path. Returns exit code (0 or 2).
fn run(args: &Args, config: &Config) -> Result<i32> {
    let start_time = Instant::now();
    config.validate().context("Invalid configuration")?;

    let input = args
        .input
        .as_deref()
        .context("No input path given")?;

    // Step 1: Discover and load events
    let scanner = EventScanner::new(input);
    let events = scanner.load_all()?;
    info!("Loaded {} events from {}", events.len(), input.display());
    if events.is_empty() {
        warn!("No events found under {}", input.display());
    }

    // Step 2: Build the orchestrator
    let catalog = config.range_catalog();
    let mut orchestrator = BatchOrchestrator::new(
        MetricSettings::from(config),
        &catalog,
        Box::new(metric::default_evaluator()),
        Box::new(config.status_table()),
    );

    if !args.quiet {
        println!("📊 Metric: {}", config.metric.name);
        if !orchestrator.ranges().is_empty() {
            let names: Vec<&str> = orchestrator.ranges().iter().map(|r| r.name.as_str()).collect();
            println!("   Ranges: {}", names.join(", "));
        }
        for name in orchestrator.unresolved() {
            println!("   ⚠️  Unknown channel range skipped: {}", name);
        }
    }

    // Step 3: Aggregate each event and write its outputs
    let progress = progress_bar(events.len() as u64, args.quiet)?;
    let mut skipped = 0usize;
    let mut files_written = 0usize;

    for batch in &events {
        let result = match orchestrator.run(batch) {
            Ok(result) => result,
            Err(BatchError::NoRangesConfigured) => {
                warn!("Run {} event {} has no channels; skipped", batch.run, batch.event);
                progress.inc(1);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        skipped += result.skipped_channels();
        files_written += report::write_outputs(&result, Path::new(""))?.len();
        progress.inc(1);
    }
    progress.finish_and_clear();

    // Step 4: Summary
    let summary = orchestrator.state().summary();
    info!(
        "Processed {} calls ({} events, {} runs) in {:.2}s",
        summary.call_count,
        summary.event_count,
        summary.run_count,
        start_time.elapsed().as_secs_f64()
    );

    if !args.quiet {
        println!("\n{}", report::generate_summary_text(&summary));
        println!("Files written: {}", files_written);
        if skipped > 0 {
            println!("Channels without a value: {}", skipped);
        }
        println!("\n✅ Done.");
    }

    if args.fail_on_skipped && skipped > 0 {
        eprintln!(
            "\n⛔ {} channels had no value for metric '{}'. Failing (exit code 2).",
            skipped, config.metric.name
        );
        return Ok(2);
    }

    Ok(0)
}

/// Progress bar over events, hidden in quiet mode.
fn progress_bar(len: u64, quiet: bool) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }

    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} events")
            .context("Invalid progress bar template")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}
