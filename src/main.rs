//! Sublingo - Subtitle Segmentation and Duration Fitting
//!
//! This is the main entry point for the Sublingo application, which splits
//! ASR transcripts into subtitle-sized sentences and shortens subtitle
//! lines that cannot be read within their time window.

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use sublingo::cli::{Args, Commands};
use sublingo::config::Config;
use sublingo::workflow::Workflow;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;
    info!("Starting Sublingo - Subtitle Segmentation and Duration Fitting");

    // Load configuration
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            // Try to load config.toml from current directory first
            if std::path::Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::InitConfig { output } => {
            config.save_to_file(&output)?;
            println!("Configuration written to {}", output.display());
        }
        Commands::Split { input, output, language } => {
            info!("Splitting transcript: {}", input.display());
            let workflow = Workflow::new(config)?;
            workflow.segment_file(&input, &output, language.as_deref()).await?;
        }
        Commands::Batch { input_dir, output_dir, language } => {
            info!("Processing directory: {}", input_dir.display());
            let workflow = Workflow::new(config)?;
            workflow
                .segment_directory(&input_dir, output_dir.as_ref(), language.as_deref())
                .await?;
        }
        Commands::Fit { input, output } => {
            info!("Fitting subtitles: {}", input.display());
            let workflow = Workflow::new(config)?;
            let fitter = workflow.fitter()?;
            let summary = workflow.fit_subtitles(&fitter, &input, &output).await?;

            println!(
                "{} lines: {} unchanged, {} rewritten, {} stripped",
                summary.total(),
                summary.unchanged,
                summary.rewritten,
                summary.stripped
            );
        }
    }

    info!("Sublingo completed successfully");
    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = std::env::current_dir()?.join(".sublingo").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "sublingo.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("sublingo.log").display());

    Ok(())
}
