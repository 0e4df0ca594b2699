//! Main entry point for the visawatch appointment watcher
//!
//! Loads configuration, sets up logging, and runs the polling loop until
//! an earlier appointment has been booked.

use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use visawatch::config::AppConfig;
use visawatch::gateway::HttpSessionGateway;
use visawatch::watcher::Watcher;

/// Visawatch - watches a visa appointment system for an earlier slot
#[derive(Parser)]
#[command(
    name = "visawatch",
    version,
    about = "Polls a visa appointment system for an earlier slot and rebooks it",
    long_about = "Visawatch logs into the visa appointment system, polls the nearest \
                 available appointment dates, and automatically reschedules the booked \
                 appointment as soon as an earlier date shows up. It runs until the \
                 reschedule succeeds."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Log file override
    #[arg(long, value_name = "FILE", help = "Append logs to this file (rotated daily)")]
    log_file: Option<PathBuf>,

    /// Booked appointment date override
    #[arg(
        long,
        value_name = "YYYY-MM-DD",
        help = "Override the currently booked appointment date"
    )]
    current_date: Option<NaiveDate>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        help = "Validate configuration and exit without starting the watcher"
    )]
    dry_run: bool,
}

/// Initialize structured logging to stdout, plus a daily-rotated file when
/// one is configured. Returns the appender guard that must outlive main.
fn init_logging(
    log_level: &str,
    log_file: Option<&PathBuf>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    if let Some(path) = log_file {
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let filename = path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("visawatch.log"));
        std::fs::create_dir_all(dir)?;

        let appender = tracing_appender::rolling::daily(dir, filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .with(fmt::layer().with_target(false).with_ansi(false).with_writer(non_blocking))
            .init();

        Ok(Some(guard))
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .init();

        Ok(None)
    }
}

/// Display startup banner with watcher information
fn display_startup_banner(config: &AppConfig) {
    info!("Visawatch v{}", visawatch::VERSION);
    info!("   Account: {}", config.account.username);
    info!("   Facility: {}", config.appointment.facility_id);
    info!("   Booked date: {}", config.appointment.current_date);
    info!("   Dates per poll: {}", config.appointment.max_dates_per_poll);
    info!("   Retry ceiling: {}s", config.timing.retry_seconds);
    info!("   Cooldown: {}s", config.timing.cooldown_seconds);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

/// Load and merge configuration from file/environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(log_file) = &args.log_file {
        config.service.log_file = Some(log_file.clone());
    }

    if let Some(current_date) = args.current_date {
        config.appointment.current_date = current_date;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    // Initialize logging early (before any other operations)
    let _log_guard = match init_logging(&config.service.log_level, config.service.log_file.as_ref())
    {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            std::process::exit(1);
        }
    };

    display_startup_banner(&config);

    if args.dry_run {
        info!("Configuration validation successful");
        info!("Dry run completed - exiting without starting the watcher");
        return Ok(());
    }

    let gateway = HttpSessionGateway::new(&config)?;
    let mut watcher = Watcher::new(gateway, &config);

    // Runs until an earlier slot is booked; initial login failure is the
    // only fatal path.
    let outcome = watcher.run().await?;

    info!(
        "Done: appointment moved to {} at {}",
        outcome.date, outcome.time_slot
    );
    Ok(())
}
