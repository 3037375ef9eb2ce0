//! bookfast - Gym class booking at registration open
//!
//! Main entry point for the command line application.
//!
//! # Execution Flow
//!
//! 1. Parse the command line and initialize logging → logs/bookfast.<date>
//! 2. Load and validate `config/classes.json` (fatal on any error) and the
//!    optional `config/settings.yaml`
//! 3. Compute the release instant and select the classes to book
//! 4. Start the browser driver, then wait for the release instant
//!    (skipped with `--test`)
//! 5. Book the selected classes one after another, with retries
//! 6. Log the per-class report and run metrics
//!
//! Ctrl-C is raced against steps 4-5. Sessions still open at that point are
//! closed in the background during a short grace period.
//!
//! # Exit Codes
//!
//! - `0`: nothing to book, or every selected class booked
//! - `1`: invalid configuration, startup failure, or any class failed
//! - `130`: interrupted

use anyhow::{Context, Result};
use bookfast::cli::Cli;
use bookfast::driver::{SessionFactory, SessionOptions};
use bookfast::metrics::Metrics;
use bookfast::services::scheduler::weekday_in;
use bookfast::services::{BookingEngine, ReleaseGate, RetryHandler, Sequencer};
use bookfast::{APP_NAME, ConfigManager, VERSION};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

/// Time granted to abandoned sessions to close after an interrupt
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

const EXIT_INTERRUPTED: u8 = 130;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match bookfast::logging::setup_logging_with_console(
        &cli.log_dir,
        "bookfast",
        cli.debug,
        true,
    ) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("bookfast-worker")
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to create tokio runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let code = runtime.block_on(async {
        match run(cli).await {
            Ok(code) => code,
            Err(e) => {
                tracing::error!("{:#}", e);
                ExitCode::FAILURE
            }
        }
    });

    runtime.shutdown_timeout(Duration::from_secs(5));
    tracing::info!("Shutdown complete");
    code
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let manager = ConfigManager::new(&cli.config, &cli.settings);
    let class_config = manager.load_class_config()?;
    let settings = manager.load_site_settings()?;

    let zone = class_config.global_settings.zone()?;
    let release = class_config.global_settings.release_time_of_day()?;
    tracing::info!(
        "Loaded {} class(es), release at {} {}",
        class_config.classes.len(),
        release,
        zone
    );

    let gate = ReleaseGate::new(zone, release);
    let start_at: Option<DateTime<Utc>> = if cli.test {
        tracing::info!("Test mode: starting immediately");
        None
    } else {
        Some(gate.target())
    };

    let booking_day = weekday_in(zone, start_at.unwrap_or_else(Utc::now));
    let targets = cli.select_targets(&class_config, booking_day);
    if targets.is_empty() {
        match &cli.class {
            Some(id) => tracing::warn!("No enabled class with id '{}'", id),
            None => tracing::info!("No classes scheduled for day {}", booking_day),
        }
        return Ok(ExitCode::SUCCESS);
    }
    for target in &targets {
        tracing::info!(
            "Selected: {} - {} {} ({})",
            target.name,
            target.day_name,
            target.time_slot,
            target.id
        );
    }

    let credentials = cli.credentials()?;
    let session_options = SessionOptions::new(&settings, zone, cli.headless(settings.headless));
    let sessions = session_factory(session_options).await?;
    let metrics = Arc::new(Metrics::new());

    let between_targets = settings.between_targets();
    let engine = BookingEngine::new(settings, credentials)
        .context("Invalid outcome pattern in site settings")?;
    let handler = RetryHandler::with_metrics(sessions, engine, Arc::clone(&metrics));
    let sequencer = Sequencer::new(handler, between_targets);

    let booking = async {
        if let Some(instant) = start_at {
            gate.wait_for(instant).await;
        }
        sequencer.run_all(&targets).await
    };

    let summary = tokio::select! {
        summary = booking => Some(summary),
        _ = tokio::signal::ctrl_c() => None,
    };

    let Some(summary) = summary else {
        tracing::warn!("Interrupted, closing open sessions");
        tokio::time::sleep(SHUTDOWN_GRACE).await;
        metrics.log_summary();
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    };

    summary.log_report();
    metrics.log_summary();

    if summary.all_succeeded() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

#[cfg(feature = "playwright")]
async fn session_factory(options: SessionOptions) -> Result<Box<dyn SessionFactory>> {
    let factory = bookfast::driver::playwright::PlaywrightSessionFactory::launch(options)
        .await
        .context("Failed to start the browser driver")?;
    Ok(Box::new(factory))
}

#[cfg(not(feature = "playwright"))]
async fn session_factory(_options: SessionOptions) -> Result<Box<dyn SessionFactory>> {
    anyhow::bail!("No browser backend compiled in; rebuild without `--no-default-features`")
}
