mod classify;
mod cli;
mod config;
mod db;
mod ontime;
mod processor;
mod registry;
mod scheduler;
mod store;
mod telemetry;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::registry::DeviceRegistry;
use crate::scheduler::MeterService;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let pool = db::connect_lazy(&config.database_url, config.db_pool_size)?;

    let devices_path = args.devices.unwrap_or_else(|| config.devices_path.clone());
    let registry = DeviceRegistry::load(&devices_path)?;
    tracing::info!(
        devices = registry.len(),
        path = %devices_path.display(),
        "device registry loaded"
    );
    if registry.is_empty() {
        tracing::warn!("device registry is empty; nothing will be metered");
    }

    match args.command {
        Commands::Serve => {
            let cancel = CancellationToken::new();
            MeterService::new(pool, registry, config.poll_interval(), config.lookback())
                .start(cancel.clone());
            tokio::signal::ctrl_c().await?;
            tracing::info!("shutdown signal received");
            cancel.cancel();
        }
        Commands::Once => {
            let batch =
                processor::meter_all_recent(&pool, &registry, Utc::now(), config.lookback()).await;
            tracing::info!(
                devices = batch.devices,
                metered = batch.metered,
                skipped = batch.skipped,
                failed = batch.failed,
                rows = batch.rows_written,
                "metering pass complete"
            );
        }
        Commands::Backfill(backfill) => {
            let batch = processor::meter_history_all(
                &pool,
                &registry,
                backfill.device.as_deref(),
                backfill.end_date,
                Utc::now(),
            )
            .await;
            tracing::info!(
                devices = batch.devices,
                metered = batch.metered,
                skipped = batch.skipped,
                failed = batch.failed,
                rows = batch.rows_written,
                "backfill complete"
            );
        }
        Commands::Report(report) => {
            let Some(entry) = registry.get(&report.device) else {
                anyhow::bail!("device {} is not in the registry", report.device);
            };
            let days = processor::day_report(
                &pool,
                &report.device,
                entry,
                report.start_date,
                report.end_date,
                report.threshold,
                chrono::Duration::minutes(report.window_minutes),
            )
            .await?;
            for day in days {
                let (on_hours, on_minutes) = day.on_hhmm();
                let (off_hours, off_minutes) = day.off_hhmm();
                println!(
                    "{},{:02}:{:02},{:02}:{:02}",
                    day.date, on_hours, on_minutes, off_hours, off_minutes
                );
            }
        }
    }

    Ok(())
}
