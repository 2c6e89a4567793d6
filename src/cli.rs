use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "runtime-meter", version, about = "Machine runtime metering from vibration telemetry")]
pub struct Cli {
    /// Device registry JSON path (overrides METER_DEVICES_PATH).
    #[arg(long, global = true)]
    pub devices: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the periodic metering loop until interrupted.
    Serve,
    /// Run a single metering pass over the registry and exit.
    Once,
    /// Book historical runtime hours from each device's deployment date.
    Backfill(BackfillArgs),
    /// Print per-day runtime for one device as CSV.
    Report(ReportArgs),
}

#[derive(Args)]
pub struct BackfillArgs {
    /// Restrict the backfill to one device id.
    #[arg(long)]
    pub device: Option<String>,
    /// Upper time bound as YYYY-MM-DD (cuts at midnight UTC).
    #[arg(long)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Args)]
pub struct ReportArgs {
    /// Device id to report on.
    #[arg(long)]
    pub device: String,
    /// First day to include as YYYY-MM-DD (defaults to the deployment date).
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
    /// Upper time bound as YYYY-MM-DD (cuts at midnight UTC).
    #[arg(long)]
    pub end_date: Option<NaiveDate>,
    /// Override the registry threshold for this run.
    #[arg(long)]
    pub threshold: Option<f64>,
    /// Burst window length in minutes.
    #[arg(long, default_value_t = 15)]
    pub window_minutes: i64,
}
