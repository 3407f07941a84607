use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Linear inverse model forecasting of climate anomaly fields.
#[derive(Parser)]
#[command(
    name = "lim",
    version,
    about = "Linear inverse model forecasting of climate anomaly fields"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Calibrate a LIM on a field and forecast from an initial field.
    Forecast(ForecastArgs),
    /// Run cross-validated forecasts over held-out chunks.
    Resample(ResampleArgs),
    /// Score a cross-validation results container.
    Skill(SkillArgs),
}

/// Arguments for the `forecast` subcommand.
#[derive(clap::Args)]
pub struct ForecastArgs {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "lim.toml")]
    pub config: PathBuf,

    /// Override the calibration field path from config.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Override the initial-condition field path from config.
    #[arg(long)]
    pub initial: Option<PathBuf>,

    /// Override the forecast NetCDF output path from config.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `resample` subcommand.
#[derive(clap::Args)]
pub struct ResampleArgs {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "lim.toml")]
    pub config: PathBuf,

    /// Override the observation field path from config.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Override the results container path from config.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `skill` subcommand.
#[derive(clap::Args)]
pub struct SkillArgs {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "lim.toml")]
    pub config: PathBuf,

    /// Override the results container path from config.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Override the JSON report path from config.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
