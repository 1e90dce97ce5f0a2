//! Climate Explorer CLI
//!
//! Renders one dashboard page per invocation.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use climate_data::config::SourceMode;
use climate_explorer::pages::{self, OutputFormat, Page, PageOptions};
use climate_explorer::{ClimateError, DashboardConfig, Session};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

#[derive(Parser)]
#[command(name = "climate_explorer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Explore the global temperature anomaly record", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Read the dataset from a local CSV instead of the remote endpoint
    #[arg(long, global = true)]
    local: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text", global = true)]
    format: Format,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Dataset summary, recent years and anomaly distribution
    Overview,
    /// Linear trend statistics and ARIMA forecast
    Trend,
    /// Average anomaly per calendar month
    Monthly,
    /// Years outside the interquartile fences
    Outliers,
    /// Year by month grid and monthly correlations
    Heatmap,
    /// Predict one future year with every model
    Predict {
        /// Year to predict; defaults to five years past the data
        #[arg(short, long)]
        year: Option<i32>,
    },
    /// Compare models by prediction and in-sample error
    Compare {
        /// Year to predict; defaults to 2026 or the year after the data
        #[arg(short, long)]
        year: Option<i32>,
    },
    /// What this tool shows
    About,
}

impl Commands {
    fn page(&self) -> (Page, Option<i32>) {
        match *self {
            Commands::Overview => (Page::Overview, None),
            Commands::Trend => (Page::Trend, None),
            Commands::Monthly => (Page::Monthly, None),
            Commands::Outliers => (Page::Outliers, None),
            Commands::Heatmap => (Page::Heatmap, None),
            Commands::Predict { year } => (Page::Predict, year),
            Commands::Compare { year } => (Page::Compare, year),
            Commands::About => (Page::About, None),
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<DashboardConfig> {
    let mut config = match &cli.config {
        Some(path) => DashboardConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => DashboardConfig::default(),
    };
    if let Some(path) = &cli.local {
        config.source.mode = SourceMode::Local;
        config.source.local_path = path.clone();
    }
    Ok(config)
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli)?;
    let session = Session::from_config(config);
    debug!(?session, "session created");

    let (page, target_year) = cli.command.page();
    let options = PageOptions {
        target_year,
        format: match cli.format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        },
    };

    let output = pages::render(page, &session, &options)?;
    println!("{}", output);
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "climate_explorer=info,climate_data=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<ClimateError>() {
                Some(ClimateError::DataUnavailable(reason)) => {
                    eprintln!("Data not loaded: {}", reason);
                }
                _ => eprintln!("Error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}
