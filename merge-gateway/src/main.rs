mod config;
mod logging;
mod statsd;

use clap::Parser;
use config::{Config, ConfigError};
use logging::LoggingError;
use merge_router::errors::GatewayError;
use statsd::MetricsError;
use std::path::PathBuf;
use std::process::ExitCode;

/// Serves the merged JSON document of two backends and relays writes to the
/// secondary one.
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// YAML config file. Without it, MERGE_ENDPOINTS and MERGE_LISTEN are read.
    #[arg(long, env = "MERGE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(thiserror::Error, Debug)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Logging(#[from] LoggingError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
    #[error("could not start runtime: {0}")]
    Runtime(std::io::Error),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("merge-gateway: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Held until exit so sentry flushes buffered events
    let _sentry_guard = match logging::init(config.common.logging.as_ref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("merge-gateway: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "merge gateway failed");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config, StartupError> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    Ok(config)
}

fn run(config: Config) -> Result<(), StartupError> {
    if let Some(metrics_config) = &config.common.metrics {
        statsd::init(metrics_config)?;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(StartupError::Runtime)?;

    runtime.block_on(merge_router::run(config.merge_router))?;
    Ok(())
}
