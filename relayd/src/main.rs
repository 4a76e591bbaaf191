mod config;
mod logging;
mod statsd;

use clap::{Args, Parser};
use config::{Config, ConfigError};
use logging::LoggingError;
use purchase_relay::errors::RelayError;
use statsd::MetricsError;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "relayd", about = "Server-side relay for conversion events")]
enum CliCommand {
    /// Serve the purchase relay and the pixel bootstrap script
    PurchaseRelay(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    #[arg(long)]
    config_file_path: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Logging(#[from] LoggingError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Relay(#[from] RelayError),
}

fn main() -> ExitCode {
    let cli = CliCommand::parse();

    let result = match cli {
        CliCommand::PurchaseRelay(args) => run_purchase_relay(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("relayd: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_purchase_relay(args: ConfigArgs) -> Result<(), CliError> {
    let mut config = Config::from_file(&args.config_file_path)?;
    config.apply_env_overrides(|name| std::env::var(name).ok());

    let _sentry_guard = logging::init(&config.logging)?;
    statsd::init(config.metrics.as_ref())?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    tracing::info!(config = %args.config_file_path.display(), "Starting purchase relay");
    rt.block_on(purchase_relay::run(config.purchase_relay))?;

    Ok(())
}
