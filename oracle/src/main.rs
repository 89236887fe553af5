use std::process::ExitCode;
use std::time::Duration;

use chrono::Utc;
use clap::Parser as _;
use dotenvy::dotenv;
use quality_oracle::cli::storage::StorageCliArgs;
use quality_oracle::cli::{Cli, Commands, RunCmd};
use quality_oracle::core::config::{build_breaker, Config};
use quality_oracle::types::constant::SHUTDOWN_TIMEOUT_SECONDS;
use quality_oracle::types::params::{BreakerParams, StorageParams};
use quality_oracle::types::{ExitStatus, RunTrigger};
use quality_oracle::utils::logging::init_logging;
use quality_oracle::utils::signal_handler::SignalHandler;
use quality_oracle::{OracleError, OracleResult};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    if let Err(e) = init_logging() {
        report_startup_failure(&e);
        return ExitStatus::RetryableFailure.into();
    }
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { run_command } => {
            info!("Starting quality oracle scheduler");
            run_scheduler(&run_command).await
        }
        Commands::RunOnce { run_command, date } => run_single(&run_command, date).await,
        Commands::ResetBreaker { storage_args } => reset_breaker(storage_args).await,
    };

    match result {
        Ok(status) => {
            info!(exit_code = status.code(), status = ?status, "Quality oracle exiting");
            status.into()
        }
        Err(e) => {
            error!(error = %e, error_chain = ?e, "Quality oracle failed");
            ExitStatus::RetryableFailure.into()
        }
    }
}

#[allow(clippy::print_stderr)]
fn report_startup_failure(e: &anyhow::Error) {
    eprintln!("Failed to initialize logging: {e:#}");
}

async fn run_scheduler(run_cmd: &RunCmd) -> OracleResult<ExitStatus> {
    let config = Config::from_run_cmd(run_cmd)?;
    debug!("Configuration initialized");

    let scheduler = config.build_scheduler();
    let token = CancellationToken::new();
    let mut signals = SignalHandler::new(token.clone());

    let mut scheduler_task = tokio::spawn(async move { scheduler.run(token).await });

    tokio::select! {
        joined = &mut scheduler_task => {
            return joined.map_err(|e| OracleError::OracleAnyHowError(e.into()))?;
        }
        signal = signals.wait_for_shutdown() => {
            signal?;
        }
    }

    let joined = signals.handle_graceful_shutdown(scheduler_task, Duration::from_secs(SHUTDOWN_TIMEOUT_SECONDS)).await?;
    joined.map_err(|e| OracleError::OracleAnyHowError(e.into()))?
}

async fn run_single(run_cmd: &RunCmd, date: Option<chrono::NaiveDate>) -> OracleResult<ExitStatus> {
    let config = Config::from_run_cmd(run_cmd)?;
    let run_date = date.unwrap_or_else(|| Utc::now().date_naive());
    info!(%run_date, "Executing a single run");

    let outcome = config.build_scheduler().execute_run(run_date, RunTrigger::Manual).await?;
    Ok(outcome.exit_status())
}

async fn reset_breaker(storage_args: StorageCliArgs) -> OracleResult<ExitStatus> {
    let storage = StorageParams::from(storage_args);
    let breaker = build_breaker(&storage, BreakerParams::default());

    let recent = breaker.recent_failures(Utc::now()).await.unwrap_or_default();
    breaker.reset().await?;
    info!(
        failure_log = %storage.failure_log_path().display(),
        cleared_recent_failures = recent,
        "Circuit breaker reset, runs may start again"
    );
    Ok(ExitStatus::Success)
}
