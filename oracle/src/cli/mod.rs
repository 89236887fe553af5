use chrono::NaiveDate;
use clap::{Parser, Subcommand};

pub mod alert;
pub mod breaker;
pub mod chain;
pub mod data;
pub mod schedule;
pub mod storage;
pub mod submission;

#[derive(Parser, Debug)]
#[command(
    name = "quality-oracle",
    about = "Service Quality Oracle - daily indexer eligibility submission",
    long_about = "Submits the daily set of eligible indexers on-chain in fixed-size batches.\n\n\
    RPC providers are tried in order with retries and rotation, and a durable circuit breaker \
    stops the oracle after repeated failed runs until an operator resets it.",
    after_help = "Examples:\n  \
    quality-oracle run --rpc-url https://primary.example,https://fallback.example ...\n  \
    quality-oracle run-once --date 2025-01-15 ...\n  \
    quality-oracle reset-breaker --data-dir /app/data"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the daily scheduler until a shutdown signal or a circuit breaker halt
    Run {
        #[command(flatten)]
        run_command: Box<RunCmd>,
    },
    /// Execute a single run and exit with the run's exit status
    #[command(long_about = "Execute a single run and exit.\n\n\
        Exit code 0 means the run succeeded or was halted by the circuit breaker (do not restart), \
        exit code 1 means the run failed and may be retried.")]
    RunOnce {
        #[command(flatten)]
        run_command: Box<RunCmd>,

        /// Run date to submit for, defaults to today (UTC)
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,
    },
    /// Clear the circuit breaker failure log so that runs may start again
    ResetBreaker {
        #[command(flatten)]
        storage_args: storage::StorageCliArgs,
    },
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct RunCmd {
    #[clap(flatten)]
    pub chain_args: chain::ChainCliArgs,

    #[clap(flatten)]
    pub submission_args: submission::SubmissionCliArgs,

    #[clap(flatten)]
    pub breaker_args: breaker::BreakerCliArgs,

    #[clap(flatten)]
    pub schedule_args: schedule::ScheduleCliArgs,

    #[clap(flatten)]
    pub storage_args: storage::StorageCliArgs,

    #[clap(flatten)]
    pub data_args: data::DataCliArgs,

    #[clap(flatten)]
    pub alert_args: alert::AlertCliArgs,
}
