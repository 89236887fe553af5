use std::sync::Arc;

use tracing::{debug, info};

use crate::cli::RunCmd;
use crate::core::client::alert::{AlertClient, LogAlertClient, SlackAlertClient};
use crate::core::client::eligibility::CsvEligibilitySource;
use crate::core::client::lock::{process_owner_id, FileLockClient};
use crate::core::client::rpc::{ChainRpc, EthereumRpcClient};
use crate::core::client::storage::{FileFailureStore, FileRunStateStore, FileSnapshotStore};
use crate::core::signer::TransactionSigner;
use crate::error::OracleResult;
use crate::types::params::{
    AlertParams, BreakerParams, ChainParams, DataParams, ScheduleParams, StorageParams, SubmissionParams,
};
use crate::worker::breaker::CircuitBreaker;
use crate::worker::failover::{FailoverRpcClient, ProviderPool, RpcProvider};
use crate::worker::orchestrator::RunOrchestrator;
use crate::worker::scheduler::Scheduler;
use crate::worker::submitter::BatchSubmitter;

/// Validated parameters plus the clients built from them
pub struct Config {
    chain: ChainParams,
    submission: SubmissionParams,
    breaker: BreakerParams,
    schedule: ScheduleParams,
    storage: StorageParams,
    data: DataParams,
    alerts: Arc<dyn AlertClient>,
    rpc: Arc<FailoverRpcClient>,
    signer: Arc<TransactionSigner>,
}

impl Config {
    /// Validates every argument group and builds the clients.
    /// Nothing touches the network or the data directory here.
    pub fn from_run_cmd(run_cmd: &RunCmd) -> OracleResult<Self> {
        let chain = ChainParams::try_from(run_cmd.chain_args.clone())?;
        let submission = SubmissionParams::try_from(run_cmd.submission_args.clone())?;
        let breaker = BreakerParams::try_from(run_cmd.breaker_args.clone())?;
        let schedule = ScheduleParams::try_from(run_cmd.schedule_args.clone())?;
        let storage = StorageParams::from(run_cmd.storage_args.clone());
        let data = DataParams::try_from(run_cmd.data_args.clone())?;
        let alert_params = AlertParams::from(run_cmd.alert_args.clone());
        debug!(?chain, ?submission, ?breaker, ?schedule, ?storage, ?data, ?alert_params, "Parsed configuration");

        let alerts = build_alert_client(&alert_params);
        let signer = Arc::new(TransactionSigner::new(&chain.private_key, chain.chain_id)?);

        let providers = chain
            .rpc_urls
            .iter()
            .enumerate()
            .map(|(position, url)| {
                let client: Arc<dyn ChainRpc> = Arc::new(EthereumRpcClient::new(url.clone()));
                RpcProvider::new(position, url, client)
            })
            .collect();
        let pool = ProviderPool::new(providers)?;
        let rpc = Arc::new(FailoverRpcClient::new(pool, submission.provider_backoff(), alerts.clone()));

        info!(
            signer = %signer.address(),
            chain_id = chain.chain_id,
            contract = %chain.contract_address,
            providers = rpc.provider_count(),
            "Configuration loaded and validated successfully"
        );

        Ok(Self { chain, submission, breaker, schedule, storage, data, alerts, rpc, signer })
    }

    pub fn chain(&self) -> &ChainParams {
        &self.chain
    }

    pub fn schedule(&self) -> &ScheduleParams {
        &self.schedule
    }

    pub fn storage(&self) -> &StorageParams {
        &self.storage
    }

    pub fn alerts(&self) -> Arc<dyn AlertClient> {
        self.alerts.clone()
    }

    pub fn signer(&self) -> Arc<TransactionSigner> {
        self.signer.clone()
    }

    pub fn build_breaker(&self) -> CircuitBreaker {
        build_breaker(&self.storage, self.breaker)
    }

    pub fn build_submitter(&self) -> BatchSubmitter {
        BatchSubmitter::new(
            self.rpc.clone(),
            self.signer.clone(),
            self.chain.contract_address,
            self.chain.contract_function.clone(),
            self.submission.clone(),
        )
        .with_block_explorer(self.chain.block_explorer_url.clone())
    }

    pub fn build_orchestrator(&self) -> RunOrchestrator {
        RunOrchestrator::new(
            Arc::new(self.build_breaker()),
            Arc::new(CsvEligibilitySource::new(self.data.eligibility_dir.clone())),
            Arc::new(
                FileSnapshotStore::new(self.storage.cache_dir())
                    .with_retention_days(self.storage.cache_retention_days),
            ),
            Arc::new(self.build_submitter()),
            Arc::new(FileRunStateStore::new(self.storage.last_run_path())),
            self.alerts.clone(),
            self.data.cache_max_age,
        )
    }

    pub fn build_scheduler(&self) -> Scheduler {
        Scheduler::new(
            Arc::new(self.build_orchestrator()),
            Arc::new(FileRunStateStore::new(self.storage.last_run_path())),
            Arc::new(FileLockClient::new(self.storage.lock_path())),
            self.alerts.clone(),
            self.schedule.clone(),
            process_owner_id(),
        )
    }
}

/// Slack when a webhook is configured, the log otherwise
pub fn build_alert_client(params: &AlertParams) -> Arc<dyn AlertClient> {
    match &params.slack_webhook_url {
        Some(url) => Arc::new(SlackAlertClient::new(url.clone(), params.delivery_backoff())),
        None => {
            info!("No Slack webhook configured, alerts are written to the log only");
            Arc::new(LogAlertClient)
        }
    }
}

/// Breaker over the durable failure log. Entries older than the window are dropped on append.
pub fn build_breaker(storage: &StorageParams, params: BreakerParams) -> CircuitBreaker {
    let store = FileFailureStore::new(storage.failure_log_path(), params.window);
    CircuitBreaker::new(Arc::new(store), params)
}
