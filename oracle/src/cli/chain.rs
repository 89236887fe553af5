use clap::Args;
use url::Url;

/// Parameters used to reach the chain and the eligibility contract.
#[derive(Clone, Args)]
pub struct ChainCliArgs {
    /// Ordered list of RPC endpoints, the first one is the primary.
    /// Endpoints are tried top to bottom when one keeps failing.
    #[arg(env = "ORACLE_RPC_URLS", long = "rpc-url", value_delimiter = ',', required = true)]
    pub rpc_urls: Vec<Url>,

    /// Chain id the signed transactions are bound to.
    #[arg(env = "ORACLE_CHAIN_ID", long)]
    pub chain_id: u64,

    /// Address of the contract exposing the batched eligibility write.
    #[arg(env = "ORACLE_CONTRACT_ADDRESS", long)]
    pub contract_address: String,

    /// Name of the contract function taking `(address[] indexers, bytes data)`.
    #[arg(env = "ORACLE_CONTRACT_FUNCTION", long, default_value = "renewIndexerEligibility")]
    pub contract_function: String,

    /// Hex private key of the submitting account, with or without the 0x prefix.
    #[arg(env = "ORACLE_PRIVATE_KEY", long, hide_env_values = true)]
    pub private_key: String,

    /// Block explorer base URL used to build transaction links, e.g. https://arbiscan.io
    #[arg(env = "ORACLE_BLOCK_EXPLORER_URL", long)]
    pub block_explorer_url: Option<Url>,
}

impl std::fmt::Debug for ChainCliArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainCliArgs")
            .field("rpc_urls", &self.rpc_urls.len())
            .field("chain_id", &self.chain_id)
            .field("contract_address", &self.contract_address)
            .field("contract_function", &self.contract_function)
            .field("private_key", &"<redacted>")
            .field("block_explorer_url", &self.block_explorer_url)
            .finish()
    }
}
