use std::str::FromStr as _;

use alloy::primitives::Address;
use url::Url;
use zeroize::Zeroizing;

use crate::cli::chain::ChainCliArgs;
use crate::core::signer::validate_private_key;
use crate::OracleError;

#[derive(Clone)]
pub struct ChainParams {
    pub rpc_urls: Vec<Url>,
    pub chain_id: u64,
    pub contract_address: Address,
    pub contract_function: String,
    /// Normalised `0x`-prefixed lowercase key, wiped on drop
    pub private_key: Zeroizing<String>,
    pub block_explorer_url: Option<Url>,
}

impl std::fmt::Debug for ChainParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainParams")
            .field("rpc_urls", &self.rpc_urls.len())
            .field("chain_id", &self.chain_id)
            .field("contract_address", &self.contract_address)
            .field("contract_function", &self.contract_function)
            .field("private_key", &"<redacted>")
            .field("block_explorer_url", &self.block_explorer_url)
            .finish()
    }
}

impl TryFrom<ChainCliArgs> for ChainParams {
    type Error = OracleError;

    fn try_from(args: ChainCliArgs) -> Result<Self, Self::Error> {
        if args.rpc_urls.is_empty() {
            return Err(OracleError::ConfigError("At least one RPC URL is required".to_string()));
        }

        let contract_address = Address::from_str(args.contract_address.trim())
            .map_err(|e| OracleError::ConfigError(format!("Invalid contract address: {}", e)))?;

        let contract_function = args.contract_function.trim().to_string();
        if contract_function.is_empty() || !contract_function.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(OracleError::ConfigError(format!("Invalid contract function name: {:?}", contract_function)));
        }

        let private_key = validate_private_key(&args.private_key)?;

        Ok(Self {
            rpc_urls: args.rpc_urls,
            chain_id: args.chain_id,
            contract_address,
            contract_function,
            private_key,
            block_explorer_url: args.block_explorer_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn args() -> ChainCliArgs {
        ChainCliArgs {
            rpc_urls: vec![Url::parse("https://rpc.example").unwrap()],
            chain_id: 42161,
            contract_address: "0x0000000000000000000000000000000000000001".to_string(),
            contract_function: "renewIndexerEligibility".to_string(),
            private_key: format!("  0X{}\n", "AB".repeat(32)),
            block_explorer_url: None,
        }
    }

    #[test]
    fn normalises_private_key() {
        let params = ChainParams::try_from(args()).unwrap();
        assert_eq!(params.private_key.as_str(), format!("0x{}", "ab".repeat(32)));
    }

    #[test]
    fn rejects_empty_provider_list() {
        let mut args = args();
        args.rpc_urls.clear();
        assert_matches!(ChainParams::try_from(args), Err(OracleError::ConfigError(_)));
    }

    #[test]
    fn rejects_bad_contract_address() {
        let mut args = args();
        args.contract_address = "0x1234".to_string();
        assert_matches!(ChainParams::try_from(args), Err(OracleError::ConfigError(_)));
    }

    #[test]
    fn rejects_function_signature_instead_of_name() {
        let mut args = args();
        args.contract_function = "renew(address[])".to_string();
        assert_matches!(ChainParams::try_from(args), Err(OracleError::ConfigError(_)));
    }
}
