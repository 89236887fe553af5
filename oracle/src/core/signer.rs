use alloy::eips::eip2718::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, B256};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use thiserror::Error;
use zeroize::Zeroizing;

#[derive(Error, Debug)]
pub enum SignerError {
    #[error("Private key must be 64 hex characters, optionally prefixed with 0x")]
    InvalidPrivateKeyFormat,

    #[error("Private key is not a valid secp256k1 key")]
    InvalidPrivateKey,

    #[error("Failed to build signed transaction: {0}")]
    Signing(String),
}

/// Normalises a hex private key to `0x` + 64 lowercase hex characters.
///
/// Surrounding whitespace and a `0x`/`0X` prefix are accepted. The error never
/// echoes the key.
pub fn validate_private_key(raw: &str) -> Result<Zeroizing<String>, SignerError> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")).unwrap_or(trimmed);

    if digits.len() != 64 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(SignerError::InvalidPrivateKeyFormat);
    }

    Ok(Zeroizing::new(format!("0x{}", digits.to_ascii_lowercase())))
}

/// Locally signed transaction ready for `eth_sendRawTransaction`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub hash: B256,
    pub raw: Bytes,
}

/// Holds the submitting key. The key never leaves this type and is not part of its `Debug` output.
pub struct TransactionSigner {
    wallet: EthereumWallet,
    address: Address,
    chain_id: u64,
}

impl std::fmt::Debug for TransactionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionSigner").field("address", &self.address).field("chain_id", &self.chain_id).finish()
    }
}

impl TransactionSigner {
    pub fn new(private_key: &str, chain_id: u64) -> Result<Self, SignerError> {
        let key = validate_private_key(private_key)?;
        let signer: PrivateKeySigner = key.parse().map_err(|_| SignerError::InvalidPrivateKey)?;
        let address = signer.address();
        Ok(Self { wallet: EthereumWallet::from(signer), address, chain_id })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Signs a fully populated EIP-1559 request and returns its EIP-2718 encoding.
    pub async fn sign(&self, request: TransactionRequest) -> Result<SignedTransaction, SignerError> {
        let envelope = request
            .with_from(self.address)
            .with_chain_id(self.chain_id)
            .build(&self.wallet)
            .await
            .map_err(|e| SignerError::Signing(e.to_string()))?;

        Ok(SignedTransaction { hash: *envelope.tx_hash(), raw: Bytes::from(envelope.encoded_2718()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, keccak256};
    use assert_matches::assert_matches;
    use rstest::rstest;

    const KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[rstest]
    #[case(KEY)]
    #[case("0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318")]
    #[case("  0X4C0883A69102937D6231471B5DBB6204FE5129617082792AE468D01A3F362318\n")]
    fn accepts_and_normalises_keys(#[case] raw: &str) {
        let key = validate_private_key(raw).unwrap();
        assert_eq!(key.as_str(), format!("0x{KEY}"));
    }

    #[rstest]
    #[case("")]
    #[case("0x1234")]
    #[case("zz0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318")]
    #[case("0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f36231800")]
    fn rejects_malformed_keys(#[case] raw: &str) {
        assert_matches!(validate_private_key(raw), Err(SignerError::InvalidPrivateKeyFormat));
    }

    #[test]
    fn debug_shows_address_only() {
        let signer = TransactionSigner::new(KEY, 42161).unwrap();
        assert_eq!(signer.address(), address!("2c7536E3605D9C16a7a3D7b1898e529396a65c23"));

        let rendered = format!("{:?}", signer);
        assert!(!rendered.contains(KEY));
        assert!(rendered.contains("42161"));
    }

    #[tokio::test]
    async fn signed_hash_matches_payload() {
        let signer = TransactionSigner::new(KEY, 42161).unwrap();
        let request = TransactionRequest::default()
            .with_to(address!("0000000000000000000000000000000000000001"))
            .with_input(Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]))
            .with_nonce(7)
            .with_gas_limit(100_000)
            .with_max_fee_per_gas(2_000_000_000)
            .with_max_priority_fee_per_gas(1_000_000);

        let signed = signer.sign(request).await.unwrap();
        assert_eq!(keccak256(&signed.raw), signed.hash);
        // EIP-1559 envelopes are type 2
        assert_eq!(signed.raw[0], 0x02);
    }
}
