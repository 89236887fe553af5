use alloy::primitives::{keccak256, Address, Bytes};
use alloy::sol_types::SolValue;

use crate::types::constant::ELIGIBILITY_CALL_PARAMS;

/// First four bytes of the keccak hash of a canonical function signature
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// ABI-encodes `<function>(address[] indexers, bytes data)`
pub fn encode_eligibility_call(function: &str, indexers: &[Address], data: &Bytes) -> Bytes {
    let signature = format!("{}{}", function, ELIGIBILITY_CALL_PARAMS);
    let params = (indexers.to_vec(), data.clone()).abi_encode_params();

    let mut calldata = Vec::with_capacity(4 + params.len());
    calldata.extend_from_slice(&selector(&signature));
    calldata.extend_from_slice(&params);
    Bytes::from(calldata)
}

/// Gas limit with `buffer_percent` headroom over the node's estimate
pub fn apply_gas_buffer(estimate: u64, buffer_percent: u64) -> u64 {
    let buffered = u128::from(estimate) * u128::from(100 + buffer_percent) / 100;
    u64::try_from(buffered).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn selector_matches_known_signature() {
        assert_eq!(selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn encodes_selector_then_params() {
        let indexers = vec![Address::repeat_byte(0x11), Address::repeat_byte(0x22)];
        let calldata = encode_eligibility_call("renewIndexerEligibility", &indexers, &Bytes::new());

        assert_eq!(&calldata[..4], &selector("renewIndexerEligibility(address[],bytes)"));
        // two head offsets, array length + 2 words, bytes length
        assert_eq!(calldata.len(), 4 + 64 + 32 + 2 * 32 + 32);
        // offset of the address array
        assert_eq!(calldata[4 + 31], 0x40);
        // array length
        assert_eq!(calldata[4 + 64 + 31], 2);
        assert_eq!(&calldata[4 + 96 + 12..4 + 128], Address::repeat_byte(0x11).as_slice());
    }

    #[rstest]
    #[case(100_000, 25, 125_000)]
    #[case(80_001, 25, 100_001)]
    #[case(100_000, 0, 100_000)]
    #[case(u64::MAX, 25, u64::MAX)]
    fn gas_buffer(#[case] estimate: u64, #[case] percent: u64, #[case] expected: u64) {
        assert_eq!(apply_gas_buffer(estimate, percent), expected);
    }
}
