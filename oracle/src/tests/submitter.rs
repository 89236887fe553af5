use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use assert_matches::assert_matches;
use rstest::rstest;
use tracing_test::traced_test;
use url::Url;

use crate::core::client::rpc::{ChainRpc, MockChainRpc};
use crate::tests::common::{addresses, failover, fast_backoff, test_signer, RecordingAlertClient, ScriptedChain};
use crate::types::params::SubmissionParams;
use crate::worker::failover::FailoverError;
use crate::worker::submitter::{BatchFailure, BatchSubmitter, EligibilitySubmitter};

fn contract() -> Address {
    Address::repeat_byte(0xc0)
}

fn params() -> SubmissionParams {
    SubmissionParams {
        batch_size: 125,
        attempts_per_provider: 3,
        rpc_backoff_base: Duration::from_millis(10),
        rpc_backoff_max: Duration::from_millis(40),
        receipt_timeout: Duration::from_secs(30),
        receipt_poll_interval: Duration::from_secs(2),
        gas_buffer_percent: 25,
    }
}

fn submitter(chain: Arc<dyn ChainRpc>, params: SubmissionParams) -> BatchSubmitter {
    let rpc = failover(vec![chain], fast_backoff(3), Arc::new(RecordingAlertClient::default()));
    BatchSubmitter::new(Arc::new(rpc), test_signer(), contract(), "renewIndexerEligibility", params)
}

#[rstest]
#[tokio::test]
async fn submits_batches_in_order_with_increasing_nonces() {
    let chain = Arc::new(ScriptedChain { chain_nonce: 5, ..Default::default() });
    let explorer = Url::parse("https://sepolia.arbiscan.io/").unwrap();
    let submitter = submitter(chain.clone(), params()).with_block_explorer(Some(explorer));

    let report = submitter.submit_all(&addresses(320)).await.unwrap();

    assert_eq!(report.total_addresses, 320);
    assert_eq!(report.batches.iter().map(|b| b.size).collect::<Vec<_>>(), vec![125, 125, 70]);
    assert_eq!(report.batches.iter().map(|b| b.index).collect::<Vec<_>>(), vec![0, 1, 2]);
    // the node keeps reporting 5, the local sequence takes over
    assert_eq!(report.batches.iter().map(|b| b.nonce).collect::<Vec<_>>(), vec![5, 6, 7]);
    assert_eq!(chain.estimated_batch_sizes(), vec![125, 125, 70]);
    assert_eq!(report.tx_hashes(), chain.sent());

    let first = &report.batches[0];
    assert_eq!(first.block_number, Some(1_000));
    assert_eq!(first.explorer_url, Some(format!("https://sepolia.arbiscan.io/tx/{:#x}", first.tx_hash)));
}

#[rstest]
#[tokio::test]
async fn stops_at_the_first_failed_batch() {
    let chain = Arc::new(ScriptedChain { fail_send_at: Some(1), ..Default::default() });
    let submitter = submitter(chain.clone(), params());

    let err = submitter.submit_all(&addresses(320)).await.unwrap_err();

    assert_eq!(err.failed_batch, 1);
    assert_eq!(err.total_batches, 3);
    assert_eq!(err.confirmed.len(), 1);
    assert_eq!(err.tx_hashes(), chain.sent());
    assert_matches!(err.cause, BatchFailure::Rpc(FailoverError::Rejected { operation: "send_raw_transaction", .. }));
    // the third batch was never built
    assert_eq!(chain.estimated_batch_sizes(), vec![125, 125]);
    assert!(err.to_string().starts_with("Batch 2 of 3 failed with 1 batch(es) already confirmed"));
}

#[rstest]
#[tokio::test]
async fn send_that_landed_despite_a_lost_response_confirms() {
    let chain = Arc::new(ScriptedChain { lose_response_at: Some(0), ..Default::default() });
    let submitter = submitter(chain.clone(), params());

    let report = submitter.submit_all(&addresses(10)).await.unwrap();

    // the resend was answered with "nonce too low"
    assert_eq!(chain.send_attempts(), 2);
    assert_eq!(chain.sent().len(), 1);
    assert_eq!(report.tx_hashes(), chain.sent());
    assert_eq!(report.batches[0].block_number, Some(1_000));
}

#[rstest]
#[tokio::test]
async fn rejected_send_without_a_receipt_still_fails() {
    let chain = Arc::new(ScriptedChain { fail_send_at: Some(0), ..Default::default() });
    let submitter = submitter(chain.clone(), params());

    let err = submitter.submit_all(&addresses(10)).await.unwrap_err();

    assert_matches!(err.cause, BatchFailure::Rpc(FailoverError::Rejected { operation: "send_raw_transaction", .. }));
    assert!(chain.sent().is_empty());
}

#[rstest]
#[tokio::test]
async fn reverted_receipt_fails_the_batch() {
    let chain = Arc::new(ScriptedChain { revert_at: Some(0), ..Default::default() });
    let submitter = submitter(chain.clone(), params());

    let err = submitter.submit_all(&addresses(10)).await.unwrap_err();

    assert_eq!(err.failed_batch, 0);
    assert!(err.confirmed.is_empty());
    assert_matches!(err.cause, BatchFailure::Reverted { block_number: Some(1_000), .. });
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn missing_receipt_times_out() {
    let chain = Arc::new(ScriptedChain { withhold_receipts: true, ..Default::default() });
    let submitter = submitter(chain.clone(), params());

    let err = submitter.submit_all(&addresses(3)).await.unwrap_err();

    assert_matches!(err.cause, BatchFailure::ReceiptTimeout { timeout, tx_hash } if timeout == Duration::from_secs(30) && tx_hash == chain.sent()[0]);
    assert_eq!(chain.sent().len(), 1);
}

#[rstest]
#[tokio::test]
async fn empty_set_makes_no_rpc_calls() {
    // any call on a mock without expectations panics
    let submitter = submitter(Arc::new(MockChainRpc::new()), params());

    let report = submitter.submit_all(&[]).await.unwrap();

    assert!(report.batches.is_empty());
    assert_eq!(report.total_addresses, 0);
}

#[rstest]
#[case(1, vec![1])]
#[case(125, vec![125])]
#[case(126, vec![125, 1])]
#[tokio::test]
async fn batch_boundaries(#[case] count: usize, #[case] expected: Vec<usize>) {
    let chain = Arc::new(ScriptedChain::default());
    let submitter = submitter(chain.clone(), params());

    let report = submitter.submit_all(&addresses(count)).await.unwrap();

    assert_eq!(report.batches.iter().map(|b| b.size).collect::<Vec<_>>(), expected);
}

#[tokio::test]
#[traced_test]
async fn private_key_never_reaches_the_logs() {
    let chain = Arc::new(ScriptedChain::default());
    let submitter = submitter(chain, params());

    submitter.submit_all(&addresses(2)).await.unwrap();

    assert!(logs_contain("Batch confirmed"));
    assert!(!logs_contain("4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318"));
}
