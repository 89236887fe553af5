pub mod alert;
pub mod eligibility;
pub mod lock;
pub mod rpc;
pub mod storage;

pub use alert::{AlertClient, LogAlertClient, SlackAlertClient};
pub use eligibility::{CsvEligibilitySource, EligibilitySource};
pub use lock::{FileLockClient, LockClient};
pub use rpc::{ChainRpc, EthereumRpcClient};
pub use storage::{FailureStore, FileFailureStore, FileRunStateStore, FileSnapshotStore, RunStateStore, SnapshotStore};
