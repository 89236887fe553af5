pub mod breaker;
pub mod failover;
pub mod orchestrator;
pub mod scheduler;
pub mod submitter;

pub use breaker::CircuitBreaker;
pub use failover::FailoverRpcClient;
pub use orchestrator::RunOrchestrator;
pub use scheduler::Scheduler;
pub use submitter::{BatchSubmitter, EligibilitySubmitter};
