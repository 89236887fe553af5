use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Failed to reach the alert webhook: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Alert webhook rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}
