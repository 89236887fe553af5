pub mod common;
pub mod submitter;
