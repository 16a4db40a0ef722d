//! Shared plumbing: logging setup, startup environment checks, the health
//! payload and the raw geocoding HTTP client.

use thiserror::Error;

pub mod types;
pub mod utils;
pub mod env;
pub mod geocode;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("network error: {0}")]
    Network(String),
    #[error("upstream answered with status {0}")]
    Status(u16),
    #[error("parse error: {0}")]
    Parse(String),
}
