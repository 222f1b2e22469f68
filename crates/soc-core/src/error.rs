//! Error types for `soc-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid term key: {0}")]
  InvalidTermKey(String),

  #[error("malformed catalog payload: {0}")]
  Payload(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
