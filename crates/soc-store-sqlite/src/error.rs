//! Error type for `soc-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A worker's chunk was rolled back. Other chunks are unaffected.
  #[error("chunk {chunk} failed: {source}")]
  Chunk {
    chunk:  usize,
    #[source]
    source: tokio_rusqlite::Error,
  },

  #[error("worker task failed: {0}")]
  Join(#[from] tokio::task::JoinError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
