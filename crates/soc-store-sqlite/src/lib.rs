//! SQLite backend for the schedule-of-classes ingestion pipeline.
//!
//! Lookups are resolved once on a setup connection; the batch is then split
//! into chunks, and every chunk is written by its own worker over its own
//! [`tokio_rusqlite`] connection and transaction.

mod encode;
mod ingester;
mod lookup;
mod registry;
mod schema;
mod worker;
mod writer;

pub mod error;

pub use error::{Error, Result};
pub use ingester::{IngestOptions, SqliteIngester, default_workers};
pub use lookup::resolve_lookups;
pub use registry::{Conflict, MAX_BIND_PARAMS, Refresh, TableSpec};
pub use schema::{SCHEMA, configure_connection};
pub use worker::{ChunkContext, ingest_chunk};
pub use writer::{BulkWriter, GeneratedKey, Row};
