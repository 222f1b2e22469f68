//! Core types for the schedule-of-classes ingestion pipeline.
//!
//! This crate is deliberately free of database and HTTP dependencies. It owns
//! the upstream record model, the pure transformations the pipeline runs over
//! a batch (prerequisite parsing, lookup extraction, chunk partitioning) and
//! the identifiers and reports shared by storage backends.

pub mod error;
pub mod lookup;
pub mod partition;
pub mod prereq;
pub mod record;
pub mod report;
pub mod store;
pub mod table;
pub mod term;

pub use error::{Error, Result};
