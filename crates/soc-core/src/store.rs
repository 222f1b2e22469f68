//! The `CatalogStore` trait.
//!
//! Implemented by storage backends (e.g. `soc-store-sqlite`). The CLI depends
//! on this abstraction, not on a concrete backend.

use std::future::Future;

use crate::{record::CatalogCourse, report::IngestReport, term::TermKey};

/// A relational sink for catalog batches.
pub trait CatalogStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist one fetched batch for `term`.
  ///
  /// Courses and sections are upserted by natural key; every other row is
  /// appended. When `clear_existing` is set, the term's rows are deleted
  /// first.
  fn ingest_term(
    &self,
    term: &TermKey,
    courses: Vec<CatalogCourse>,
    clear_existing: bool,
  ) -> impl Future<Output = Result<IngestReport, Self::Error>> + Send;
}
