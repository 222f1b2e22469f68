//! Per-chunk and per-run results.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{table::TableCounts, term::TermKey};

/// What one worker wrote for its chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkReport {
  pub chunk:    usize,
  /// Distinct courses upserted.
  pub courses:  usize,
  /// Distinct sections upserted.
  pub sections: usize,
  pub rows:     TableCounts,
}

/// Aggregate of every chunk in a term-level run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
  pub run_id:   Uuid,
  pub term:     TermKey,
  pub term_id:  i64,
  pub chunks:   usize,
  pub courses:  usize,
  pub sections: usize,
  pub rows:     TableCounts,
  pub elapsed:  Duration,
}

impl IngestReport {
  pub fn new(run_id: Uuid, term: TermKey, term_id: i64) -> Self {
    Self {
      run_id,
      term,
      term_id,
      chunks: 0,
      courses: 0,
      sections: 0,
      rows: TableCounts::new(),
      elapsed: Duration::ZERO,
    }
  }

  /// Fold a finished chunk into the totals. Arrival order does not matter.
  pub fn absorb(&mut self, chunk: &ChunkReport) {
    self.chunks += 1;
    self.courses += chunk.courses;
    self.sections += chunk.sections;
    self.rows.merge(&chunk.rows);
  }

  pub fn rows_per_sec(&self) -> f64 { per_sec(self.rows.total(), self.elapsed) }

  pub fn courses_per_sec(&self) -> f64 { per_sec(self.courses, self.elapsed) }

  pub fn sections_per_sec(&self) -> f64 { per_sec(self.sections, self.elapsed) }
}

fn per_sec(count: usize, elapsed: Duration) -> f64 {
  let secs = elapsed.as_secs_f64();
  if secs > 0.0 { count as f64 / secs } else { 0.0 }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::table::Table;

  fn chunk(chunk: usize, courses: usize, sections: usize) -> ChunkReport {
    let mut rows = TableCounts::new();
    rows.add(Table::Courses, courses);
    rows.add(Table::Sections, sections);
    ChunkReport { chunk, courses, sections, rows }
  }

  #[test]
  fn absorbs_chunks_in_any_order() {
    let term = TermKey::new(2025, "1", "NB").unwrap();
    let mut report = IngestReport::new(Uuid::new_v4(), term, 1);
    report.absorb(&chunk(2, 4, 10));
    report.absorb(&chunk(0, 3, 6));
    report.absorb(&chunk(1, 5, 0));

    assert_eq!(report.chunks, 3);
    assert_eq!(report.courses, 12);
    assert_eq!(report.sections, 16);
    assert_eq!(report.rows.total(), 28);
  }

  #[test]
  fn throughput_uses_elapsed_time() {
    let term = TermKey::new(2025, "1", "NB").unwrap();
    let mut report = IngestReport::new(Uuid::new_v4(), term, 1);
    assert_eq!(report.rows_per_sec(), 0.0);

    report.absorb(&chunk(0, 10, 30));
    report.elapsed = Duration::from_secs(2);
    assert_eq!(report.courses_per_sec(), 5.0);
    assert_eq!(report.sections_per_sec(), 15.0);
    assert_eq!(report.rows_per_sec(), 20.0);
  }
}
