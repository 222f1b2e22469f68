//! Per-table buffered bulk writer.
//!
//! Rows are buffered per [`Table`]. When a table's buffer reaches the flush
//! threshold it is written as one multi-row statement. Keys generated by
//! those automatic flushes are retained and handed back, together with the
//! keys of the final write, by the next explicit [`BulkWriter::flush`].
//!
//! The writer never commits; it writes through whatever connection or
//! transaction it was given.

use std::collections::BTreeMap;

use rusqlite::{Connection, params_from_iter, types::Value};
use soc_core::table::{Table, TableCounts};
use tracing::debug;

use crate::registry::TableSpec;

/// One row of bind values, in [`TableSpec::columns`] order.
pub type Row = Vec<Value>;

/// A generated surrogate id and the natural-key values returned with it.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedKey {
  pub id:  i64,
  pub key: Vec<Value>,
}

impl GeneratedKey {
  /// Single text key, e.g. a course string or a school code.
  pub fn as_text(&self) -> Option<&str> {
    match self.key.as_slice() {
      [Value::Text(s)] => Some(s),
      _ => None,
    }
  }

  /// `(parent_id, text)` key, e.g. a section's `(course_id, index_number)`.
  pub fn as_parent_and_text(&self) -> Option<(i64, &str)> {
    match self.key.as_slice() {
      [Value::Integer(parent), Value::Text(s)] => Some((*parent, s)),
      _ => None,
    }
  }
}

pub struct BulkWriter<'c> {
  conn:       &'c Connection,
  threshold:  usize,
  pending:    BTreeMap<Table, Vec<Row>>,
  generated:  BTreeMap<Table, Vec<GeneratedKey>>,
  counts:     TableCounts,
  statements: usize,
}

impl<'c> BulkWriter<'c> {
  pub fn new(conn: &'c Connection, threshold: usize) -> Self {
    Self {
      conn,
      threshold: threshold.max(1),
      pending: BTreeMap::new(),
      generated: BTreeMap::new(),
      counts: TableCounts::new(),
      statements: 0,
    }
  }

  /// Effective threshold for `table`: the configured one, lowered if needed
  /// so a full buffer still fits in a single statement.
  pub fn threshold_for(&self, table: Table) -> usize {
    self.threshold.min(TableSpec::of(table).max_rows_per_statement())
  }

  /// Buffer `row`, writing the table's buffer if it is now full.
  pub fn add(&mut self, table: Table, row: Row) -> rusqlite::Result<()> {
    debug_assert_eq!(row.len(), TableSpec::of(table).columns.len(), "{table} row width");

    let threshold = self.threshold_for(table);
    let buffered = self.pending.entry(table).or_default();
    buffered.push(row);

    if buffered.len() >= threshold {
      self.write(table)?;
    }
    Ok(())
  }

  /// Write whatever is buffered for `table` and return every key generated
  /// for it since the last explicit flush. An empty buffer issues no
  /// statement.
  pub fn flush(&mut self, table: Table) -> rusqlite::Result<Vec<GeneratedKey>> {
    self.write(table)?;
    Ok(self.generated.remove(&table).unwrap_or_default())
  }

  /// Write every buffered table, parents before children.
  pub fn flush_all(&mut self) -> rusqlite::Result<()> {
    for table in Table::all() {
      self.write(table)?;
    }
    self.generated.clear();
    Ok(())
  }

  pub fn counts(&self) -> &TableCounts { &self.counts }

  pub fn into_counts(self) -> TableCounts { self.counts }

  /// Statements issued so far.
  pub fn statements(&self) -> usize { self.statements }

  pub fn pending_len(&self, table: Table) -> usize {
    self.pending.get(&table).map_or(0, Vec::len)
  }

  fn write(&mut self, table: Table) -> rusqlite::Result<()> {
    let rows = match self.pending.remove(&table) {
      Some(rows) if !rows.is_empty() => rows,
      _ => return Ok(()),
    };

    let conn = self.conn;
    let spec = TableSpec::of(table);
    let sql = spec.insert_sql(rows.len());
    let mut stmt = conn.prepare_cached(&sql)?;
    let params = params_from_iter(rows.iter().flatten());

    if spec.returns_keys() {
      let width = spec.returning.len();
      let keys = stmt
        .query_map(params, |row| {
          let key = (1..=width)
            .map(|i| row.get::<_, Value>(i))
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(GeneratedKey { id: row.get(0)?, key })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
      self.generated.entry(table).or_default().extend(keys);
    } else {
      stmt.execute(params)?;
    }

    self.counts.add(table, rows.len());
    self.statements += 1;
    debug!(table = %table, rows = rows.len(), "flushed buffer");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn key(id: i64, key: Vec<Value>) -> GeneratedKey { GeneratedKey { id, key } }

  #[test]
  fn text_key_accessors() {
    let k = key(7, vec![Value::Text("01:198:111".into())]);
    assert_eq!(k.as_text(), Some("01:198:111"));
    assert_eq!(k.as_parent_and_text(), None);
  }

  #[test]
  fn composite_key_accessors() {
    let k = key(9, vec![Value::Integer(3), Value::Text("09214".into())]);
    assert_eq!(k.as_parent_and_text(), Some((3, "09214")));
    assert_eq!(k.as_text(), None);
  }

  #[test]
  fn threshold_is_capped_by_statement_size() {
    let conn = Connection::open_in_memory().unwrap();
    let writer = BulkWriter::new(&conn, 1_000_000);
    let courses = TableSpec::of(Table::Courses);
    assert_eq!(writer.threshold_for(Table::Courses), courses.max_rows_per_statement());

    let writer = BulkWriter::new(&conn, 0);
    assert_eq!(writer.threshold_for(Table::SectionMinors), 1);
  }
}
