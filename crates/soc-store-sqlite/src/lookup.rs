//! Lookup resolution.
//!
//! Schools, subjects and instructors are upserted once per run in their own
//! committed transaction, so every worker can read their ids without
//! contending on the lookup tables.

use std::collections::{BTreeSet, HashMap};

use rusqlite::{Connection, TransactionBehavior, params_from_iter};
use soc_core::{
  lookup::{LookupIds, LookupSet},
  table::Table,
};
use tracing::debug;

use crate::{
  encode,
  registry::MAX_BIND_PARAMS,
  writer::{BulkWriter, GeneratedKey},
};

/// Upsert every lookup in `set` and return their ids. An empty set opens no
/// transaction.
///
/// Schools and subjects refresh their descriptions (subject notes are only
/// overwritten by a non-null value). Instructors are insert-if-absent; their
/// ids, including those of pre-existing rows, are read back afterwards.
pub fn resolve_lookups(
  conn: &mut Connection,
  set: &LookupSet,
  flush_threshold: usize,
) -> rusqlite::Result<LookupIds> {
  if set.is_empty() {
    return Ok(LookupIds::default());
  }

  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  let mut ids = LookupIds::default();

  {
    let mut writer = BulkWriter::new(&tx, flush_threshold);

    for (code, description) in &set.schools {
      writer.add(Table::Schools, encode::school_row(code, description))?;
    }
    ids.schools = text_keys(writer.flush(Table::Schools)?);

    for (code, info) in &set.subjects {
      writer.add(Table::Subjects, encode::subject_row(code, info))?;
    }
    ids.subjects = text_keys(writer.flush(Table::Subjects)?);

    for name in &set.instructors {
      writer.add(Table::Instructors, encode::instructor_row(name))?;
    }
    writer.flush(Table::Instructors)?;
  }

  ids.instructors = instructor_ids(&tx, &set.instructors)?;
  tx.commit()?;

  debug!(
    schools = ids.schools.len(),
    subjects = ids.subjects.len(),
    instructors = ids.instructors.len(),
    "lookups resolved"
  );
  Ok(ids)
}

fn text_keys(keys: Vec<GeneratedKey>) -> HashMap<String, i64> {
  keys
    .into_iter()
    .filter_map(|k| Some((k.as_text()?.to_owned(), k.id)))
    .collect()
}

/// `name → id` for every name in `names`, paged to stay under the bind limit.
fn instructor_ids(
  conn: &Connection,
  names: &BTreeSet<String>,
) -> rusqlite::Result<HashMap<String, i64>> {
  let names: Vec<&String> = names.iter().collect();
  let mut ids = HashMap::with_capacity(names.len());

  for page in names.chunks(MAX_BIND_PARAMS) {
    let sql = format!(
      "SELECT id, name FROM instructors WHERE name IN ({})",
      vec!["?"; page.len()].join(", ")
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(page.iter()), |row| {
      Ok((row.get::<_, String>(1)?, row.get::<_, i64>(0)?))
    })?;
    for row in rows {
      let (name, id) = row?;
      ids.insert(name, id);
    }
  }

  Ok(ids)
}
