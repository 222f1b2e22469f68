//! Chunk worker.
//!
//! A worker writes one contiguous slice of the batch inside a single
//! transaction:
//!
//!   1. courses, deduplicated by course string (first wins), keyed back to
//!      their ids
//!   2. course children (campus locations, core codes, prerequisites)
//!   3. sections, deduplicated and keyed back by `(course_id, index_number)`
//!   4. section children
//!
//! The transaction commits only if every phase succeeds.

use std::{
  collections::{BTreeMap, HashMap},
  sync::Arc,
};

use chrono::Utc;
use rusqlite::{Connection, TransactionBehavior};
use soc_core::{
  lookup::LookupIds,
  prereq::parse_prerequisites,
  record::{CatalogCourse, CatalogSection},
  report::ChunkReport,
  table::Table,
};
use tracing::{debug, warn};

use crate::{
  encode::{self, encode_dt},
  writer::{BulkWriter, Row},
};

/// Everything a worker needs besides its slice of records.
#[derive(Debug, Clone)]
pub struct ChunkContext {
  pub chunk:           usize,
  pub term_id:         i64,
  pub lookups:         Arc<LookupIds>,
  pub flush_threshold: usize,
}

/// Write `courses` and all their descendants in one transaction.
///
/// On error the transaction is rolled back and nothing from this chunk is
/// visible.
pub fn ingest_chunk(
  conn: &mut Connection,
  courses: &[CatalogCourse],
  ctx: &ChunkContext,
) -> rusqlite::Result<ChunkReport> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

  match write_chunk(&tx, courses, ctx) {
    Ok(report) => {
      tx.commit()?;
      Ok(report)
    }
    Err(e) => {
      if let Err(rollback) = tx.rollback() {
        warn!(chunk = ctx.chunk, error = %rollback, "rollback failed");
      }
      Err(e)
    }
  }
}

fn write_chunk(
  conn: &Connection,
  courses: &[CatalogCourse],
  ctx: &ChunkContext,
) -> rusqlite::Result<ChunkReport> {
  let now = encode_dt(Utc::now());
  let mut writer = BulkWriter::new(conn, ctx.flush_threshold);

  // ── Courses ──────────────────────────────────────────────────────────────

  let mut courses_by_key: BTreeMap<&str, &CatalogCourse> = BTreeMap::new();
  for course in courses {
    match course.natural_key() {
      Some(key) => {
        courses_by_key.entry(key).or_insert(course);
      }
      None => debug!(chunk = ctx.chunk, "course without course string skipped"),
    }
  }

  for (key, course) in &courses_by_key {
    writer.add(
      Table::Courses,
      encode::course_row(course, key, ctx.term_id, &ctx.lookups, &now),
    )?;
  }
  let course_ids: HashMap<String, i64> = writer
    .flush(Table::Courses)?
    .into_iter()
    .filter_map(|k| Some((k.as_text()?.to_owned(), k.id)))
    .collect();

  // ── Course children ──────────────────────────────────────────────────────

  let mut sections_by_key: BTreeMap<(i64, &str), &CatalogSection> = BTreeMap::new();

  for (key, course) in &courses_by_key {
    let Some(&course_id) = course_ids.get(*key) else {
      warn!(chunk = ctx.chunk, course = key, "no id returned for course");
      continue;
    };

    add_children(
      &mut writer,
      Table::CourseCampusLocations,
      course_id,
      &course.campus_locations,
      encode::code_description_row,
    )?;
    add_children(
      &mut writer,
      Table::CourseCoreCodes,
      course_id,
      &course.core_codes,
      encode::core_code_row,
    )?;
    if let Some(notes) = course.pre_req_notes.as_deref() {
      add_children(
        &mut writer,
        Table::Prerequisites,
        course_id,
        &parse_prerequisites(notes),
        encode::prerequisite_row,
      )?;
    }

    for section in &course.sections {
      match section.natural_key() {
        Some(index) => {
          sections_by_key.entry((course_id, index)).or_insert(section);
        }
        None => debug!(chunk = ctx.chunk, course = key, "section without index skipped"),
      }
    }
  }

  writer.flush(Table::CourseCampusLocations)?;
  writer.flush(Table::CourseCoreCodes)?;
  writer.flush(Table::Prerequisites)?;

  // ── Sections ─────────────────────────────────────────────────────────────

  for (&(course_id, index), section) in &sections_by_key {
    writer.add(
      Table::Sections,
      encode::section_row(section, course_id, index, &now),
    )?;
  }
  let section_ids: HashMap<(i64, String), i64> = writer
    .flush(Table::Sections)?
    .into_iter()
    .filter_map(|k| {
      let (course_id, index) = k.as_parent_and_text()?;
      Some(((course_id, index.to_owned()), k.id))
    })
    .collect();

  // ── Section children ─────────────────────────────────────────────────────

  for (&(course_id, index), section) in &sections_by_key {
    let Some(&section_id) = section_ids.get(&(course_id, index.to_owned())) else {
      warn!(chunk = ctx.chunk, course_id, index, "no id returned for section");
      continue;
    };

    for name in section.instructor_names() {
      match ctx.lookups.instructor(name) {
        Some(instructor_id) => writer.add(
          Table::SectionInstructors,
          encode::section_instructor_row(section_id, instructor_id),
        )?,
        None => debug!(chunk = ctx.chunk, instructor = name, "unknown instructor skipped"),
      }
    }

    add_children(
      &mut writer,
      Table::SectionComments,
      section_id,
      &section.comments,
      encode::code_description_row,
    )?;
    add_children(
      &mut writer,
      Table::SectionCampusLocations,
      section_id,
      &section.section_campus_locations,
      encode::code_description_row,
    )?;
    add_children(&mut writer, Table::SectionMajors, section_id, &section.majors, encode::major_row)?;
    add_children(&mut writer, Table::SectionMinors, section_id, &section.minors, encode::code_only_row)?;
    add_children(
      &mut writer,
      Table::SectionUnitMajors,
      section_id,
      &section.unit_majors,
      encode::unit_major_row,
    )?;
    add_children(
      &mut writer,
      Table::SectionHonorPrograms,
      section_id,
      &section.honor_programs,
      encode::code_only_row,
    )?;
    add_children(
      &mut writer,
      Table::CrossListedSections,
      section_id,
      &section.cross_listed_sections,
      encode::cross_listing_row,
    )?;
    add_children(
      &mut writer,
      Table::MeetingTimes,
      section_id,
      &section.meeting_times,
      encode::meeting_time_row,
    )?;
  }

  writer.flush_all()?;
  debug!(
    chunk = ctx.chunk,
    courses = course_ids.len(),
    sections = section_ids.len(),
    statements = writer.statements(),
    "chunk written"
  );

  Ok(ChunkReport {
    chunk:    ctx.chunk,
    courses:  course_ids.len(),
    sections: section_ids.len(),
    rows:     writer.into_counts(),
  })
}

fn add_children<T>(
  writer: &mut BulkWriter<'_>,
  table: Table,
  parent_id: i64,
  items: &[T],
  encode: impl Fn(i64, &T) -> Row,
) -> rusqlite::Result<()> {
  for item in items {
    writer.add(table, encode(parent_id, item))?;
  }
  Ok(())
}
