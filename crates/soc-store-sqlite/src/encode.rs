//! Record → row encoding.
//!
//! Each builder produces a [`Row`] in the column order of the table's
//! [`TableSpec`](crate::registry::TableSpec).

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use soc_core::{
  lookup::{LookupIds, SubjectInfo},
  prereq::Prerequisite,
  record::{
    CatalogCourse, CatalogSection, CodeDescription, CodeOnly, CoreCode, CrossListing, Major,
    MeetingTime, UnitMajor,
  },
};

use crate::writer::Row;

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

fn text(v: &Option<String>) -> Value { v.clone().map_or(Value::Null, Value::Text) }

fn owned(v: Option<String>) -> Value { v.map_or(Value::Null, Value::Text) }

fn txt(v: &str) -> Value { Value::Text(v.to_owned()) }

fn id(v: Option<i64>) -> Value { v.map_or(Value::Null, Value::Integer) }

fn flag(v: bool) -> Value { Value::Integer(i64::from(v)) }

// ─── Lookups ─────────────────────────────────────────────────────────────────

pub fn school_row(code: &str, description: &Option<String>) -> Row {
  vec![txt(code), text(description)]
}

pub fn subject_row(code: &str, info: &SubjectInfo) -> Row {
  vec![txt(code), text(&info.description), text(&info.notes)]
}

pub fn instructor_row(name: &str) -> Row { vec![txt(name)] }

// ─── Courses ─────────────────────────────────────────────────────────────────

pub fn course_row(
  course: &CatalogCourse,
  course_string: &str,
  term_id: i64,
  lookups: &LookupIds,
  now: &str,
) -> Row {
  let credits_object = course.credits_object.as_ref();
  vec![
    Value::Integer(term_id),
    txt(course_string),
    text(&course.offering_unit_code),
    text(&course.subject),
    text(&course.course_number),
    text(&course.supplement_code),
    text(&course.title),
    owned(course.expanded_title_trimmed()),
    text(&course.level),
    course.credits.map_or(Value::Null, Value::Real),
    owned(credits_object.and_then(|c| c.code.clone())),
    owned(credits_object.and_then(|c| c.description.clone())),
    id(lookups.school(course.school_code())),
    id(lookups.subject(course.subject_code())),
    text(&course.main_campus),
    text(&course.campus_code),
    Value::Integer(course.open_sections.unwrap_or(0)),
    text(&course.synopsis_url),
    text(&course.course_description),
    text(&course.course_notes),
    text(&course.unit_notes),
    text(&course.pre_req_notes),
    text(&course.course_fee),
    text(&course.course_fee_descr),
    txt(now),
    txt(now),
  ]
}

/// Shared by course campus locations, section comments and section campus
/// locations.
pub fn code_description_row(parent_id: i64, item: &CodeDescription) -> Row {
  vec![Value::Integer(parent_id), text(&item.code), text(&item.description)]
}

pub fn core_code_row(course_id: i64, core: &CoreCode) -> Row {
  vec![
    Value::Integer(course_id),
    text(&core.core_code),
    text(&core.core_code_description),
    text(&core.effective),
    text(&core.last_updated),
  ]
}

pub fn prerequisite_row(course_id: i64, prereq: &Prerequisite) -> Row {
  vec![
    Value::Integer(course_id),
    txt(&prereq.course_string),
    txt(&prereq.course_title),
    Value::Integer(i64::from(prereq.logic_group)),
    flag(prereq.is_or),
    txt(&prereq.source_text),
  ]
}

// ─── Sections ────────────────────────────────────────────────────────────────

pub fn section_row(section: &CatalogSection, course_id: i64, index: &str, now: &str) -> Row {
  vec![
    Value::Integer(course_id),
    txt(index),
    text(&section.number),
    flag(section.open_status),
    text(&section.open_status_text),
    text(&section.section_course_type),
    text(&section.exam_code),
    text(&section.exam_code_text),
    text(&section.final_exam),
    text(&section.section_eligibility),
    text(&section.open_to_text),
    text(&section.cross_listed_section_type),
    text(&section.cross_listed_sections_text),
    text(&section.section_notes),
    text(&section.comments_text),
    owned(section.subtitle_trimmed()),
    text(&section.subtopic),
    text(&section.special_permission_add_code),
    text(&section.special_permission_add_code_description),
    text(&section.special_permission_drop_code),
    text(&section.special_permission_drop_code_description),
    text(&section.course_fee),
    text(&section.course_fee_descr),
    text(&section.campus_code),
    text(&section.printed),
    text(&section.session_date_print_indicator),
    text(&section.session_dates),
    txt(now),
    txt(now),
  ]
}

pub fn section_instructor_row(section_id: i64, instructor_id: i64) -> Row {
  vec![Value::Integer(section_id), Value::Integer(instructor_id)]
}

pub fn major_row(section_id: i64, major: &Major) -> Row {
  vec![
    Value::Integer(section_id),
    text(&major.code),
    flag(major.is_major_code),
    flag(major.is_unit_code),
  ]
}

/// Shared by section minors and honor programs.
pub fn code_only_row(section_id: i64, item: &CodeOnly) -> Row {
  vec![Value::Integer(section_id), text(&item.code)]
}

pub fn unit_major_row(section_id: i64, unit_major: &UnitMajor) -> Row {
  vec![
    Value::Integer(section_id),
    text(&unit_major.unit_code),
    text(&unit_major.major_code),
  ]
}

pub fn cross_listing_row(section_id: i64, xl: &CrossListing) -> Row {
  vec![
    Value::Integer(section_id),
    text(&xl.course_number),
    text(&xl.supplement_code),
    text(&xl.section_number),
    text(&xl.offering_unit_campus),
    text(&xl.offering_unit_code),
    text(&xl.subject_code),
    text(&xl.registration_index),
    text(&xl.primary_registration_index),
  ]
}

pub fn meeting_time_row(section_id: i64, mt: &MeetingTime) -> Row {
  vec![
    Value::Integer(section_id),
    text(&mt.meeting_day),
    text(&mt.start_time_military),
    text(&mt.end_time_military),
    text(&mt.start_time),
    text(&mt.end_time),
    text(&mt.pm_code),
    text(&mt.campus_location),
    text(&mt.campus_name),
    text(&mt.campus_abbrev),
    text(&mt.building_code),
    text(&mt.room_number),
    text(&mt.meeting_mode_code),
    text(&mt.meeting_mode_desc),
    text(&mt.ba_class_hours),
  ]
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use soc_core::table::Table;

  use super::*;
  use crate::registry::TableSpec;

  fn width(table: Table) -> usize { TableSpec::of(table).columns.len() }

  #[test]
  fn rows_match_registry_widths() {
    let course: CatalogCourse = serde_json::from_value(json!({
      "courseString": "01:198:111",
      "sections": [{ "index": "09214" }],
    }))
    .unwrap();
    let section = &course.sections[0];
    let lookups = LookupIds::default();

    assert_eq!(course_row(&course, "01:198:111", 1, &lookups, "now").len(), width(Table::Courses));
    assert_eq!(section_row(section, 1, "09214", "now").len(), width(Table::Sections));
    assert_eq!(school_row("01", &None).len(), width(Table::Schools));
    assert_eq!(subject_row("198", &SubjectInfo::default()).len(), width(Table::Subjects));
    assert_eq!(instructor_row("SMITH, J").len(), width(Table::Instructors));
    assert_eq!(
      code_description_row(1, &CodeDescription::default()).len(),
      width(Table::SectionComments)
    );
    assert_eq!(core_code_row(1, &CoreCode::default()).len(), width(Table::CourseCoreCodes));
    assert_eq!(major_row(1, &Major::default()).len(), width(Table::SectionMajors));
    assert_eq!(code_only_row(1, &CodeOnly::default()).len(), width(Table::SectionMinors));
    assert_eq!(unit_major_row(1, &UnitMajor::default()).len(), width(Table::SectionUnitMajors));
    assert_eq!(
      cross_listing_row(1, &CrossListing::default()).len(),
      width(Table::CrossListedSections)
    );
    assert_eq!(meeting_time_row(1, &MeetingTime::default()).len(), width(Table::MeetingTimes));
  }

  #[test]
  fn course_defaults() {
    let course: CatalogCourse = serde_json::from_value(json!({
      "courseString": "01:198:111",
      "expandedTitle": "  INTRO  ",
      "credits": "by arrangement",
    }))
    .unwrap();
    let row = course_row(&course, "01:198:111", 1, &LookupIds::default(), "now");

    // expanded_title, credits, school_id, open_sections
    assert_eq!(row[7], Value::Text("INTRO".into()));
    assert_eq!(row[9], Value::Null);
    assert_eq!(row[12], Value::Null);
    assert_eq!(row[16], Value::Integer(0));
  }

  #[test]
  fn timestamps_are_rfc3339() {
    let dt = DateTime::parse_from_rfc3339("2025-01-02T03:04:05Z").unwrap().with_timezone(&Utc);
    assert_eq!(encode_dt(dt), "2025-01-02T03:04:05+00:00");
  }
}
