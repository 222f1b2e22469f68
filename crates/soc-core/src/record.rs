//! Upstream catalog records.
//!
//! The schedule-of-classes API serves one JSON array of courses per
//! `(year, term, campus)`. Each course nests its sections, and each section
//! nests meeting times, instructors, comments and so on. Every field is
//! optional upstream; nested arrays may be missing or `null`, and a handful of
//! scalars are loosely typed, so decoding is lenient throughout.

use serde::Deserialize;

use crate::Result;

/// Decode a full catalog payload.
pub fn parse_catalog(raw: &[u8]) -> Result<Vec<CatalogCourse>> {
  Ok(serde_json::from_slice(raw)?)
}

// ─── Course ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CatalogCourse {
  /// Natural key, e.g. `01:198:111`.
  pub course_string:       Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub offering_unit_code:  Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub subject:             Option<String>,
  pub subject_description: Option<String>,
  pub subject_notes:       Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub course_number:       Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub supplement_code:     Option<String>,
  pub title:               Option<String>,
  pub expanded_title:      Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub level:               Option<String>,
  #[serde(deserialize_with = "lenient::number")]
  pub credits:             Option<f64>,
  pub credits_object:      Option<CodeDescription>,
  pub school:              Option<CodeDescription>,
  #[serde(deserialize_with = "lenient::text")]
  pub main_campus:         Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub campus_code:         Option<String>,
  #[serde(deserialize_with = "lenient::integer")]
  pub open_sections:       Option<i64>,
  pub synopsis_url:        Option<String>,
  pub course_description:  Option<String>,
  pub course_notes:        Option<String>,
  pub unit_notes:          Option<String>,
  pub pre_req_notes:       Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub course_fee:          Option<String>,
  pub course_fee_descr:    Option<String>,
  #[serde(deserialize_with = "lenient::list")]
  pub campus_locations:    Vec<CodeDescription>,
  #[serde(deserialize_with = "lenient::list")]
  pub core_codes:          Vec<CoreCode>,
  #[serde(deserialize_with = "lenient::list")]
  pub sections:            Vec<CatalogSection>,
}

impl CatalogCourse {
  /// The course natural key, if present and non-empty.
  pub fn natural_key(&self) -> Option<&str> { non_empty(&self.course_string) }

  pub fn school_code(&self) -> Option<&str> {
    self.school.as_ref().and_then(|s| non_empty(&s.code))
  }

  pub fn subject_code(&self) -> Option<&str> { non_empty(&self.subject) }

  pub fn expanded_title_trimmed(&self) -> Option<String> {
    non_empty(&self.expanded_title).map(|t| t.trim().to_owned())
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CodeDescription {
  #[serde(deserialize_with = "lenient::text")]
  pub code:        Option<String>,
  pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoreCode {
  #[serde(deserialize_with = "lenient::text")]
  pub core_code:             Option<String>,
  pub core_code_description: Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub effective:             Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub last_updated:          Option<String>,
}

// ─── Section ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CatalogSection {
  /// Registration index; unique only within the owning course.
  #[serde(deserialize_with = "lenient::text")]
  pub index:                                   Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub number:                                  Option<String>,
  #[serde(deserialize_with = "lenient::flag")]
  pub open_status:                             bool,
  pub open_status_text:                        Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub section_course_type:                     Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub exam_code:                               Option<String>,
  pub exam_code_text:                          Option<String>,
  pub final_exam:                              Option<String>,
  pub section_eligibility:                     Option<String>,
  pub open_to_text:                            Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub cross_listed_section_type:               Option<String>,
  pub cross_listed_sections_text:              Option<String>,
  pub section_notes:                           Option<String>,
  pub comments_text:                           Option<String>,
  pub subtitle:                                Option<String>,
  pub subtopic:                                Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub special_permission_add_code:             Option<String>,
  pub special_permission_add_code_description: Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub special_permission_drop_code:            Option<String>,
  pub special_permission_drop_code_description: Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub course_fee:                              Option<String>,
  pub course_fee_descr:                        Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub campus_code:                             Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub printed:                                 Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub session_date_print_indicator:            Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub session_dates:                           Option<String>,
  #[serde(deserialize_with = "lenient::list")]
  pub instructors:                             Vec<InstructorRef>,
  #[serde(deserialize_with = "lenient::list")]
  pub comments:                                Vec<CodeDescription>,
  #[serde(deserialize_with = "lenient::list")]
  pub section_campus_locations:                Vec<CodeDescription>,
  #[serde(deserialize_with = "lenient::list")]
  pub majors:                                  Vec<Major>,
  #[serde(deserialize_with = "lenient::list")]
  pub minors:                                  Vec<CodeOnly>,
  #[serde(deserialize_with = "lenient::list")]
  pub unit_majors:                             Vec<UnitMajor>,
  #[serde(deserialize_with = "lenient::list")]
  pub honor_programs:                          Vec<CodeOnly>,
  #[serde(deserialize_with = "lenient::list")]
  pub cross_listed_sections:                   Vec<CrossListing>,
  #[serde(deserialize_with = "lenient::list")]
  pub meeting_times:                           Vec<MeetingTime>,
}

impl CatalogSection {
  /// The section index, if present and non-empty.
  pub fn natural_key(&self) -> Option<&str> { non_empty(&self.index) }

  pub fn subtitle_trimmed(&self) -> Option<String> {
    non_empty(&self.subtitle).map(|t| t.trim().to_owned())
  }

  /// Non-empty instructor names, in listing order.
  pub fn instructor_names(&self) -> impl Iterator<Item = &str> {
    self.instructors.iter().filter_map(|i| non_empty(&i.name))
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InstructorRef {
  pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CodeOnly {
  #[serde(deserialize_with = "lenient::text")]
  pub code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Major {
  #[serde(deserialize_with = "lenient::text")]
  pub code:          Option<String>,
  #[serde(deserialize_with = "lenient::flag")]
  pub is_major_code: bool,
  #[serde(deserialize_with = "lenient::flag")]
  pub is_unit_code:  bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UnitMajor {
  #[serde(deserialize_with = "lenient::text")]
  pub unit_code:  Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub major_code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CrossListing {
  #[serde(deserialize_with = "lenient::text")]
  pub course_number:              Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub supplement_code:            Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub section_number:             Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub offering_unit_campus:       Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub offering_unit_code:         Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub subject_code:               Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub registration_index:         Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub primary_registration_index: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MeetingTime {
  #[serde(deserialize_with = "lenient::text")]
  pub meeting_day:         Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub start_time_military: Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub end_time_military:   Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub start_time:          Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub end_time:            Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub pm_code:             Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub campus_location:     Option<String>,
  pub campus_name:         Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub campus_abbrev:       Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub building_code:       Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub room_number:         Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub meeting_mode_code:   Option<String>,
  pub meeting_mode_desc:   Option<String>,
  #[serde(deserialize_with = "lenient::text")]
  pub ba_class_hours:      Option<String>,
}

fn non_empty(s: &Option<String>) -> Option<&str> {
  s.as_deref().filter(|s| !s.is_empty())
}

// ─── Lenient scalar decoding ─────────────────────────────────────────────────

mod lenient {
  use serde::{Deserialize, Deserializer};
  use serde_json::Value;

  /// Strings pass through; numbers and booleans are rendered as text.
  pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
      Some(Value::String(s)) => Some(s),
      Some(Value::Number(n)) => Some(n.to_string()),
      Some(Value::Bool(b)) => Some(b.to_string()),
      _ => None,
    })
  }

  /// Numeric values only; anything else is treated as absent.
  pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
      Some(Value::Number(n)) => n.as_f64(),
      _ => None,
    })
  }

  pub fn integer<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
      Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
      Some(Value::String(s)) => s.trim().parse().ok(),
      _ => None,
    })
  }

  /// Truthiness: `true`, non-zero numbers and non-empty strings.
  pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
      Some(Value::Bool(b)) => b,
      Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
      Some(Value::String(s)) => !s.is_empty(),
      Some(Value::Array(a)) => !a.is_empty(),
      Some(Value::Object(o)) => !o.is_empty(),
      Some(Value::Null) | None => false,
    })
  }

  /// A missing or `null` array decodes as empty.
  pub fn list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
  where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
  {
    Ok(Option::<Vec<T>>::deserialize(d)?.unwrap_or_default())
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn course(value: serde_json::Value) -> CatalogCourse {
    serde_json::from_value(value).expect("course decodes")
  }

  #[test]
  fn decodes_nested_course() {
    let c = course(json!({
      "courseString": "01:198:111",
      "title": "INTRO COMPUTER SCI",
      "expandedTitle": "  INTRODUCTION TO COMPUTER SCIENCE   ",
      "credits": 4,
      "school": { "code": "01", "description": "School of Arts and Sciences" },
      "subject": "198",
      "openSections": 3,
      "sections": [{
        "index": "09214",
        "number": "01",
        "openStatus": true,
        "instructors": [{ "name": "DOE, JANE" }, { "name": "" }],
        "meetingTimes": [{ "meetingDay": "M", "roomNumber": 120 }]
      }]
    }));

    assert_eq!(c.natural_key(), Some("01:198:111"));
    assert_eq!(c.credits, Some(4.0));
    assert_eq!(c.school_code(), Some("01"));
    assert_eq!(c.open_sections, Some(3));
    assert_eq!(
      c.expanded_title_trimmed().as_deref(),
      Some("INTRODUCTION TO COMPUTER SCIENCE")
    );

    let s = &c.sections[0];
    assert_eq!(s.natural_key(), Some("09214"));
    assert!(s.open_status);
    assert_eq!(s.instructor_names().collect::<Vec<_>>(), vec!["DOE, JANE"]);
    assert_eq!(s.meeting_times[0].room_number.as_deref(), Some("120"));
  }

  #[test]
  fn null_and_missing_arrays_are_empty() {
    let c = course(json!({
      "courseString": "01:640:151",
      "coreCodes": null,
      "sections": [{ "index": "1", "majors": null }]
    }));
    assert!(c.core_codes.is_empty());
    assert!(c.campus_locations.is_empty());
    assert!(c.sections[0].majors.is_empty());
    assert!(c.sections[0].meeting_times.is_empty());
  }

  #[test]
  fn non_numeric_credits_are_absent() {
    let c = course(json!({ "courseString": "x", "credits": "BA" }));
    assert_eq!(c.credits, None);
  }

  #[test]
  fn empty_keys_are_not_natural_keys() {
    let c = course(json!({ "courseString": "", "subject": "", "school": { "code": "" } }));
    assert_eq!(c.natural_key(), None);
    assert_eq!(c.subject_code(), None);
    assert_eq!(c.school_code(), None);
  }

  #[test]
  fn parses_catalog_array() {
    let raw = br#"[{"courseString":"a"},{"courseString":"b","sections":null}]"#;
    let courses = parse_catalog(raw).unwrap();
    assert_eq!(courses.len(), 2);
    assert!(parse_catalog(b"{\"not\":\"an array\"}").is_err());
  }
}
