//! Lookup entities: schools, subjects and instructors.
//!
//! They are small reference tables that courses and sections point at, so a
//! run resolves all of them once, before any dependent row is written.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::record::CatalogCourse;

/// Description and notes carried by a subject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectInfo {
  pub description: Option<String>,
  pub notes:       Option<String>,
}

/// Distinct lookup values found in a batch. When several records disagree on
/// a code, the last one seen wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupSet {
  pub schools:     BTreeMap<String, Option<String>>,
  pub subjects:    BTreeMap<String, SubjectInfo>,
  pub instructors: BTreeSet<String>,
}

impl LookupSet {
  /// Scan the whole batch once.
  pub fn collect(courses: &[CatalogCourse]) -> Self {
    let mut set = Self::default();

    for course in courses {
      if let Some(code) = course.school_code() {
        let description = course.school.as_ref().and_then(|s| s.description.clone());
        set.schools.insert(code.to_owned(), description);
      }

      if let Some(code) = course.subject_code() {
        set.subjects.insert(code.to_owned(), SubjectInfo {
          description: course.subject_description.clone(),
          notes:       course.subject_notes.clone(),
        });
      }

      for section in &course.sections {
        set.instructors.extend(section.instructor_names().map(str::to_owned));
      }
    }

    set
  }

  pub fn is_empty(&self) -> bool {
    self.schools.is_empty() && self.subjects.is_empty() && self.instructors.is_empty()
  }
}

/// Natural key → surrogate id maps handed read-only to every worker.
#[derive(Debug, Clone, Default)]
pub struct LookupIds {
  pub schools:     HashMap<String, i64>,
  pub subjects:    HashMap<String, i64>,
  pub instructors: HashMap<String, i64>,
}

impl LookupIds {
  pub fn school(&self, code: Option<&str>) -> Option<i64> {
    code.and_then(|c| self.schools.get(c).copied())
  }

  pub fn subject(&self, code: Option<&str>) -> Option<i64> {
    code.and_then(|c| self.subjects.get(c).copied())
  }

  pub fn instructor(&self, name: &str) -> Option<i64> {
    self.instructors.get(name).copied()
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn batch(value: serde_json::Value) -> Vec<CatalogCourse> {
    serde_json::from_value(value).unwrap()
  }

  #[test]
  fn collects_distinct_values() {
    let courses = batch(json!([
      {
        "courseString": "01:198:111",
        "school": { "code": "01", "description": "SAS" },
        "subject": "198",
        "subjectDescription": "Computer Science",
        "sections": [
          { "index": "1", "instructors": [{ "name": "DOE, JANE" }, { "name": "ROE, RICH" }] },
          { "index": "2", "instructors": [{ "name": "DOE, JANE" }] }
        ]
      },
      {
        "courseString": "01:640:151",
        "school": { "code": "01", "description": "SAS" },
        "subject": "640",
        "sections": [{ "index": "3", "instructors": null }]
      }
    ]));

    let set = LookupSet::collect(&courses);
    assert_eq!(set.schools.len(), 1);
    assert_eq!(set.subjects.len(), 2);
    assert_eq!(
      set.instructors.iter().cloned().collect::<Vec<_>>(),
      vec!["DOE, JANE".to_string(), "ROE, RICH".to_string()]
    );
  }

  #[test]
  fn last_seen_wins() {
    let courses = batch(json!([
      { "school": { "code": "01", "description": "old" }, "subject": "198", "subjectDescription": "Old" },
      { "school": { "code": "01", "description": "new" }, "subject": "198", "subjectDescription": "New", "subjectNotes": "n" }
    ]));

    let set = LookupSet::collect(&courses);
    assert_eq!(set.schools["01"].as_deref(), Some("new"));
    assert_eq!(set.subjects["198"], SubjectInfo {
      description: Some("New".into()),
      notes:       Some("n".into()),
    });
  }

  #[test]
  fn empty_codes_and_names_are_ignored() {
    let courses = batch(json!([
      { "school": { "code": "" }, "subject": "", "sections": [{ "instructors": [{ "name": "" }, {}] }] }
    ]));
    assert!(LookupSet::collect(&courses).is_empty());
  }
}
