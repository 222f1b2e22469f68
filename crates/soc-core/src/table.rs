//! Identifiers for every table the pipeline writes.
//!
//! Variants are declared in foreign-key dependency order: a table only ever
//! references tables declared before it. Writers rely on that order when
//! flushing everything at the end of a unit of work.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  EnumIter,
  IntoStaticStr,
  Serialize,
  Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Table {
  // Lookups, resolved once per run.
  Schools,
  Subjects,
  Instructors,
  // Course level.
  Courses,
  CourseCampusLocations,
  CourseCoreCodes,
  Prerequisites,
  // Section level.
  Sections,
  SectionInstructors,
  SectionComments,
  SectionCampusLocations,
  SectionMajors,
  SectionMinors,
  SectionUnitMajors,
  SectionHonorPrograms,
  CrossListedSections,
  MeetingTimes,
}

impl Table {
  /// SQL table name.
  pub fn name(self) -> &'static str { self.into() }

  /// Every table, in declaration (dependency) order.
  pub fn all() -> impl Iterator<Item = Table> { Table::iter() }
}

impl fmt::Display for Table {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

// ─── Row counts ──────────────────────────────────────────────────────────────

/// Rows written per table. Ordered by [`Table`] declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableCounts(BTreeMap<Table, usize>);

impl TableCounts {
  pub fn new() -> Self { Self::default() }

  pub fn add(&mut self, table: Table, rows: usize) {
    *self.0.entry(table).or_default() += rows;
  }

  pub fn get(&self, table: Table) -> usize {
    self.0.get(&table).copied().unwrap_or(0)
  }

  /// Fold another set of counts into this one.
  pub fn merge(&mut self, other: &TableCounts) {
    for (table, rows) in other.iter() {
      self.add(table, rows);
    }
  }

  pub fn total(&self) -> usize { self.0.values().sum() }

  pub fn iter(&self) -> impl Iterator<Item = (Table, usize)> + '_ {
    self.0.iter().map(|(t, n)| (*t, *n))
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn names_are_snake_case() {
    assert_eq!(Table::Courses.name(), "courses");
    assert_eq!(Table::CrossListedSections.name(), "cross_listed_sections");
    assert_eq!(Table::SectionUnitMajors.to_string(), "section_unit_majors");
  }

  #[test]
  fn declaration_order_is_dependency_order() {
    let order: Vec<Table> = Table::all().collect();
    let pos = |t: Table| order.iter().position(|x| *x == t).unwrap();

    assert!(pos(Table::Schools) < pos(Table::Courses));
    assert!(pos(Table::Instructors) < pos(Table::SectionInstructors));
    assert!(pos(Table::Courses) < pos(Table::Prerequisites));
    assert!(pos(Table::Courses) < pos(Table::Sections));
    assert!(pos(Table::Sections) < pos(Table::MeetingTimes));
    assert_eq!(order.len(), 17);
  }

  #[test]
  fn counts_merge_and_total() {
    let mut a = TableCounts::new();
    a.add(Table::Courses, 3);
    a.add(Table::Sections, 5);

    let mut b = TableCounts::new();
    b.add(Table::Courses, 2);
    b.add(Table::MeetingTimes, 7);

    a.merge(&b);
    assert_eq!(a.get(Table::Courses), 5);
    assert_eq!(a.get(Table::MeetingTimes), 7);
    assert_eq!(a.get(Table::Prerequisites), 0);
    assert_eq!(a.total(), 17);
  }
}
