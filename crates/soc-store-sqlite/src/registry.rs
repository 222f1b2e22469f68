//! Typed table registry.
//!
//! Each [`Table`] maps to a [`TableSpec`]: its columns, its conflict policy and
//! the natural-key columns a flush returns alongside generated ids. The bulk
//! writer renders SQL from these specs; nothing else in the crate spells out
//! an insert statement for a pipeline table.

use soc_core::table::Table;

/// SQLite's default bound-parameter limit per statement.
pub const MAX_BIND_PARAMS: usize = 32_766;

/// How an upsert refreshes one column of an existing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
  /// `col = excluded.col`
  Replace(&'static str),
  /// `col = COALESCE(excluded.col, <table>.col)`
  KeepIfNull(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
  /// Plain insert; the table has no uniqueness constraint.
  Insert,
  /// `ON CONFLICT (target) DO NOTHING`
  Ignore { target: &'static [&'static str] },
  /// `ON CONFLICT (target) DO UPDATE SET ...`
  Upsert {
    target:  &'static [&'static str],
    refresh: &'static [Refresh],
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
  pub table:     Table,
  pub columns:   &'static [&'static str],
  pub conflict:  Conflict,
  /// Natural-key columns returned with each generated `id`. Empty when the
  /// table's flush returns nothing.
  pub returning: &'static [&'static str],
}

impl TableSpec {
  pub fn of(table: Table) -> &'static TableSpec {
    match table {
      Table::Schools => &SCHOOLS,
      Table::Subjects => &SUBJECTS,
      Table::Instructors => &INSTRUCTORS,
      Table::Courses => &COURSES,
      Table::CourseCampusLocations => &COURSE_CAMPUS_LOCATIONS,
      Table::CourseCoreCodes => &COURSE_CORE_CODES,
      Table::Prerequisites => &PREREQUISITES,
      Table::Sections => &SECTIONS,
      Table::SectionInstructors => &SECTION_INSTRUCTORS,
      Table::SectionComments => &SECTION_COMMENTS,
      Table::SectionCampusLocations => &SECTION_CAMPUS_LOCATIONS,
      Table::SectionMajors => &SECTION_MAJORS,
      Table::SectionMinors => &SECTION_MINORS,
      Table::SectionUnitMajors => &SECTION_UNIT_MAJORS,
      Table::SectionHonorPrograms => &SECTION_HONOR_PROGRAMS,
      Table::CrossListedSections => &CROSS_LISTED_SECTIONS,
      Table::MeetingTimes => &MEETING_TIMES,
    }
  }

  pub fn returns_keys(&self) -> bool { !self.returning.is_empty() }

  /// Largest row count that still fits in one statement.
  pub fn max_rows_per_statement(&self) -> usize {
    (MAX_BIND_PARAMS / self.columns.len()).max(1)
  }

  /// Render a single multi-row insert for `rows` rows.
  pub fn insert_sql(&self, rows: usize) -> String {
    let name = self.table.name();
    let placeholders = format!("({})", vec!["?"; self.columns.len()].join(", "));

    let mut sql = format!(
      "INSERT INTO {name} ({}) VALUES {}",
      self.columns.join(", "),
      vec![placeholders.as_str(); rows.max(1)].join(", "),
    );

    match self.conflict {
      Conflict::Insert => {}
      Conflict::Ignore { target } => {
        sql.push_str(&format!(" ON CONFLICT ({}) DO NOTHING", target.join(", ")));
      }
      Conflict::Upsert { target, refresh } => {
        let sets: Vec<String> = refresh
          .iter()
          .map(|r| match r {
            Refresh::Replace(col) => format!("{col} = excluded.{col}"),
            Refresh::KeepIfNull(col) => format!("{col} = COALESCE(excluded.{col}, {name}.{col})"),
          })
          .collect();
        sql.push_str(&format!(
          " ON CONFLICT ({}) DO UPDATE SET {}",
          target.join(", "),
          sets.join(", "),
        ));
      }
    }

    if self.returns_keys() {
      sql.push_str(&format!(" RETURNING id, {}", self.returning.join(", ")));
    }

    sql
  }
}

// ─── Lookups ─────────────────────────────────────────────────────────────────

static SCHOOLS: TableSpec = TableSpec {
  table:     Table::Schools,
  columns:   &["code", "description"],
  conflict:  Conflict::Upsert {
    target:  &["code"],
    refresh: &[Refresh::Replace("description")],
  },
  returning: &["code"],
};

static SUBJECTS: TableSpec = TableSpec {
  table:     Table::Subjects,
  columns:   &["code", "description", "notes"],
  conflict:  Conflict::Upsert {
    target:  &["code"],
    refresh: &[Refresh::Replace("description"), Refresh::KeepIfNull("notes")],
  },
  returning: &["code"],
};

// Instructors carry no mutable fields; ids are read back after the insert.
static INSTRUCTORS: TableSpec = TableSpec {
  table:     Table::Instructors,
  columns:   &["name"],
  conflict:  Conflict::Ignore { target: &["name"] },
  returning: &[],
};

// ─── Courses ─────────────────────────────────────────────────────────────────

static COURSES: TableSpec = TableSpec {
  table:     Table::Courses,
  columns:   &[
    "term_id",
    "course_string",
    "offering_unit_code",
    "subject_code",
    "course_number",
    "supplement_code",
    "title",
    "expanded_title",
    "level",
    "credits",
    "credits_code",
    "credits_description",
    "school_id",
    "subject_id",
    "main_campus",
    "campus_code",
    "open_sections",
    "synopsis_url",
    "course_description",
    "course_notes",
    "unit_notes",
    "prereq_notes",
    "course_fee",
    "course_fee_description",
    "created_at",
    "updated_at",
  ],
  conflict:  Conflict::Upsert {
    target:  &["term_id", "course_string"],
    refresh: &[Refresh::Replace("open_sections"), Refresh::Replace("updated_at")],
  },
  returning: &["course_string"],
};

static COURSE_CAMPUS_LOCATIONS: TableSpec = TableSpec {
  table:     Table::CourseCampusLocations,
  columns:   &["course_id", "code", "description"],
  conflict:  Conflict::Insert,
  returning: &[],
};

static COURSE_CORE_CODES: TableSpec = TableSpec {
  table:     Table::CourseCoreCodes,
  columns:   &[
    "course_id",
    "core_code",
    "core_code_description",
    "effective",
    "last_updated",
  ],
  conflict:  Conflict::Insert,
  returning: &[],
};

static PREREQUISITES: TableSpec = TableSpec {
  table:     Table::Prerequisites,
  columns:   &[
    "course_id",
    "required_course_string",
    "required_course_title",
    "logic_group",
    "is_or",
    "source_text",
  ],
  conflict:  Conflict::Insert,
  returning: &[],
};

// ─── Sections ────────────────────────────────────────────────────────────────

// Returns the full (course_id, index_number) pair: index numbers are unique
// only within a course.
static SECTIONS: TableSpec = TableSpec {
  table:     Table::Sections,
  columns:   &[
    "course_id",
    "index_number",
    "section_number",
    "open_status",
    "open_status_text",
    "section_course_type",
    "exam_code",
    "exam_code_text",
    "final_exam",
    "section_eligibility",
    "open_to_text",
    "cross_listed_section_type",
    "cross_listed_sections_text",
    "section_notes",
    "comments_text",
    "subtitle",
    "subtopic",
    "special_permission_add_code",
    "special_permission_add_description",
    "special_permission_drop_code",
    "special_permission_drop_description",
    "course_fee",
    "course_fee_description",
    "campus_code",
    "printed",
    "session_date_print_indicator",
    "session_dates",
    "created_at",
    "updated_at",
  ],
  conflict:  Conflict::Upsert {
    target:  &["course_id", "index_number"],
    refresh: &[
      Refresh::Replace("open_status"),
      Refresh::Replace("open_status_text"),
      Refresh::Replace("session_dates"),
      Refresh::Replace("updated_at"),
    ],
  },
  returning: &["course_id", "index_number"],
};

static SECTION_INSTRUCTORS: TableSpec = TableSpec {
  table:     Table::SectionInstructors,
  columns:   &["section_id", "instructor_id"],
  conflict:  Conflict::Insert,
  returning: &[],
};

static SECTION_COMMENTS: TableSpec = TableSpec {
  table:     Table::SectionComments,
  columns:   &["section_id", "code", "description"],
  conflict:  Conflict::Insert,
  returning: &[],
};

static SECTION_CAMPUS_LOCATIONS: TableSpec = TableSpec {
  table:     Table::SectionCampusLocations,
  columns:   &["section_id", "code", "description"],
  conflict:  Conflict::Insert,
  returning: &[],
};

static SECTION_MAJORS: TableSpec = TableSpec {
  table:     Table::SectionMajors,
  columns:   &["section_id", "code", "is_major_code", "is_unit_code"],
  conflict:  Conflict::Insert,
  returning: &[],
};

static SECTION_MINORS: TableSpec = TableSpec {
  table:     Table::SectionMinors,
  columns:   &["section_id", "code"],
  conflict:  Conflict::Insert,
  returning: &[],
};

static SECTION_UNIT_MAJORS: TableSpec = TableSpec {
  table:     Table::SectionUnitMajors,
  columns:   &["section_id", "unit_code", "major_code"],
  conflict:  Conflict::Insert,
  returning: &[],
};

static SECTION_HONOR_PROGRAMS: TableSpec = TableSpec {
  table:     Table::SectionHonorPrograms,
  columns:   &["section_id", "code"],
  conflict:  Conflict::Insert,
  returning: &[],
};

static CROSS_LISTED_SECTIONS: TableSpec = TableSpec {
  table:     Table::CrossListedSections,
  columns:   &[
    "section_id",
    "course_number",
    "supplement_code",
    "section_number",
    "offering_unit_campus",
    "offering_unit_code",
    "subject_code",
    "registration_index",
    "primary_registration_index",
  ],
  conflict:  Conflict::Insert,
  returning: &[],
};

static MEETING_TIMES: TableSpec = TableSpec {
  table:     Table::MeetingTimes,
  columns:   &[
    "section_id",
    "meeting_day",
    "start_time_military",
    "end_time_military",
    "start_time",
    "end_time",
    "pm_code",
    "campus_location",
    "campus_name",
    "campus_abbrev",
    "building_code",
    "room_number",
    "meeting_mode_code",
    "meeting_mode_desc",
    "ba_class_hours",
  ],
  conflict:  Conflict::Insert,
  returning: &[],
};

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_table_has_a_matching_spec() {
    for table in Table::all() {
      let spec = TableSpec::of(table);
      assert_eq!(spec.table, table);
      assert!(!spec.columns.is_empty());
    }
  }

  #[test]
  fn plain_insert_sql() {
    let sql = TableSpec::of(Table::SectionMinors).insert_sql(2);
    assert_eq!(
      sql,
      "INSERT INTO section_minors (section_id, code) VALUES (?, ?), (?, ?)"
    );
  }

  #[test]
  fn upsert_sql_refreshes_and_returns() {
    let sql = TableSpec::of(Table::Subjects).insert_sql(1);
    assert_eq!(
      sql,
      "INSERT INTO subjects (code, description, notes) VALUES (?, ?, ?) \
       ON CONFLICT (code) DO UPDATE SET description = excluded.description, \
       notes = COALESCE(excluded.notes, subjects.notes) RETURNING id, code"
    );
  }

  #[test]
  fn section_flush_returns_composite_key() {
    let sql = TableSpec::of(Table::Sections).insert_sql(1);
    assert!(sql.contains("ON CONFLICT (course_id, index_number) DO UPDATE SET"));
    assert!(sql.ends_with("RETURNING id, course_id, index_number"));
  }

  #[test]
  fn ignore_sql() {
    let sql = TableSpec::of(Table::Instructors).insert_sql(1);
    assert_eq!(
      sql,
      "INSERT INTO instructors (name) VALUES (?) ON CONFLICT (name) DO NOTHING"
    );
  }

  #[test]
  fn statement_size_respects_parameter_limit() {
    let courses = TableSpec::of(Table::Courses);
    assert!(courses.max_rows_per_statement() * courses.columns.len() <= MAX_BIND_PARAMS);
  }
}
