//! SQL schema for the catalog store.
//!
//! Executed once when the store is opened. There are no migrations; the DDL
//! is idempotent thanks to `CREATE TABLE IF NOT EXISTS`.

use std::time::Duration;

use rusqlite::Connection;

/// Full schema DDL.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS terms (
    id          INTEGER PRIMARY KEY,
    year        INTEGER NOT NULL,
    term        TEXT NOT NULL,      -- '0' winter | '1' spring | '7' summer | '9' fall
    campus      TEXT NOT NULL,
    fetched_at  TEXT NOT NULL,
    UNIQUE (year, term, campus)
);

-- Lookups. Resolved once per run, before any course or section.
CREATE TABLE IF NOT EXISTS schools (
    id          INTEGER PRIMARY KEY,
    code        TEXT NOT NULL UNIQUE,
    description TEXT
);

CREATE TABLE IF NOT EXISTS subjects (
    id          INTEGER PRIMARY KEY,
    code        TEXT NOT NULL UNIQUE,
    description TEXT,
    notes       TEXT
);

CREATE TABLE IF NOT EXISTS instructors (
    id          INTEGER PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE
);

-- Upserted by (term_id, course_string).
CREATE TABLE IF NOT EXISTS courses (
    id                     INTEGER PRIMARY KEY,
    term_id                INTEGER NOT NULL REFERENCES terms(id) ON DELETE CASCADE,
    course_string          TEXT NOT NULL,
    offering_unit_code     TEXT,
    subject_code           TEXT,
    course_number          TEXT,
    supplement_code        TEXT,
    title                  TEXT,
    expanded_title         TEXT,
    level                  TEXT,
    credits                REAL,
    credits_code           TEXT,
    credits_description    TEXT,
    school_id              INTEGER REFERENCES schools(id),
    subject_id             INTEGER REFERENCES subjects(id),
    main_campus            TEXT,
    campus_code            TEXT,
    open_sections          INTEGER NOT NULL DEFAULT 0,
    synopsis_url           TEXT,
    course_description     TEXT,
    course_notes           TEXT,
    unit_notes             TEXT,
    prereq_notes           TEXT,
    course_fee             TEXT,
    course_fee_description TEXT,
    created_at             TEXT NOT NULL,
    updated_at             TEXT NOT NULL,
    UNIQUE (term_id, course_string)
);

-- Course children are insert-only.
CREATE TABLE IF NOT EXISTS course_campus_locations (
    id          INTEGER PRIMARY KEY,
    course_id   INTEGER NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
    code        TEXT,
    description TEXT
);

CREATE TABLE IF NOT EXISTS course_core_codes (
    id                    INTEGER PRIMARY KEY,
    course_id             INTEGER NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
    core_code             TEXT,
    core_code_description TEXT,
    effective             TEXT,
    last_updated          TEXT
);

CREATE TABLE IF NOT EXISTS prerequisites (
    id                     INTEGER PRIMARY KEY,
    course_id              INTEGER NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
    required_course_string TEXT NOT NULL,
    required_course_title  TEXT,
    logic_group            INTEGER NOT NULL,
    is_or                  INTEGER NOT NULL,
    source_text            TEXT
);

-- Upserted by (course_id, index_number). Index numbers repeat across courses.
CREATE TABLE IF NOT EXISTS sections (
    id                                 INTEGER PRIMARY KEY,
    course_id                          INTEGER NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
    index_number                       TEXT NOT NULL,
    section_number                     TEXT,
    open_status                        INTEGER NOT NULL,
    open_status_text                   TEXT,
    section_course_type                TEXT,
    exam_code                          TEXT,
    exam_code_text                     TEXT,
    final_exam                         TEXT,
    section_eligibility                TEXT,
    open_to_text                       TEXT,
    cross_listed_section_type          TEXT,
    cross_listed_sections_text         TEXT,
    section_notes                      TEXT,
    comments_text                      TEXT,
    subtitle                           TEXT,
    subtopic                           TEXT,
    special_permission_add_code        TEXT,
    special_permission_add_description TEXT,
    special_permission_drop_code       TEXT,
    special_permission_drop_description TEXT,
    course_fee                         TEXT,
    course_fee_description             TEXT,
    campus_code                        TEXT,
    printed                            TEXT,
    session_date_print_indicator       TEXT,
    session_dates                      TEXT,
    created_at                         TEXT NOT NULL,
    updated_at                         TEXT NOT NULL,
    UNIQUE (course_id, index_number)
);

-- Section children are insert-only.
CREATE TABLE IF NOT EXISTS section_instructors (
    id            INTEGER PRIMARY KEY,
    section_id    INTEGER NOT NULL REFERENCES sections(id) ON DELETE CASCADE,
    instructor_id INTEGER NOT NULL REFERENCES instructors(id)
);

CREATE TABLE IF NOT EXISTS section_comments (
    id          INTEGER PRIMARY KEY,
    section_id  INTEGER NOT NULL REFERENCES sections(id) ON DELETE CASCADE,
    code        TEXT,
    description TEXT
);

CREATE TABLE IF NOT EXISTS section_campus_locations (
    id          INTEGER PRIMARY KEY,
    section_id  INTEGER NOT NULL REFERENCES sections(id) ON DELETE CASCADE,
    code        TEXT,
    description TEXT
);

CREATE TABLE IF NOT EXISTS section_majors (
    id            INTEGER PRIMARY KEY,
    section_id    INTEGER NOT NULL REFERENCES sections(id) ON DELETE CASCADE,
    code          TEXT,
    is_major_code INTEGER NOT NULL DEFAULT 0,
    is_unit_code  INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS section_minors (
    id          INTEGER PRIMARY KEY,
    section_id  INTEGER NOT NULL REFERENCES sections(id) ON DELETE CASCADE,
    code        TEXT
);

CREATE TABLE IF NOT EXISTS section_unit_majors (
    id          INTEGER PRIMARY KEY,
    section_id  INTEGER NOT NULL REFERENCES sections(id) ON DELETE CASCADE,
    unit_code   TEXT,
    major_code  TEXT
);

CREATE TABLE IF NOT EXISTS section_honor_programs (
    id          INTEGER PRIMARY KEY,
    section_id  INTEGER NOT NULL REFERENCES sections(id) ON DELETE CASCADE,
    code        TEXT
);

CREATE TABLE IF NOT EXISTS cross_listed_sections (
    id                         INTEGER PRIMARY KEY,
    section_id                 INTEGER NOT NULL REFERENCES sections(id) ON DELETE CASCADE,
    course_number              TEXT,
    supplement_code            TEXT,
    section_number             TEXT,
    offering_unit_campus       TEXT,
    offering_unit_code         TEXT,
    subject_code               TEXT,
    registration_index         TEXT,
    primary_registration_index TEXT
);

CREATE TABLE IF NOT EXISTS meeting_times (
    id                  INTEGER PRIMARY KEY,
    section_id          INTEGER NOT NULL REFERENCES sections(id) ON DELETE CASCADE,
    meeting_day         TEXT,
    start_time_military TEXT,
    end_time_military   TEXT,
    start_time          TEXT,
    end_time            TEXT,
    pm_code             TEXT,
    campus_location     TEXT,
    campus_name         TEXT,
    campus_abbrev       TEXT,
    building_code       TEXT,
    room_number         TEXT,
    meeting_mode_code   TEXT,
    meeting_mode_desc   TEXT,
    ba_class_hours      TEXT
);

CREATE INDEX IF NOT EXISTS courses_term_idx                  ON courses(term_id);
CREATE INDEX IF NOT EXISTS course_campus_locations_course_idx ON course_campus_locations(course_id);
CREATE INDEX IF NOT EXISTS course_core_codes_course_idx       ON course_core_codes(course_id);
CREATE INDEX IF NOT EXISTS prerequisites_course_idx           ON prerequisites(course_id);
CREATE INDEX IF NOT EXISTS sections_course_idx                ON sections(course_id);
CREATE INDEX IF NOT EXISTS section_instructors_section_idx    ON section_instructors(section_id);
CREATE INDEX IF NOT EXISTS section_comments_section_idx       ON section_comments(section_id);
CREATE INDEX IF NOT EXISTS section_campus_locations_section_idx ON section_campus_locations(section_id);
CREATE INDEX IF NOT EXISTS section_majors_section_idx         ON section_majors(section_id);
CREATE INDEX IF NOT EXISTS section_minors_section_idx         ON section_minors(section_id);
CREATE INDEX IF NOT EXISTS section_unit_majors_section_idx    ON section_unit_majors(section_id);
CREATE INDEX IF NOT EXISTS section_honor_programs_section_idx ON section_honor_programs(section_id);
CREATE INDEX IF NOT EXISTS cross_listed_sections_section_idx  ON cross_listed_sections(section_id);
CREATE INDEX IF NOT EXISTS meeting_times_section_idx          ON meeting_times(section_id);

PRAGMA user_version = 1;
";

/// Per-connection settings: foreign-key enforcement and the busy timeout are
/// not persisted in the database file.
pub fn configure_connection(conn: &Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
  conn.busy_timeout(busy_timeout)?;
  conn.pragma_update(None, "foreign_keys", "ON")?;
  Ok(())
}
