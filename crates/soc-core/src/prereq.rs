//! Prerequisite text parser.
//!
//! Upstream prerequisite notes are a small markup dialect:
//!
//! ```text
//! (01:640:151 CALCULUS I )<em> OR </em>(01:750:203 PHYSICS I )
//! ```
//!
//! Pipeline:
//!   raw &str
//!     └─ split on `<em> OR </em>` / `<em> AND </em>` markers → segments
//!          └─ find every `(code title)` in a segment         → clauses
//!
//! An OR marker opens a new logic group; an AND marker keeps the current one.
//! Segments with no recognisable course contribute nothing.

use std::{borrow::Cow, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Longest stored excerpt of the segment a clause came from, in characters.
pub const SOURCE_EXCERPT_CHARS: usize = 200;

static MARKER: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)<em>\s*(OR|AND)\s*</em>").expect("valid marker pattern")
});

static COURSE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"\((\d{2}:\d{3}:\d{3})\s+([^)]+)\)").expect("valid course pattern")
});

/// One required course within a prerequisite expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prerequisite {
  /// Natural key of the required course, e.g. `01:640:151`.
  pub course_string: String,
  pub course_title:  String,
  /// Zero-based disjunct this clause belongs to.
  pub logic_group:   u32,
  /// Whether the clause was introduced by an OR marker.
  pub is_or:         bool,
  pub source_text:   String,
}

#[derive(Clone, Copy)]
enum Marker {
  Or,
  And,
}

/// Parse prerequisite notes into ordered clauses. Never fails.
pub fn parse_prerequisites(notes: &str) -> Vec<Prerequisite> {
  if notes.trim().is_empty() {
    return Vec::new();
  }

  let mut clauses = Vec::new();
  let mut logic_group = 0u32;
  let mut is_or = false;
  let mut rest_start = 0usize;

  for caps in MARKER.captures_iter(notes) {
    let (Some(whole), Some(word)) = (caps.get(0), caps.get(1)) else {
      continue;
    };

    collect_segment(&notes[rest_start..whole.start()], logic_group, is_or, &mut clauses);
    rest_start = whole.end();

    match marker(word.as_str()) {
      Marker::Or => {
        logic_group += 1;
        is_or = true;
      }
      Marker::And => is_or = false,
    }
  }
  collect_segment(&notes[rest_start..], logic_group, is_or, &mut clauses);

  clauses
}

fn marker(word: &str) -> Marker {
  if word.eq_ignore_ascii_case("OR") { Marker::Or } else { Marker::And }
}

fn collect_segment(segment: &str, logic_group: u32, is_or: bool, out: &mut Vec<Prerequisite>) {
  let segment = segment.trim();
  if segment.is_empty() {
    return;
  }

  let excerpt: String = segment.chars().take(SOURCE_EXCERPT_CHARS).collect();

  for caps in COURSE.captures_iter(segment) {
    let (Some(code), Some(title)) = (caps.get(1), caps.get(2)) else {
      continue;
    };
    out.push(Prerequisite {
      course_string: code.as_str().to_owned(),
      course_title: unescape_markup(title.as_str().trim()).into_owned(),
      logic_group,
      is_or,
      source_text: excerpt.clone(),
    });
  }
}

/// Decode character entities; text with unknown entities is kept verbatim.
fn unescape_markup(s: &str) -> Cow<'_, str> {
  quick_xml::escape::unescape(s).unwrap_or(Cow::Borrowed(s))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_and_blank_yield_nothing() {
    assert!(parse_prerequisites("").is_empty());
    assert!(parse_prerequisites("   \n\t").is_empty());
  }

  #[test]
  fn or_opens_a_new_group() {
    let clauses = parse_prerequisites(
      "(01:640:151 CALCULUS I )<em> OR </em>(01:750:203 PHYSICS I )",
    );
    assert_eq!(clauses.len(), 2);

    assert_eq!(clauses[0].course_string, "01:640:151");
    assert_eq!(clauses[0].course_title, "CALCULUS I");
    assert_eq!(clauses[0].logic_group, 0);
    assert!(!clauses[0].is_or);

    assert_eq!(clauses[1].course_string, "01:750:203");
    assert_eq!(clauses[1].logic_group, 1);
    assert!(clauses[1].is_or);
  }

  #[test]
  fn and_keeps_the_group() {
    let clauses = parse_prerequisites(
      "(01:640:151 CALCULUS I )<em> AND </em>(01:750:203 PHYSICS I )",
    );
    assert_eq!(clauses.len(), 2);
    assert_eq!(clauses[0].logic_group, 0);
    assert_eq!(clauses[1].logic_group, 0);
    assert!(!clauses[1].is_or);
  }

  #[test]
  fn k_or_markers_span_k_plus_one_groups() {
    let notes = "(01:013:140 ARABIC I )<em> OR </em>(01:074:140 ARABIC I )\
                 <em> AND </em>(01:074:141 ARABIC II )\
                 <em> or </em>(01:013:141 ARABIC II )\
                 <em>OR</em>(01:013:142 ARABIC III )";
    let clauses = parse_prerequisites(notes);
    let groups: Vec<u32> = clauses.iter().map(|c| c.logic_group).collect();
    assert_eq!(groups, vec![0, 1, 1, 2, 3]);

    let mut distinct = groups.clone();
    distinct.dedup();
    assert_eq!(distinct.len(), 3 + 1);
  }

  #[test]
  fn several_courses_in_one_segment_share_group() {
    let clauses = parse_prerequisites("(01:198:111 INTRO CS ) and (01:198:112 DATA STRUCT )");
    assert_eq!(clauses.len(), 2);
    assert!(clauses.iter().all(|c| c.logic_group == 0 && !c.is_or));
    assert_eq!(clauses[0].source_text, clauses[1].source_text);
  }

  #[test]
  fn malformed_segments_are_skipped() {
    let clauses = parse_prerequisites(
      "Permission of instructor<em> OR </em>(01:640:151 CALCULUS I )<em> OR </em>(bad)",
    );
    assert_eq!(clauses.len(), 1);
    assert_eq!(clauses[0].logic_group, 1);
    assert!(clauses[0].is_or);
  }

  #[test]
  fn titles_are_unescaped() {
    let clauses = parse_prerequisites("(01:090:101 ARTS &amp; SCIENCES SEMINAR )");
    assert_eq!(clauses[0].course_title, "ARTS & SCIENCES SEMINAR");
  }

  #[test]
  fn unknown_entities_are_kept() {
    let clauses = parse_prerequisites("(01:090:101 A&nbsp;B )");
    assert_eq!(clauses[0].course_title, "A&nbsp;B");
  }

  #[test]
  fn source_excerpt_is_bounded() {
    let long_title = "X".repeat(400);
    let clauses = parse_prerequisites(&format!("(01:090:101 {long_title})"));
    assert_eq!(clauses[0].source_text.chars().count(), SOURCE_EXCERPT_CHARS);
  }
}
