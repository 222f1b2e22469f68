//! Term identity: the `(year, term, campus)` triple every ingestion run is
//! scoped to.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Term codes served upstream: 0 = Winter, 1 = Spring, 7 = Summer, 9 = Fall.
pub const TERM_CODES: [&str; 4] = ["0", "1", "7", "9"];

/// Natural key of a term row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TermKey {
  pub year:   i32,
  pub term:   String,
  pub campus: String,
}

impl TermKey {
  pub fn new(year: i32, term: impl Into<String>, campus: impl Into<String>) -> Result<Self> {
    let term = term.into();
    let campus = campus.into();

    if year <= 0 {
      return Err(Error::InvalidTermKey(format!("year must be positive, got {year}")));
    }
    if !TERM_CODES.contains(&term.as_str()) {
      return Err(Error::InvalidTermKey(format!("unknown term code {term:?}")));
    }
    if campus.trim().is_empty() {
      return Err(Error::InvalidTermKey("campus must not be empty".into()));
    }

    Ok(Self { year, term, campus })
  }

  /// Human-readable season for the term code.
  pub fn season(&self) -> &'static str {
    match self.term.as_str() {
      "0" => "winter",
      "1" => "spring",
      "7" => "summer",
      "9" => "fall",
      _ => "unknown",
    }
  }
}

impl fmt::Display for TermKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}/{}", self.year, self.term, self.campus)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_known_term_codes() {
    let key = TermKey::new(2025, "9", "NB").unwrap();
    assert_eq!(key.season(), "fall");
    assert_eq!(key.to_string(), "2025/9/NB");
  }

  #[test]
  fn rejects_unknown_term_code() {
    assert!(matches!(
      TermKey::new(2025, "3", "NB"),
      Err(Error::InvalidTermKey(_))
    ));
  }

  #[test]
  fn rejects_blank_campus() {
    assert!(TermKey::new(2025, "1", "  ").is_err());
  }
}
