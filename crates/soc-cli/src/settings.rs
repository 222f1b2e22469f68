//! Layered runtime settings.
//!
//! Precedence, lowest first: built-in defaults, the optional TOML file,
//! `SOC_`-prefixed environment variables, then command-line flags (applied by
//! the caller).

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::{Context as _, Result};
use serde::Deserialize;
use soc_store_sqlite::{IngestOptions, default_workers};

pub const DEFAULT_API_BASE_URL: &str = "https://sis.rutgers.edu/soc/api";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub db_path:              PathBuf,
  pub api_base_url:         String,
  pub workers:              usize,
  pub flush_threshold:      usize,
  pub busy_timeout_ms:      u64,
  pub request_timeout_secs: u64,
}

impl Default for Settings {
  fn default() -> Self {
    let options = IngestOptions::default();
    Self {
      db_path:              PathBuf::from("soc.db"),
      api_base_url:         DEFAULT_API_BASE_URL.to_string(),
      workers:              default_workers(),
      flush_threshold:      options.flush_threshold,
      busy_timeout_ms:      options.busy_timeout.as_millis() as u64,
      request_timeout_secs: 120,
    }
  }
}

impl Settings {
  /// Read `path` (if it exists) and the environment over the defaults.
  pub fn load(path: &Path) -> Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("SOC").try_parsing(true))
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?
      .try_deserialize()
      .context("failed to deserialise settings")
  }

  pub fn ingest_options(&self) -> IngestOptions {
    IngestOptions {
      workers:         self.workers.max(1),
      flush_threshold: self.flush_threshold.max(1),
      busy_timeout:    Duration::from_millis(self.busy_timeout_ms),
    }
  }

  pub fn request_timeout(&self) -> Duration { Duration::from_secs(self.request_timeout_secs) }
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(settings.api_base_url, DEFAULT_API_BASE_URL);
    assert_eq!(settings.flush_threshold, 2000);
    assert_eq!(settings.busy_timeout_ms, 30_000);
  }

  #[test]
  fn file_overrides_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "db_path = \"catalog.db\"\nflush_threshold = 500").unwrap();

    let settings = Settings::load(file.path()).unwrap();
    assert_eq!(settings.db_path, PathBuf::from("catalog.db"));
    assert_eq!(settings.flush_threshold, 500);
    assert_eq!(settings.request_timeout_secs, 120);
  }

  #[test]
  fn options_never_use_zero() {
    let settings = Settings { workers: 0, flush_threshold: 0, ..Settings::default() };
    let options = settings.ingest_options();
    assert_eq!(options.workers, 1);
    assert_eq!(options.flush_threshold, 1);
  }
}
