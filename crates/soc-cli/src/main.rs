//! `soc-ingest`: bulk-load schedule-of-classes catalogs into SQLite.
//!
//! # Usage
//!
//! ```
//! soc-ingest --year 2025 --term 9 --campus NB
//! soc-ingest --year 2025 --term 1 --all-campuses --clear
//! soc-ingest --json-file courses.json --db-path catalog.db --json
//! ```

mod settings;
mod source;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use settings::Settings;
use soc_core::{report::IngestReport, store::CatalogStore, table::TableCounts, term::TermKey};
use soc_store_sqlite::SqliteIngester;
use source::{ApiClient, Source};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

/// Campuses covered by `--all-campuses`.
const ALL_CAMPUSES: [&str; 3] = ["NB", "NK", "CM"];

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "soc-ingest", version, about = "Bulk-load schedule-of-classes catalogs")]
struct Args {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "soc.toml")]
  config: PathBuf,

  #[arg(long, default_value_t = 2025)]
  year: i32,

  /// 0 winter, 1 spring, 7 summer, 9 fall.
  #[arg(long, default_value = "1", value_parser = ["0", "1", "7", "9"])]
  term: String,

  #[arg(
    long,
    default_value = "NB",
    value_parser = ["NB", "NK", "CM", "ONLINE_NB", "ONLINE_NK", "ONLINE_CM"],
  )]
  campus: String,

  /// Ingest NB, NK and CM in turn.
  #[arg(long)]
  all_campuses: bool,

  /// Delete the term's existing courses (and everything under them) first.
  #[arg(long)]
  clear: bool,

  /// Read the catalog from a saved JSON file instead of the API.
  #[arg(long, value_name = "FILE", conflicts_with = "all_campuses")]
  json_file: Option<PathBuf>,

  #[arg(long)]
  workers: Option<usize>,

  /// Rows buffered per table before a bulk statement is issued.
  #[arg(long)]
  flush_threshold: Option<usize>,

  #[arg(long, value_name = "FILE")]
  db_path: Option<PathBuf>,

  /// Print the run reports as JSON on stdout.
  #[arg(long)]
  json: bool,
}

impl Args {
  /// Flags win over file and environment settings.
  fn apply(&self, settings: &mut Settings) {
    if let Some(workers) = self.workers {
      settings.workers = workers;
    }
    if let Some(threshold) = self.flush_threshold {
      settings.flush_threshold = threshold;
    }
    if let Some(path) = &self.db_path {
      settings.db_path = path.clone();
    }
  }

  fn terms(&self) -> Result<Vec<TermKey>> {
    let campuses: Vec<&str> = if self.all_campuses {
      ALL_CAMPUSES.to_vec()
    } else {
      vec![self.campus.as_str()]
    };
    campuses
      .into_iter()
      .map(|campus| Ok(TermKey::new(self.year, &self.term, campus)?))
      .collect()
  }
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let mut settings = Settings::load(&args.config)?;
  args.apply(&mut settings);

  let store = SqliteIngester::open(&settings.db_path, settings.ingest_options())
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.db_path))?;

  let source = match &args.json_file {
    Some(path) => Source::File(path.clone()),
    None => Source::Api(ApiClient::new(&settings.api_base_url, settings.request_timeout())?),
  };

  let reports = run(&store, &source, &args.terms()?, args.clear).await?;

  if reports.len() > 1 {
    let mut rows = TableCounts::new();
    for report in &reports {
      rows.merge(&report.rows);
    }
    info!(
      campuses = reports.len(),
      courses = reports.iter().map(|r| r.courses).sum::<usize>(),
      sections = reports.iter().map(|r| r.sections).sum::<usize>(),
      rows = rows.total(),
      "all campuses ingested"
    );
  }

  if args.json {
    println!("{}", serde_json::to_string_pretty(&reports)?);
  }

  Ok(())
}

/// Fetch and ingest each term in turn.
async fn run<S: CatalogStore>(
  store: &S,
  source: &Source,
  terms: &[TermKey],
  clear_existing: bool,
) -> Result<Vec<IngestReport>> {
  let mut reports = Vec::with_capacity(terms.len());

  for term in terms {
    let courses = source
      .fetch(term)
      .await
      .with_context(|| format!("failed to fetch {term}"))?;
    info!(%term, season = term.season(), courses = courses.len(), "catalog fetched");

    let report = store
      .ingest_term(term, courses, clear_existing)
      .await
      .with_context(|| format!("failed to ingest {term}"))?;
    reports.push(report);
  }

  Ok(reports)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(args: &[&str]) -> Args {
    Args::try_parse_from(std::iter::once("soc-ingest").chain(args.iter().copied())).unwrap()
  }

  #[test]
  fn defaults() {
    let args = parse(&[]);
    assert_eq!(args.year, 2025);
    assert_eq!(args.term, "1");
    assert_eq!(args.campus, "NB");
    assert!(!args.clear && !args.all_campuses && !args.json);

    let terms = args.terms().unwrap();
    assert_eq!(terms.len(), 1);
    assert_eq!(terms[0].to_string(), "2025/1/NB");
  }

  #[test]
  fn all_campuses_expands() {
    let terms = parse(&["--all-campuses", "--term", "9"]).terms().unwrap();
    let campuses: Vec<&str> = terms.iter().map(|t| t.campus.as_str()).collect();
    assert_eq!(campuses, ALL_CAMPUSES);
  }

  #[test]
  fn rejects_unknown_term_and_campus() {
    let bin = "soc-ingest";
    assert!(Args::try_parse_from([bin, "--term", "3"]).is_err());
    assert!(Args::try_parse_from([bin, "--campus", "XX"]).is_err());
    assert!(Args::try_parse_from([bin, "--all-campuses", "--json-file", "x.json"]).is_err());
  }

  #[test]
  fn flags_override_settings() {
    let args = parse(&["--workers", "3", "--flush-threshold", "10", "--db-path", "x.db"]);
    let mut settings = Settings::default();
    args.apply(&mut settings);
    assert_eq!(settings.workers, 3);
    assert_eq!(settings.flush_threshold, 10);
    assert_eq!(settings.db_path, PathBuf::from("x.db"));
  }

  #[tokio::test]
  async fn ingests_a_saved_catalog_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = dir.path().join("courses.json");
    std::fs::write(
      &catalog,
      r#"[{"courseString": "01:198:111", "sections": [{"index": "09214"}]}]"#,
    )
    .unwrap();

    let store = SqliteIngester::open(dir.path().join("soc.db"), Default::default())
      .await
      .unwrap();
    let terms = parse(&["--json-file", "courses.json"]).terms().unwrap();
    let reports = run(&store, &Source::File(catalog), &terms, false).await.unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].courses, 1);
    assert_eq!(reports[0].sections, 1);
  }
}
