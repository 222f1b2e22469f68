//! [`SqliteIngester`]: the SQLite implementation of [`CatalogStore`].

use std::{
  num::NonZeroUsize,
  path::{Path, PathBuf},
  sync::Arc,
  time::{Duration, Instant},
};

use chrono::Utc;
use soc_core::{
  lookup::LookupSet,
  partition::partition,
  record::CatalogCourse,
  report::{ChunkReport, IngestReport},
  store::CatalogStore,
  term::TermKey,
};
use tokio::task::JoinSet;
use tracing::{Instrument as _, Span, debug, info, info_span, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::encode_dt,
  lookup::resolve_lookups,
  schema::{SCHEMA, configure_connection},
  worker::{ChunkContext, ingest_chunk},
};

const UPSERT_TERM: &str = "
  INSERT INTO terms (year, term, campus, fetched_at) VALUES (?1, ?2, ?3, ?4)
  ON CONFLICT (year, term, campus) DO UPDATE SET fetched_at = excluded.fetched_at
  RETURNING id
";

const CLEAR_TERM: &str = "DELETE FROM courses WHERE term_id = ?1";

// ─── Options ─────────────────────────────────────────────────────────────────

pub const DEFAULT_FLUSH_THRESHOLD: usize = 2000;
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// `min(8, available cores)`.
pub fn default_workers() -> usize {
  std::thread::available_parallelism()
    .map_or(1, NonZeroUsize::get)
    .min(8)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOptions {
  /// Upper bound on concurrent chunk workers.
  pub workers:         usize,
  /// Rows buffered per table before a bulk statement is issued.
  pub flush_threshold: usize,
  /// How long a connection waits on a locked database.
  pub busy_timeout:    Duration,
}

impl Default for IngestOptions {
  fn default() -> Self {
    Self {
      workers:         default_workers(),
      flush_threshold: DEFAULT_FLUSH_THRESHOLD,
      busy_timeout:    DEFAULT_BUSY_TIMEOUT,
    }
  }
}

// ─── Ingester ────────────────────────────────────────────────────────────────

/// A catalog store backed by a single SQLite file.
///
/// Holds no connection of its own: every run opens a setup connection, and
/// every chunk worker opens a private one.
#[derive(Debug, Clone)]
pub struct SqliteIngester {
  path:    PathBuf,
  options: IngestOptions,
}

impl SqliteIngester {
  /// Open (or create) the database at `path` and apply the schema.
  pub async fn open(path: impl AsRef<Path>, options: IngestOptions) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    let conn = open_connection(&path, options.busy_timeout).await?;
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;

    debug!(path = %path.display(), "schema applied");
    Ok(Self { path, options })
  }

  pub fn path(&self) -> &Path { &self.path }

  pub fn options(&self) -> &IngestOptions { &self.options }

  /// Ingest one fetched batch for `term`.
  ///
  /// Chunks commit independently. If any chunk fails, the remaining workers
  /// still run to completion and the first failure observed is returned;
  /// chunks that committed stay committed.
  pub async fn ingest(
    &self,
    term: &TermKey,
    courses: Vec<CatalogCourse>,
    clear_existing: bool,
  ) -> Result<IngestReport> {
    let run_id = Uuid::new_v4();
    let span = info_span!("ingest", %run_id, %term);
    self
      .run(run_id, term, courses, clear_existing)
      .instrument(span)
      .await
  }

  async fn run(
    &self,
    run_id: Uuid,
    term: &TermKey,
    courses: Vec<CatalogCourse>,
    clear_existing: bool,
  ) -> Result<IngestReport> {
    let started = Instant::now();
    info!(courses = courses.len(), workers = self.options.workers, "ingest started");

    // ── Setup: term, optional clear, lookups ───────────────────────────────

    let setup = open_connection(&self.path, self.options.busy_timeout).await?;

    let (year, code, campus) = (term.year, term.term.clone(), term.campus.clone());
    let fetched_at = encode_dt(Utc::now());
    let term_id: i64 = setup
      .call(move |conn| {
        let id = conn.query_row(
          UPSERT_TERM,
          rusqlite::params![year, code, campus, fetched_at],
          |row| row.get(0),
        )?;
        Ok(id)
      })
      .await?;

    if clear_existing {
      let removed = setup
        .call(move |conn| Ok(conn.execute(CLEAR_TERM, [term_id])?))
        .await?;
      info!(term_id, removed, "cleared existing courses");
    }

    let set = LookupSet::collect(&courses);
    let threshold = self.options.flush_threshold;
    let lookups = setup
      .call(move |conn| Ok(resolve_lookups(conn, &set, threshold)?))
      .await?;
    drop(setup);

    info!(
      schools = lookups.schools.len(),
      subjects = lookups.subjects.len(),
      instructors = lookups.instructors.len(),
      "lookups resolved"
    );
    let lookups = Arc::new(lookups);

    // ── Fan out ─────────────────────────────────────────────────────────────

    let mut tasks = JoinSet::new();
    for (chunk, batch) in partition(courses, self.options.workers).into_iter().enumerate() {
      let ctx = ChunkContext {
        chunk,
        term_id,
        lookups: Arc::clone(&lookups),
        flush_threshold: threshold,
      };
      tasks.spawn(
        run_chunk(self.path.clone(), self.options.busy_timeout, batch, ctx)
          .instrument(info_span!("chunk", chunk)),
      );
    }

    let mut report = IngestReport::new(run_id, term.clone(), term_id);
    let mut first_error = None;

    while let Some(joined) = tasks.join_next().await {
      match joined.map_err(Error::from).and_then(|r| r) {
        Ok(chunk) => {
          info!(
            chunk = chunk.chunk,
            courses = chunk.courses,
            sections = chunk.sections,
            "chunk committed"
          );
          report.absorb(&chunk);
        }
        Err(e) => {
          warn!(error = %e, "chunk failed");
          first_error.get_or_insert(e);
        }
      }
    }

    if let Some(e) = first_error {
      return Err(e);
    }

    report.elapsed = started.elapsed();
    info!(
      chunks = report.chunks,
      courses = report.courses,
      sections = report.sections,
      rows = report.rows.total(),
      elapsed_ms = report.elapsed.as_millis() as u64,
      rows_per_sec = report.rows_per_sec() as u64,
      "ingest finished"
    );
    for (table, rows) in report.rows.iter() {
      debug!(table = %table, rows, "rows written");
    }

    Ok(report)
  }
}

impl CatalogStore for SqliteIngester {
  type Error = Error;

  async fn ingest_term(
    &self,
    term: &TermKey,
    courses: Vec<CatalogCourse>,
    clear_existing: bool,
  ) -> Result<IngestReport> {
    self.ingest(term, courses, clear_existing).await
  }
}

// ─── Connections ─────────────────────────────────────────────────────────────

async fn open_connection(
  path: &Path,
  busy_timeout: Duration,
) -> tokio_rusqlite::Result<tokio_rusqlite::Connection> {
  let conn = tokio_rusqlite::Connection::open(path).await?;
  conn
    .call(move |conn| Ok(configure_connection(conn, busy_timeout)?))
    .await?;
  Ok(conn)
}

async fn run_chunk(
  path: PathBuf,
  busy_timeout: Duration,
  courses: Vec<CatalogCourse>,
  ctx: ChunkContext,
) -> Result<ChunkReport> {
  let chunk = ctx.chunk;
  write_chunk(path, busy_timeout, courses, ctx)
    .await
    .map_err(|source| Error::Chunk { chunk, source })
}

async fn write_chunk(
  path: PathBuf,
  busy_timeout: Duration,
  courses: Vec<CatalogCourse>,
  ctx: ChunkContext,
) -> tokio_rusqlite::Result<ChunkReport> {
  let conn = open_connection(&path, busy_timeout).await?;
  // The closure runs on the connection's own thread; carry the run span over.
  let span = Span::current();
  conn
    .call(move |conn| {
      let _entered = span.enter();
      Ok(ingest_chunk(conn, &courses, &ctx)?)
    })
    .await
}
