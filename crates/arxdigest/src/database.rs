//! SQLite-backed record store for paper metadata.
//!
//! One table, keyed by the paper URL. Writes are idempotent upserts
//! (`INSERT OR REPLACE`) that stamp every row with the current UTC time, so
//! the store can answer "when did the last crawl of the newest feed day
//! happen" without a separate bookkeeping table.
//!
//! All access goes through a [`tokio_rusqlite::Connection`]; each logical
//! operation runs in its own short transaction on the connection's worker
//! thread. Rows are decoded by named column, never by positional shape, so a
//! schema mismatch fails loudly instead of mis-mapping fields.

use rusqlite::params;
use tokio::task::JoinSet;
use tokio_rusqlite::Connection;

use super::*;

/// Database handle for the paper record store.
pub struct Database {
  /// Worker-thread SQLite connection; cloned handles share the same worker.
  conn: Connection,
}

/// Decodes a `papers` row into a [`Paper`] by named column.
fn paper_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Paper> {
  let categories: String = row.get("categories")?;
  Ok(Paper {
    url:                  row.get("url")?,
    title:                row.get("title")?,
    authors:              row.get("authors")?,
    abstract_text:        row.get("abstract")?,
    comments:             row.get("comments")?,
    categories:           categories.split(',').map(str::to_owned).collect(),
    first_submitted_date: row.get("first_submitted_date")?,
    first_announced_date: row.get("first_announced_date")?,
    title_translated:     row.get("title_translated")?,
    abstract_translated:  row.get("abstract_translated")?,
  })
}

impl Database {
  /// Open or create a database at the specified path.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self, DigestError> {
    let conn = Connection::open(path.as_ref()).await?;

    // Initialize schema
    conn
      .call(|conn| {
        conn.execute_batch(include_str!(concat!(
          env!("CARGO_MANIFEST_DIR"),
          "/migrations/init.sql"
        )))?;
        Ok(())
      })
      .await?;

    Ok(Self { conn })
  }

  /// Get the default database path in the user's data directory.
  pub fn default_path() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("arxdigest").join("papers.db")
  }

  /// Insert-or-replace the given papers, keyed by `url`, stamping every row
  /// with the current UTC time.
  ///
  /// Fails with [`DigestError::MissingAnnouncedDate`] before writing
  /// anything if any paper lacks `first_announced_date`; the batch is
  /// all-or-nothing.
  pub async fn upsert(&self, papers: Vec<Paper>) -> Result<(), DigestError> {
    if let Some(paper) = papers.iter().find(|p| p.first_announced_date.is_none()) {
      return Err(DigestError::MissingAnnouncedDate(paper.url.clone()));
    }
    let update_time = Utc::now().naive_utc();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare_cached(
            "INSERT OR REPLACE INTO papers (
                            url, title, authors, abstract, comments, categories,
                            first_submitted_date, first_announced_date, update_time,
                            title_translated, abstract_translated
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          )?;

          for paper in &papers {
            stmt.execute(params![
              &paper.url,
              &paper.title,
              &paper.authors,
              &paper.abstract_text,
              &paper.comments,
              paper.categories.join(","),
              paper.first_submitted_date,
              paper.first_announced_date,
              update_time,
              &paper.title_translated,
              &paper.abstract_translated,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await
      .map_err(DigestError::from)
  }

  /// Count how many leading papers are not yet in the store, stopping at the
  /// first one that is.
  ///
  /// Callers must supply papers in descending recency order: the crawler
  /// pages through the feed newest-first, so the first already-present paper
  /// means everything after it has been seen too. This is an early-exit
  /// count, not an exhaustive diff.
  pub async fn count_new(&self, papers: &[Paper]) -> Result<usize, DigestError> {
    let urls: Vec<String> = papers.iter().map(|p| p.url.clone()).collect();

    self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare_cached("SELECT EXISTS(SELECT 1 FROM papers WHERE url = ?1)")?;
        let mut count = 0;
        for url in &urls {
          let exists: bool = stmt.query_row([url], |row| row.get(0))?;
          if exists {
            break;
          }
          count += 1;
        }
        Ok(count)
      })
      .await
      .map_err(DigestError::from)
  }

  /// All papers announced on the given date, in store order.
  pub async fn fetch_by_date(&self, date: NaiveDate) -> Result<Vec<Paper>, DigestError> {
    self
      .conn
      .call(move |conn| {
        let mut stmt =
          conn.prepare_cached("SELECT * FROM papers WHERE first_announced_date = ?1")?;
        let papers =
          stmt.query_map([date], paper_from_row)?.collect::<Result<Vec<_>, _>>()?;
        Ok(papers)
      })
      .await
      .map_err(DigestError::from)
  }

  /// All papers in the store, ordered by `url` descending.
  pub async fn fetch_all(&self) -> Result<Vec<Paper>, DigestError> {
    self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare_cached("SELECT * FROM papers ORDER BY url DESC")?;
        let papers =
          stmt.query_map([], paper_from_row)?.collect::<Result<Vec<_>, _>>()?;
        Ok(papers)
      })
      .await
      .map_err(DigestError::from)
  }

  /// The time of the last crawl for the most recently announced date.
  ///
  /// The store may be backfilled with papers from past dates at any time, so
  /// a plain `MAX(update_time)` would report backfill runs. Instead: find
  /// the latest `first_announced_date` present, then take the latest
  /// `update_time` among rows sharing that date.
  ///
  /// Fails with [`DigestError::EmptyStore`] if there are no rows.
  pub async fn latest_crawl_time(&self) -> Result<NaiveDateTime, DigestError> {
    self
      .conn
      .call(|conn| {
        let time: Option<NaiveDateTime> = conn.query_row(
          "SELECT MAX(update_time) FROM papers
                     WHERE first_announced_date = (SELECT MAX(first_announced_date) FROM papers)",
          [],
          |row| row.get(0),
        )?;
        Ok(time)
      })
      .await?
      .ok_or(DigestError::EmptyStore)
  }

  /// Translate every row missing either translated field and write the
  /// results back, one concurrent task per row.
  ///
  /// `translate` is invoked once for the title and once for the abstract of
  /// each incomplete row; a `None` result is stored as-is and the row stays
  /// eligible for the next backfill. Tasks run in a [`JoinSet`] and are all
  /// joined before this returns; a failing row is logged and does not abort
  /// its siblings. Returns the number of rows written back.
  pub async fn fill_missing_translations<F, Fut>(&self, translate: F) -> Result<usize, DigestError>
  where
    F: Fn(String) -> Fut + Clone + Send + 'static,
    Fut: std::future::Future<Output = Option<String>> + Send + 'static,
  {
    let rows: Vec<(String, String, String)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare_cached(
          "SELECT url, title, abstract FROM papers
                     WHERE title_translated IS NULL OR abstract_translated IS NULL",
        )?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
          .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
      })
      .await?;

    debug!("translation backfill: {} rows incomplete", rows.len());

    let mut tasks = JoinSet::new();
    for (url, title, abstract_text) in rows {
      let conn = self.conn.clone();
      let translate = translate.clone();
      tasks.spawn(async move {
        let title_translated = translate(title).await;
        let abstract_translated = translate(abstract_text).await;
        conn
          .call(move |conn| {
            conn.execute(
              "UPDATE papers SET title_translated = ?1, abstract_translated = ?2
                             WHERE url = ?3",
              params![title_translated, abstract_translated, url],
            )?;
            Ok(())
          })
          .await
      });
    }

    let mut written = 0;
    while let Some(joined) = tasks.join_next().await {
      match joined {
        Ok(Ok(())) => written += 1,
        Ok(Err(e)) => warn!("translation backfill row failed: {e}"),
        Err(e) => warn!("translation backfill task did not finish: {e}"),
      }
    }
    Ok(written)
  }
}
