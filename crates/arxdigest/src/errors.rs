//! Error types for the arxdigest library.
//!
//! A single enum covers every failure mode the pipeline can hit: store
//! invariant violations, SQLite failures, network and API errors from the
//! enrichment and publishing services, and filesystem errors.
//!
//! Two variants carry pipeline semantics beyond their message:
//! - [`DigestError::MissingAnnouncedDate`] is a precheck failure raised
//!   before any row is written; it aborts the whole batch insert.
//! - [`DigestError::EmptyStore`] is returned by aggregate queries that found
//!   no rows to aggregate over.
//!
//! Everything downstream of the store (PDF download, PDF translation, FTP
//! upload, knowledge base submission) is treated as best-effort by the
//! pipeline: those errors are logged at the point of occurrence and never
//! propagate past the affected paper or day.

use thiserror::Error;

/// Errors that can occur when working with the arxdigest library.
#[derive(Error, Debug)]
pub enum DigestError {
  /// A paper reached [`crate::database::Database::upsert`] without a
  /// `first_announced_date`. The string is the paper's URL.
  ///
  /// Announced dates are assigned by the crawler when a paper first shows up
  /// in the feed; a missing one means the batch is malformed, so the insert
  /// fails as a whole rather than silently skipping the row.
  #[error("paper {0} has no first_announced_date")]
  MissingAnnouncedDate(String),

  /// An aggregate query ran against a store with no rows.
  #[error("store contains no papers")]
  EmptyStore,

  /// An external API returned an error response or an unparseable body.
  /// The string carries the status or message for the logs.
  #[error("API error: {0}")]
  Api(String),

  /// A required configuration field is missing or invalid. Raised by
  /// [`crate::config::ExportConfig::validate`] at construction time, not at
  /// first use.
  #[error("invalid config: {0}")]
  Config(String),

  /// A network request failed.
  #[error(transparent)]
  Network(#[from] reqwest::Error),

  /// A SQLite operation failed.
  #[error(transparent)]
  Sqlite(#[from] rusqlite::Error),

  /// An async SQLite operation failed.
  #[error(transparent)]
  AsyncSqlite(#[from] tokio_rusqlite::Error),

  /// A file system operation failed.
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// An FTP operation failed.
  #[error(transparent)]
  Ftp(#[from] suppaftp::FtpError),

  /// CSV serialization failed.
  #[error(transparent)]
  Csv(#[from] csv::Error),

  /// A JSON (de)serialization failed, typically while loading configuration.
  #[error(transparent)]
  Serde(#[from] serde_json::Error),

  /// A date or datetime string failed to parse.
  #[error(transparent)]
  InvalidDate(#[from] chrono::ParseError),

  /// A spawned task panicked or was cancelled before joining.
  #[error(transparent)]
  Join(#[from] tokio::task::JoinError),
}
