//! A library for filtering, enriching, and exporting arXiv paper metadata.
//!
//! Papers collected by an upstream crawler are persisted in a local SQLite
//! store, partitioned by a category whitelist/blacklist policy, enriched
//! through external services (machine translation, a local LLM for summaries
//! and title translation, PDF acquisition and translation), and rendered to
//! day-partitioned Markdown and CSV files. Day files with at least one chosen
//! paper are published to an FTP server and submitted to a knowledge base for
//! indexing.
//!
//! # Example
//! ```rust,no_run
//! use arxdigest::{config::ExportConfig, export::Exporter};
//! use chrono::NaiveDate;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!   let config = ExportConfig::from_file("config.json")?;
//!   let from = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
//!   let until = NaiveDate::from_ymd_opt(2024, 9, 6).unwrap();
//!
//!   let exporter = Exporter::new(config, from, until).await?;
//!   exporter.to_markdown(None).await?;
//!
//!   Ok(())
//! }
//! ```

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{
  collections::HashSet,
  path::{Path, PathBuf},
};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub mod categories;
pub mod chunk;
pub mod clients;
pub mod config;
pub mod database;
pub mod errors;
pub mod export;
pub mod ftp;
pub mod paper;
pub mod schedule;

use config::{DifyConfig, ExportConfig, FtpConfig, OllamaConfig, PrefaceMeta};
use database::Database;
use errors::DigestError;
use paper::{Paper, PaperRecord};
