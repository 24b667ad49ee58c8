//! Integration tests for the arxdigestd CLI commands.
//!
//! Covers the commands that run fully offline: schedule queries, store
//! status, cleanup, and an export over an empty store (a day with no chosen
//! papers writes its file locally and never publishes).

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use tempfile::tempdir;

// Helper function to create a clean command instance
fn arxdigestd() -> Command { Command::cargo_bin("arxdigestd").unwrap() }

// Helper to get a temporary database path
fn temp_db() -> (tempfile::TempDir, PathBuf) {
  let dir = tempdir().unwrap();
  let db_path = dir.path().join("test.db");
  (dir, db_path)
}

// Helper to write a minimal pipeline configuration beside the database
fn write_config(dir: &Path, db_path: &Path) -> PathBuf {
  let config = serde_json::json!({
    "database_path": db_path,
    "categories_whitelist": ["cs.CL", "cs.CV"],
    "categories_blacklist": ["cs.RO"],
    "ftp": {
      "host": "ftp.invalid",
      "user": "paper",
      "password": "secret",
      "base_path": "/AI/paper"
    },
    "paths": {
      "tmp_dir": dir.join("tmp"),
      "remote_graph_dir": "/AI/paper/graph",
      "output_dir": dir.join("output")
    }
  });
  let config_path = dir.join("config.json");
  std::fs::write(&config_path, config.to_string()).unwrap();
  config_path
}

#[test]
fn test_next_update_holiday_delay() {
  // Labor Day 2024-09-02 delays the 09-03 update to 09-04
  arxdigestd()
    .arg("next-update")
    .arg("--date")
    .arg("2024-09-03")
    .assert()
    .success()
    .stdout(predicate::str::contains("2024-09-04"));
}

#[test]
fn test_next_update_weekend_rolls_to_monday() {
  arxdigestd()
    .arg("next-update")
    .arg("--date")
    .arg("2024-09-07")
    .assert()
    .success()
    .stdout(predicate::str::contains("2024-09-09"));
}

#[test]
fn test_next_update_plain_weekday_is_same_day() {
  arxdigestd()
    .arg("next-update")
    .arg("--date")
    .arg("2024-09-04")
    .assert()
    .success()
    .stdout(predicate::str::contains("2024-09-04"));
}

#[test]
#[serial]
fn test_status_on_fresh_store() {
  let (dir, db_path) = temp_db();

  arxdigestd()
    .arg("status")
    .arg("--path")
    .arg(&db_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("Papers: 0"))
    .stdout(predicate::str::contains("store is empty"))
    .stdout(predicate::str::contains("Next update:"));

  assert!(db_path.exists());
  dir.close().unwrap();
}

#[test]
#[serial]
fn test_status_and_clean() {
  let (dir, db_path) = temp_db();

  // status creates the store, clean removes it without prompting
  arxdigestd().arg("status").arg("--path").arg(&db_path).assert().success();
  assert!(db_path.exists());

  arxdigestd()
    .arg("clean")
    .arg("--path")
    .arg(&db_path)
    .arg("--accept-defaults")
    .assert()
    .success()
    .stdout(predicate::str::contains("Database files cleaned"));

  assert!(!db_path.exists());
  dir.close().unwrap();
}

#[test]
#[serial]
fn test_clean_missing_database() {
  let (dir, db_path) = temp_db();

  arxdigestd()
    .arg("clean")
    .arg("--path")
    .arg(&db_path)
    .arg("--accept-defaults")
    .assert()
    .success()
    .stdout(predicate::str::contains("No database found"));

  dir.close().unwrap();
}

#[test]
#[serial]
fn test_export_empty_day_writes_local_file() -> anyhow::Result<()> {
  let (dir, db_path) = temp_db();
  let config_path = write_config(dir.path(), &db_path);

  arxdigestd()
    .arg("export")
    .arg("--config")
    .arg(&config_path)
    .arg("--from")
    .arg("2024-09-02")
    .arg("--until")
    .arg("2024-09-02")
    .assert()
    .success()
    .stdout(predicate::str::contains("Export complete"));

  let day_file = dir.path().join("output").join("2024-09-02.md");
  let content = std::fs::read_to_string(day_file)?;
  assert!(content.contains("# 论文全览：2024-09-02"));
  assert!(content.contains("共有0篇相关领域论文"));
  assert!(content.contains("领域白名单：cs.CL,cs.CV"));

  dir.close()?;
  Ok(())
}

#[test]
#[serial]
fn test_export_csv_empty_day_writes_header_only() -> anyhow::Result<()> {
  let (dir, db_path) = temp_db();
  let config_path = write_config(dir.path(), &db_path);

  arxdigestd()
    .arg("export")
    .arg("--config")
    .arg(&config_path)
    .arg("--from")
    .arg("2024-09-02")
    .arg("--until")
    .arg("2024-09-02")
    .arg("--format")
    .arg("csv")
    .assert()
    .success();

  let day_file = dir.path().join("output").join("2024-09-02.csv");
  let content = std::fs::read_to_string(day_file)?;
  assert_eq!(content.lines().count(), 1);
  assert!(content.starts_with("Title,Interest,"));

  dir.close()?;
  Ok(())
}

#[test]
#[serial]
fn test_export_rejects_inverted_range() {
  let (dir, db_path) = temp_db();
  let config_path = write_config(dir.path(), &db_path);

  arxdigestd()
    .arg("export")
    .arg("--config")
    .arg(&config_path)
    .arg("--from")
    .arg("2024-09-04")
    .arg("--until")
    .arg("2024-09-02")
    .assert()
    .failure();

  dir.close().unwrap();
}
