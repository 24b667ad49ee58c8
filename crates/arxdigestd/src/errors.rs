//! Error types for the arxdigestd CLI application.
//!
//! One enum wrapping the failure modes of a CLI run: user interaction
//! prompts, the underlying pipeline library, file system operations, and
//! glob matching during cleanup. All variants are transparent so the
//! original error text reaches the user unchanged.

use thiserror::Error;

/// Errors that can occur during CLI operations.
#[derive(Error, Debug)]
pub enum DigestdErrors {
  /// Errors from user interaction dialogs
  #[error(transparent)]
  Dialoguer(#[from] dialoguer::Error),

  /// Errors from the underlying export pipeline library
  #[error(transparent)]
  Arxdigest(#[from] arxdigest::errors::DigestError),

  /// File system and IO operation errors
  #[error(transparent)]
  IO(#[from] std::io::Error),

  /// Glob pattern matching errors
  #[error(transparent)]
  Glob(#[from] glob::PatternError),
}
