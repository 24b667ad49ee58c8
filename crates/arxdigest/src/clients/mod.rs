//! Clients for the external services the pipeline enriches and publishes
//! through.
//!
//! Each submodule wraps one collaborator behind the narrow contract the
//! pipeline needs:
//!
//! - [`translate`] - machine translation of titles and abstracts
//! - [`ollama`] - local LLM generation for summaries and title translation
//! - [`dify`] - knowledge base document ingestion
//!
//! Translation and generation are best-effort: their helpers return
//! `Option<String>` and log failures, because a missing enrichment must not
//! abort an export run. The knowledge base client returns errors so the
//! pipeline can log status detail, but callers never treat them as fatal.

pub mod dify;
pub mod ollama;
pub mod translate;

pub use dify::{ChunkingRule, KnowledgeBaseClient};
pub use ollama::OllamaClient;
pub use translate::TranslateClient;

use super::*;
