//! Pipeline configuration.
//!
//! All service endpoints and paths live in one immutable [`ExportConfig`],
//! loaded from a JSON file and validated up front so a missing credential
//! fails at construction rather than mid-export. The `ollama`, `dify`, and
//! `pdf_translate` sections are optional: without them the pipeline falls
//! back to raw abstracts, skips knowledge-base submission, and skips PDF
//! translation respectively.

use super::*;

/// FTP server credentials and the base path day files are published under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FtpConfig {
  /// Server address, `host` or `host:port` (defaults to port 21)
  pub host:      String,
  /// Login user
  pub user:      String,
  /// Login password
  pub password:  String,
  /// Remote directory day files are uploaded under
  pub base_path: String,
}

/// Local LLM service used for summaries and title translation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
  /// Service base URL, e.g. `http://127.0.0.1:11434`
  pub host:  String,
  /// Model name, e.g. `gemma2:9b`
  pub model: String,
}

/// Knowledge base (dify) ingestion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifyConfig {
  /// API base URL
  pub base_url:    String,
  /// Target dataset to index documents into
  pub dataset_id:  String,
  /// Bearer token
  pub api_key:     String,
  /// Prefix for the staging copy of each day file
  pub file_prefix: String,
}

/// External PDF translation tool (pdf2zh-style command line).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfTranslateConfig {
  /// Path to the translator executable
  pub program: PathBuf,
  /// Worker threads passed to the tool
  pub threads: u32,
  /// Translation backend passed via `-s`, e.g. `ollama:gemma2:9b`
  pub service: String,
}

/// Local and remote filesystem layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
  /// Scratch directory for per-paper artifacts (summary, PDFs)
  pub tmp_dir:          PathBuf,
  /// Remote directory per-paper artifacts are uploaded under
  pub remote_graph_dir: String,
  /// Directory day files are written to
  pub output_dir:       PathBuf,
}

/// Complete configuration for one [`crate::export::Exporter`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
  /// SQLite database path
  pub database_path:        PathBuf,
  /// Category codes papers must intersect to be chosen
  pub categories_whitelist: Vec<String>,
  /// Category codes that reject a whitelisted paper
  #[serde(default)]
  pub categories_blacklist: Vec<String>,
  /// File transfer service
  pub ftp:                  FtpConfig,
  /// Local filesystem layout
  pub paths:                PathsConfig,
  /// Summarization/translation LLM; raw abstracts are used when absent
  #[serde(default)]
  pub ollama:               Option<OllamaConfig>,
  /// Knowledge base ingestion; submission is skipped when absent
  #[serde(default)]
  pub dify:                 Option<DifyConfig>,
  /// PDF translation tool; translation is skipped when absent
  #[serde(default)]
  pub pdf_translate:        Option<PdfTranslateConfig>,
}

impl ExportConfig {
  /// Loads and validates a configuration from a JSON file.
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DigestError> {
    let content = std::fs::read_to_string(path)?;
    let config: Self = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
  }

  /// Checks required fields so misconfiguration fails at construction, not
  /// at first use. An empty whitelist is allowed: it filters every paper,
  /// which is a valid (if quiet) policy.
  pub fn validate(&self) -> Result<(), DigestError> {
    if self.ftp.host.is_empty() {
      return Err(DigestError::Config("ftp.host must not be empty".into()));
    }
    if self.ftp.user.is_empty() {
      return Err(DigestError::Config("ftp.user must not be empty".into()));
    }
    if let Some(dify) = &self.dify {
      if dify.base_url.is_empty() || dify.dataset_id.is_empty() || dify.api_key.is_empty() {
        return Err(DigestError::Config(
          "dify.base_url, dify.dataset_id, and dify.api_key must all be set".into(),
        ));
      }
    }
    if let Some(ollama) = &self.ollama {
      if ollama.host.is_empty() || ollama.model.is_empty() {
        return Err(DigestError::Config("ollama.host and ollama.model must both be set".into()));
      }
    }
    Ok(())
  }
}

/// Optional preface metadata rendered into every day file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefaceMeta {
  /// Whitelist echoed into the header for readers
  pub category_whitelist: Vec<String>,
  /// Free-form keywords echoed into the header
  pub optional_keywords:  Vec<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn base_config() -> ExportConfig {
    ExportConfig {
      database_path:        PathBuf::from("papers.db"),
      categories_whitelist: vec!["cs.CL".to_string()],
      categories_blacklist: vec![],
      ftp:                  FtpConfig {
        host:      "ftp.example.com".to_string(),
        user:      "paper".to_string(),
        password:  "secret".to_string(),
        base_path: "/AI/paper".to_string(),
      },
      paths:                PathsConfig {
        tmp_dir:          PathBuf::from("/tmp/arxdigest"),
        remote_graph_dir: "/AI/paper/graph".to_string(),
        output_dir:       PathBuf::from("./output"),
      },
      ollama:               None,
      dify:                 None,
      pdf_translate:        None,
    }
  }

  #[test]
  fn test_valid_config_passes() {
    base_config().validate().unwrap();
  }

  #[test]
  fn test_empty_ftp_host_rejected() {
    let mut config = base_config();
    config.ftp.host.clear();
    assert!(matches!(config.validate(), Err(DigestError::Config(_))));
  }

  #[test]
  fn test_partial_dify_section_rejected() {
    let mut config = base_config();
    config.dify = Some(DifyConfig {
      base_url:    "https://dify.example.com".to_string(),
      dataset_id:  String::new(),
      api_key:     "key".to_string(),
      file_prefix: "Graph_".to_string(),
    });
    assert!(matches!(config.validate(), Err(DigestError::Config(_))));
  }

  #[test]
  fn test_from_file_roundtrip() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.json");
    std::fs::write(&path, serde_json::to_string_pretty(&base_config())?)?;

    let loaded = ExportConfig::from_file(&path)?;
    assert_eq!(loaded.categories_whitelist, vec!["cs.CL"]);
    assert!(loaded.dify.is_none());
    Ok(())
  }
}
