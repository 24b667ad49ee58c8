//! Knowledge base (dify) ingestion client.
//!
//! Documents are submitted as multipart uploads together with a
//! `process_rule` describing how the knowledge base should segment them.
//! The pipeline always submits fresh documents (no replace id); the
//! `replace_document_id` parameter exists for future update support, since
//! re-publish semantics are handled out-of-band. Listing and deletion are
//! administrative operations exposed through the CLI, not pipeline steps.

use super::*;

/// Segmentation directive sent with every document.
///
/// The default matches the preprocessing in [`crate::chunk`]: the processed
/// file is a concatenation of `#####`-terminated chunks, and the knowledge
/// base re-splits on that same separator client-side.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkingRule {
  /// Separator the knowledge base splits on
  pub separator:     String,
  /// Maximum tokens per segment
  pub max_tokens:    u32,
  /// Token overlap between segments
  pub chunk_overlap: u32,
}

impl Default for ChunkingRule {
  fn default() -> Self {
    Self { separator: chunk::SEGMENT_TRAILER.to_string(), max_tokens: 2000, chunk_overlap: 0 }
  }
}

/// A document as reported by the knowledge base listing API.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentInfo {
  /// Knowledge-base-assigned document id
  pub id:   String,
  /// Document display name
  pub name: String,
}

/// One page of the document listing response.
#[derive(Debug, Deserialize)]
struct DocumentPage {
  /// Documents on this page
  #[serde(default)]
  data: Vec<DocumentInfo>,
}

/// Client for the knowledge base ingestion API.
pub struct KnowledgeBaseClient {
  /// Internal web client used to connect to the API
  client: reqwest::Client,
  /// Endpoint, dataset, and credential configuration
  config: DifyConfig,
}

impl KnowledgeBaseClient {
  /// Creates a client for the configured dataset.
  pub fn new(config: DifyConfig) -> Self { Self { client: reqwest::Client::new(), config } }

  /// Submits a file for indexing, optionally replacing a prior document.
  ///
  /// Failure carries the response status and body in the error message;
  /// the pipeline logs it and moves on, it is never fatal to a run.
  pub async fn create_document_from_file(
    &self,
    path: &Path,
    replace_document_id: Option<&str>,
    chunking: &ChunkingRule,
  ) -> Result<(), DigestError> {
    let url = format!(
      "{}/v1/datasets/{}/document/create-by-file",
      self.config.base_url, self.config.dataset_id
    );

    let mut process_rule = serde_json::json!({
      "indexing_technique": "high_quality",
      "process_rule": {
        "mode": "custom",
        "rules": {
          "pre_processing_rules": [
            { "id": "remove_extra_spaces", "enabled": false },
            { "id": "remove_urls_emails", "enabled": false }
          ],
          "segmentation": {
            "separator": chunking.separator,
            "max_tokens": chunking.max_tokens,
            "chunk_overlap": chunking.chunk_overlap
          }
        }
      }
    });
    if let Some(id) = replace_document_id {
      process_rule["original_document_id"] = serde_json::json!(id);
    }

    let file_name =
      path.file_name().and_then(|n| n.to_str()).unwrap_or("document.md").to_string();
    let bytes = tokio::fs::read(path).await?;
    let part = reqwest::multipart::Part::bytes(bytes)
      .file_name(file_name.clone())
      .mime_str("text/markdown")?;
    let form = reqwest::multipart::Form::new()
      .part("file", part)
      .text("data", process_rule.to_string());

    let response = self
      .client
      .post(&url)
      .bearer_auth(&self.config.api_key)
      .multipart(form)
      .send()
      .await?;

    let status = response.status();
    if status.is_success() {
      info!("submitted {file_name} to knowledge base dataset {}", self.config.dataset_id);
      Ok(())
    } else {
      let body = response.text().await.unwrap_or_default();
      Err(DigestError::Api(format!("knowledge base upload failed ({status}): {body}")))
    }
  }

  /// Lists one page of documents in the dataset.
  pub async fn list_documents(
    &self,
    page: u32,
    limit: u32,
  ) -> Result<Vec<DocumentInfo>, DigestError> {
    let url =
      format!("{}/v1/datasets/{}/documents", self.config.base_url, self.config.dataset_id);
    let response = self
      .client
      .get(&url)
      .bearer_auth(&self.config.api_key)
      .query(&[("page", page), ("limit", limit)])
      .send()
      .await?
      .error_for_status()?;

    let body: DocumentPage = response.json().await?;
    Ok(body.data)
  }

  /// Deletes a document from the dataset.
  pub async fn delete_document(&self, document_id: &str) -> Result<(), DigestError> {
    let url = format!(
      "{}/v1/datasets/{}/documents/{document_id}",
      self.config.base_url, self.config.dataset_id
    );
    let response = self.client.delete(&url).bearer_auth(&self.config.api_key).send().await?;

    let status = response.status();
    if status.is_success() {
      info!("deleted knowledge base document {document_id}");
      Ok(())
    } else {
      let body = response.text().await.unwrap_or_default();
      Err(DigestError::Api(format!("knowledge base delete failed ({status}): {body}")))
    }
  }
}
