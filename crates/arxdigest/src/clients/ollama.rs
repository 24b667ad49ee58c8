//! Client for a local Ollama generation service.
//!
//! The pipeline uses the model for Chinese renditions of titles and
//! abstracts in the day files. [`OllamaClient::generate`] is the raw
//! contract; [`OllamaClient::translate`] wraps it with the translation
//! prompt and squashes whitespace out of the response, since the output is
//! rendered inline in single-line Markdown fields.

use super::*;

/// Request body for `/api/generate`.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
  /// Model name from the configuration
  model:  &'a str,
  /// Full prompt, instruction plus payload text
  prompt: String,
  /// Always false: the pipeline wants the complete response in one body
  stream: bool,
}

/// Response body for `/api/generate`.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
  /// The generated text
  response: String,
}

/// Removes spaces and line breaks; generated Chinese text needs neither and
/// the rendered fields are single-line.
fn squash(text: &str) -> String {
  text.replace(' ', "").replace("\r\n", "").replace('\n', "")
}

/// Client for the Ollama generation API.
pub struct OllamaClient {
  /// Internal web client used to connect to the service
  client: reqwest::Client,
  /// Host and model configuration
  config: OllamaConfig,
}

impl OllamaClient {
  /// Creates a client for the configured host and model.
  pub fn new(config: OllamaConfig) -> Self { Self { client: reqwest::Client::new(), config } }

  /// Generates a completion for the given prompt (`stream: false`).
  pub async fn generate(&self, prompt: String) -> Result<String, DigestError> {
    let url = format!("{}/api/generate", self.config.host);
    debug!("generating via {url}");

    let response = self
      .client
      .post(&url)
      .json(&GenerateRequest { model: &self.config.model, prompt, stream: false })
      .send()
      .await?
      .error_for_status()?;

    let body: GenerateResponse = response.json().await?;
    Ok(body.response)
  }

  /// Translates English text into Chinese, returning the squashed response.
  ///
  /// Best-effort: failures are logged and yield `None`, leaving the caller
  /// to fall back to the stored machine translation or the original text.
  pub async fn translate(&self, text: &str) -> Option<String> {
    let prompt = format!(
      "Please translate the following English content into Chinese. \
             Return only the translated content. {text}"
    );
    match self.generate(prompt).await {
      Ok(response) => Some(squash(&response)),
      Err(e) => {
        warn!("ollama translation failed: {e}");
        None
      },
    }
  }
}
