//! Machine translation client for the Google web-translate endpoint.
//!
//! The endpoint requires a request token derived from the query text; the
//! derivation below follows the algorithm used by the zotero-pdf-translate
//! project (<https://github.com/windingwind/zotero-pdf-translate>), operating
//! over the text's UTF-8 bytes with 32-bit mix rounds.
//!
//! Translation is fallible and retried internally a fixed number of times.
//! On exhaustion [`TranslateClient::translate`] returns `None`: callers
//! treat a missing translation as "untranslated", never as a crash signal.

use super::*;

/// Total attempts before giving up on a translation.
const MAX_ATTEMPTS: usize = 4;

/// One 32-bit mix pass over `a`, driven by an op string of
/// `(combine, direction, amount)` triples as used by the upstream algorithm.
fn mix(mut a: u64, ops: &str) -> u64 {
  let ops = ops.as_bytes();
  let mut c = 0;
  while c + 2 < ops.len() {
    let amount = ops[c + 2];
    let shift = if amount >= b'a' { u32::from(amount - 87) } else { u32::from(amount - b'0') };
    let d = if ops[c + 1] == b'+' { a >> shift } else { a << shift };
    a = if ops[c] == b'+' { (a + d) & 0xFFFF_FFFF } else { a ^ d };
    c += 3;
  }
  a
}

/// Derives the `tk` request token for the given query text.
fn request_token(text: &str) -> String {
  const SEED: u64 = 406_644;
  const XOR_KEY: u64 = 3_293_161_072;

  let mut a = SEED;
  for byte in text.bytes() {
    a += u64::from(byte);
    a = mix(a, "+-a^+6");
  }
  a = mix(a, "+-3^+b+-f");
  a ^= XOR_KEY;
  a %= 1_000_000;

  format!("{}.{}", a, a ^ SEED)
}

/// Client for the web translation endpoint.
#[derive(Clone)]
pub struct TranslateClient {
  /// Internal web client used to connect to the endpoint
  client:   reqwest::Client,
  /// Endpoint base URL
  endpoint: String,
}

impl TranslateClient {
  /// Creates a client against the public endpoint.
  pub fn new() -> Self { Self::with_endpoint("https://translate.googleapis.com") }

  /// Creates a client against a custom endpoint (e.g. a mirror).
  pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
    Self { client: reqwest::Client::new(), endpoint: endpoint.into() }
  }

  /// Translates `text` from English into `lang_to` (e.g. `zh-CN`).
  ///
  /// Retries internally up to [`MAX_ATTEMPTS`] times; returns `None` once
  /// exhausted.
  pub async fn translate(&self, text: &str, lang_to: &str) -> Option<String> {
    for attempt in 1..=MAX_ATTEMPTS {
      match self.request(text, lang_to).await {
        Ok(result) => return Some(result),
        Err(e) => warn!("translation attempt {attempt}/{MAX_ATTEMPTS} failed: {e}"),
      }
    }
    None
  }

  /// One translation request, concatenating the segment translations from
  /// the response.
  async fn request(&self, text: &str, lang_to: &str) -> Result<String, DigestError> {
    let token = request_token(text);
    let response = self
      .client
      .get(format!("{}/translate_a/single", self.endpoint))
      .query(&[
        ("client", "gtx"),
        ("hl", "zh-CN"),
        ("dt", "at"),
        ("dt", "bd"),
        ("dt", "ex"),
        ("dt", "ld"),
        ("dt", "md"),
        ("dt", "qca"),
        ("dt", "rw"),
        ("dt", "rm"),
        ("dt", "ss"),
        ("dt", "t"),
        ("source", "bh"),
        ("ssel", "0"),
        ("tsel", "0"),
        ("kc", "1"),
        ("tk", token.as_str()),
        ("q", text),
        ("sl", "en"),
        ("tl", lang_to),
      ])
      .send()
      .await?
      .error_for_status()?;

    let body: serde_json::Value = response.json().await?;
    let segments = body
      .get(0)
      .and_then(|v| v.as_array())
      .ok_or_else(|| DigestError::Api("unexpected translation response shape".into()))?;

    let mut result = String::new();
    for segment in segments {
      if let Some(fragment) = segment.get(0).and_then(|v| v.as_str()) {
        result.push_str(fragment);
      }
    }
    Ok(result)
  }
}

impl Default for TranslateClient {
  fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_request_token_deterministic() {
    assert_eq!(request_token("hello world"), request_token("hello world"));
    assert_ne!(request_token("hello world"), request_token("hello worlds"));
  }

  #[test]
  fn test_request_token_shape() {
    for text in ["hello", "", "摘要：多智能体系统", "a much longer English sentence"] {
      let token = request_token(text);
      let (head, tail) = token.split_once('.').expect("token has two parts");
      let head: u64 = head.parse().expect("numeric head");
      let tail: u64 = tail.parse().expect("numeric tail");
      assert!(head < 1_000_000);
      assert_eq!(tail, head ^ 406_644);
    }
  }
}
