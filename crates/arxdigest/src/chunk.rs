//! Text chunking for knowledge-base submission.
//!
//! Day files carry a fixed 7-line metadata header that downstream ingestion
//! always strips before chunking; the remaining body is split on paragraph
//! boundaries with an inclusion-style overlap, heading chunks are dropped,
//! and every surviving chunk gets a fixed trailer appended. The processed
//! document is uploaded with a chunking directive whose separator matches
//! that trailer, so the knowledge base re-splits on the same boundary
//! client-side.

use super::*;

/// Number of metadata lines at the top of every day file. Downstream
/// ingestion strips exactly this many lines before chunking; this is a
/// format contract with [`crate::export::Exporter::to_markdown`].
pub const HEADER_LINES: usize = 7;

/// Trailer appended to every surviving chunk, and the separator the
/// knowledge base is told to re-split on.
pub const SEGMENT_TRAILER: &str = "#####";

/// Separator used to split the document body into chunks.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Characters past each separator match included in the preceding chunk.
pub const PARAGRAPH_OVERLAP: usize = 2;

/// Splits `text` into chunks at each occurrence of `separator`, including
/// `overlap` characters past the match in the preceding chunk.
///
/// This is overlap by inclusion, not a sliding re-read: each non-final chunk
/// spans from the cursor to `overlap` bytes past the start of the separator
/// match, and the cursor then advances past the separator. Text after the
/// last separator becomes the final chunk. Byte offsets are rounded up to
/// the next UTF-8 character boundary so multi-byte text never splits
/// mid-character.
pub fn split_text(text: &str, separator: &str, overlap: usize) -> Vec<String> {
  let mut chunks = Vec::new();
  let mut start = 0;

  while start < text.len() {
    match text[start..].find(separator) {
      Some(offset) => {
        let matched = start + offset;
        let mut end = (matched + overlap).min(text.len());
        while !text.is_char_boundary(end) {
          end += 1;
        }
        chunks.push(text[start..end].to_string());
        start = matched + separator.len();
      },
      None => {
        chunks.push(text[start..].to_string());
        break;
      },
    }
  }

  chunks
}

/// Drops the fixed metadata header block, returning the document body.
///
/// Returns the empty string when the content has fewer than
/// [`HEADER_LINES`] lines.
pub fn strip_metadata_header(content: &str) -> &str {
  let mut rest = content;
  for _ in 0..HEADER_LINES {
    match rest.find('\n') {
      Some(pos) => rest = &rest[pos + 1..],
      None => return "",
    }
  }
  rest
}

/// Prepares a day-file body for knowledge-base submission.
///
/// Strips the Markdown emphasis markers used by the paper renderer, splits
/// on paragraph boundaries with the inclusion-style overlap, drops chunks
/// containing a heading marker (those are section headers, not content),
/// appends [`SEGMENT_TRAILER`] to each surviving chunk, and concatenates
/// with no intervening separator.
pub fn process_document(body: &str) -> String {
  let cleaned = body.replace("> **", "").replace("- **", "").replace("**", "");

  let mut processed = String::new();
  for chunk in split_text(&cleaned, PARAGRAPH_SEPARATOR, PARAGRAPH_OVERLAP) {
    if chunk.contains("##") {
      debug!("skipping header chunk: {:.40}", chunk);
      continue;
    }
    processed.push_str(&chunk);
    processed.push_str(SEGMENT_TRAILER);
  }
  processed
}
