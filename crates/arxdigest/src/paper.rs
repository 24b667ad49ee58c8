//! Paper metadata types: the stored [`Paper`] record and the per-run
//! [`PaperRecord`] filter verdict.
//!
//! A [`Paper`] is created by the upstream crawler and persisted in the
//! [`crate::database::Database`] keyed by its arXiv abstract URL. The mirror
//! and PDF URLs are not stored; they are deterministic transforms of that
//! key.
//!
//! A [`PaperRecord`] pairs a paper with the category-policy verdict from
//! [`crate::export::Exporter::filter_papers`]. Records live only for the
//! duration of an export run and are never persisted.

use super::*;

/// The verdict marker for a paper that passed the category policy.
pub const CHOSEN: &str = "-";

/// A paper's metadata as persisted in the record store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paper {
  /// The arXiv abstract URL, e.g. `https://arxiv.org/abs/2301.07041`.
  /// Unique and stable; used as the primary key.
  pub url:                  String,
  /// The paper's title
  pub title:                String,
  /// Comma-separated author list as provided by the feed
  pub authors:              String,
  /// The paper's abstract text
  pub abstract_text:        String,
  /// The arXiv comments field (page counts, venue notes, ...)
  pub comments:             String,
  /// Category codes in feed order; the first entry is the primary category
  /// and is used as the grouping key for rendered output.
  pub categories:           Vec<String>,
  /// When the paper was first submitted to arXiv
  pub first_submitted_date: NaiveDate,
  /// When the paper became visible in the feed. Differs from the submission
  /// date around weekends and arXiv holidays. Must be set before the paper
  /// can be persisted.
  pub first_announced_date: Option<NaiveDate>,
  /// Machine translation of the title, filled in by the backfill pass
  pub title_translated:     Option<String>,
  /// Machine translation of the abstract, filled in by the backfill pass
  pub abstract_translated:  Option<String>,
}

impl Paper {
  /// The papers.cool mirror URL for this paper.
  pub fn mirror_url(&self) -> String {
    self.url.replace("https://arxiv.org/abs", "https://papers.cool/arxiv")
  }

  /// The direct PDF URL for this paper.
  pub fn pdf_url(&self) -> String {
    self.url.replace("https://arxiv.org/abs", "https://arxiv.org/pdf")
  }

  /// The bare arXiv identifier (final URL segment), used as the per-paper
  /// artifact directory name.
  pub fn arxiv_id(&self) -> &str { self.url.rsplit('/').next().unwrap_or(&self.url) }

  /// The primary category: the first entry of the category list.
  pub fn primary_category(&self) -> &str {
    self.categories.first().map(String::as_str).unwrap_or("")
  }
}

/// A paper paired with its filter verdict for one export run.
///
/// The verdict (`comment`) is [`CHOSEN`] (`"-"`) when the paper passed the
/// whitelist/blacklist policy, and a human-readable rejection reason
/// otherwise.
#[derive(Debug, Clone)]
pub struct PaperRecord {
  /// The paper this verdict applies to
  pub paper:   Paper,
  /// [`CHOSEN`] or the rejection reason
  pub comment: String,
}

impl PaperRecord {
  /// Whether this record passed the category policy.
  pub fn is_chosen(&self) -> bool { self.comment == CHOSEN }

  /// One-line Markdown stub for a filtered record: title, link, translated
  /// title, and the rejection reason. Chosen records get the full enrichment
  /// block from the exporter instead.
  pub fn render_stub(&self) -> String {
    format!(
      "- [{}]({})\n  - **标题**: {}\n  - **Filtered Reason**: {}\n",
      self.paper.title,
      self.paper.url,
      self.paper.title_translated.as_deref().unwrap_or("-"),
      self.comment
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample_paper() -> Paper {
    Paper {
      url:                  "https://arxiv.org/abs/2409.01234".to_string(),
      title:                "Adaptive Retrieval for Grounded Generation".to_string(),
      authors:              "A. Author, B. Author".to_string(),
      abstract_text:        "We study retrieval.".to_string(),
      comments:             "10 pages".to_string(),
      categories:           vec!["cs.CL".to_string(), "cs.AI".to_string()],
      first_submitted_date: NaiveDate::from_ymd_opt(2024, 8, 30).unwrap(),
      first_announced_date: Some(NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()),
      title_translated:     None,
      abstract_translated:  None,
    }
  }

  #[test]
  fn test_derived_urls() {
    let paper = sample_paper();
    assert_eq!(paper.mirror_url(), "https://papers.cool/arxiv/2409.01234");
    assert_eq!(paper.pdf_url(), "https://arxiv.org/pdf/2409.01234");
    assert_eq!(paper.arxiv_id(), "2409.01234");
    assert_eq!(paper.primary_category(), "cs.CL");
  }

  #[test]
  fn test_filtered_stub_contains_reason() {
    let record = PaperRecord {
      paper:   sample_paper(),
      comment: "cat:cs.RO in blacklist".to_string(),
    };
    assert!(!record.is_chosen());
    let stub = record.render_stub();
    assert!(stub.contains("[Adaptive Retrieval for Grounded Generation]"));
    assert!(stub.contains("https://arxiv.org/abs/2409.01234"));
    assert!(stub.contains("cat:cs.RO in blacklist"));
    // untranslated title falls back to a placeholder
    assert!(stub.contains("**标题**: -"));
  }

  #[test]
  fn test_chosen_marker() {
    let record = PaperRecord { paper: sample_paper(), comment: CHOSEN.to_string() };
    assert!(record.is_chosen());
  }
}
