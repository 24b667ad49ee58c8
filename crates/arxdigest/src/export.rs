//! The paper export pipeline.
//!
//! An [`Exporter`] walks a closed date range one calendar day at a time, in
//! ascending order. For each day it loads the papers announced on that day,
//! partitions them by the category policy, renders the chosen records
//! (grouped by primary category, in lexicographic code order) with
//! per-paper enrichment, writes exactly one day file, and - when at least
//! one record was chosen - publishes that file to the FTP server and the
//! knowledge base.
//!
//! Failure isolation follows the taxonomy in [`crate::errors`]: store
//! errors propagate, everything downstream (PDF download, PDF translation,
//! uploads, knowledge base submission) is logged per paper or per day and
//! never aborts the run. A day with zero chosen papers still produces a
//! local day file; it just skips the publish step.

use std::collections::BTreeMap;

use tokio::process::Command;

use super::*;
use crate::{
  categories::{self, Lang},
  chunk,
  clients::{ChunkingRule, KnowledgeBaseClient, OllamaClient},
  config::PdfTranslateConfig,
  ftp,
  paper::CHOSEN,
};

/// Column schema of the CSV rendering. The order is a format contract with
/// downstream spreadsheet tooling.
const CSV_HEADERS: [&str; 13] = [
  "Title",
  "Interest",
  "Title Translated",
  "Categories",
  "Authors",
  "URL",
  "PapersCool",
  "First Submitted Date",
  "First Announced Date",
  "Abstract",
  "Abstract Translated",
  "Comments",
  "Note",
];

/// The export pipeline over one configured date range.
pub struct Exporter {
  /// Record store holding the crawled papers
  db:             Database,
  /// Validated pipeline configuration
  config:         ExportConfig,
  /// First day of the range, inclusive
  date_from:      NaiveDate,
  /// Last day of the range, inclusive
  date_until:     NaiveDate,
  /// Category codes papers must intersect to be chosen
  whitelist:      HashSet<String>,
  /// Category codes that reject a whitelisted paper
  blacklist:      HashSet<String>,
  /// Optional LLM for Chinese titles and abstract summaries
  generator:      Option<OllamaClient>,
  /// Optional knowledge base ingestion client
  knowledge_base: Option<KnowledgeBaseClient>,
}

/// The fixed 7-line metadata header of every day file.
///
/// Downstream knowledge-base ingestion strips exactly
/// [`chunk::HEADER_LINES`] lines before chunking, so this block is always
/// the same height, with `-` placeholders when no preface metadata is
/// given.
fn day_header(date: NaiveDate, chosen_count: usize, meta: Option<&PrefaceMeta>) -> String {
  let (whitelist, keywords) = match meta {
    Some(meta) => {
      (meta.category_whitelist.join(","), meta.optional_keywords.join(", "))
    },
    None => ("-".to_string(), "-".to_string()),
  };
  format!(
    "# 论文全览：{date}\n\n共有{chosen_count}篇相关领域论文\n\n> 领域白名单：{whitelist}\n> 关键词：{keywords}\n\n"
  )
}

/// Downloads a PDF to the given path. The caller checks for an existing
/// file first, so re-runs are idempotent.
async fn download_pdf(url: &str, dest: &Path) -> Result<(), DigestError> {
  debug!("downloading {url} to {}", dest.display());
  let response = reqwest::get(url).await?.error_for_status()?;
  let bytes = response.bytes().await?;
  tokio::fs::write(dest, &bytes).await?;
  Ok(())
}

/// Runs the external PDF translation tool on one file, writing the `-mono`
/// and `-dual` outputs next to it.
async fn translate_pdf(
  config: &PdfTranslateConfig,
  pdf_file: &Path,
  output_dir: &Path,
) -> Result<(), DigestError> {
  let output = Command::new(&config.program)
    .arg(pdf_file)
    .args(["-t", &config.threads.to_string()])
    .args(["-li", "en", "-lo", "zh"])
    .args(["-s", &config.service])
    .arg("-o")
    .arg(output_dir)
    .output()
    .await?;

  if !output.status.success() {
    return Err(DigestError::Api(format!(
      "pdf translator exited with {}: {}",
      output.status,
      String::from_utf8_lossy(&output.stderr)
    )));
  }
  Ok(())
}

impl Exporter {
  /// Opens the store and builds a pipeline for `[date_from, date_until]`
  /// inclusive. The configuration is validated here, not at first use.
  pub async fn new(
    config: ExportConfig,
    date_from: NaiveDate,
    date_until: NaiveDate,
  ) -> Result<Self, DigestError> {
    config.validate()?;
    if date_from > date_until {
      return Err(DigestError::Config(format!(
        "date_from {date_from} is after date_until {date_until}"
      )));
    }

    let db = Database::open(&config.database_path).await?;
    let generator = config.ollama.clone().map(OllamaClient::new);
    let knowledge_base = config.dify.clone().map(KnowledgeBaseClient::new);
    let whitelist = config.categories_whitelist.iter().cloned().collect();
    let blacklist = config.categories_blacklist.iter().cloned().collect();

    Ok(Self {
      db,
      config,
      date_from,
      date_until,
      whitelist,
      blacklist,
      generator,
      knowledge_base,
    })
  }

  /// Read access to the underlying store.
  pub fn database(&self) -> &Database { &self.db }

  /// Partitions papers into chosen and filtered records by category policy.
  ///
  /// Total and exhaustive: every paper lands in exactly one partition.
  /// The whitelist check runs first; a paper with no whitelisted category
  /// is rejected with a whitelist reason even when it also intersects the
  /// blacklist.
  pub fn filter_papers(&self, papers: Vec<Paper>) -> (Vec<PaperRecord>, Vec<PaperRecord>) {
    let mut chosen = Vec::new();
    let mut filtered = Vec::new();

    for paper in papers {
      if !paper.categories.iter().any(|c| self.whitelist.contains(c)) {
        let comment = format!("none of {} in whitelist", paper.categories.join(","));
        filtered.push(PaperRecord { paper, comment });
        continue;
      }
      let black: Vec<&str> = paper
        .categories
        .iter()
        .filter(|c| self.blacklist.contains(*c))
        .map(String::as_str)
        .collect();
      if !black.is_empty() {
        let comment = format!("cat:{} in blacklist", black.join(","));
        filtered.push(PaperRecord { paper, comment });
      } else {
        chosen.push(PaperRecord { paper, comment: CHOSEN.to_string() });
      }
    }
    (chosen, filtered)
  }

  /// Renders one day per file over the whole range and publishes the days
  /// that chose at least one paper.
  pub async fn to_markdown(&self, meta: Option<&PrefaceMeta>) -> Result<(), DigestError> {
    let output_dir = &self.config.paths.output_dir;
    tokio::fs::create_dir_all(output_dir).await?;

    let mut date = self.date_from;
    while date <= self.date_until {
      let papers = self.db.fetch_by_date(date).await?;
      let (chosen, filtered) = self.filter_papers(papers);

      let mut body = String::new();
      let mut groups: BTreeMap<&str, Vec<&PaperRecord>> = BTreeMap::new();
      for record in &chosen {
        groups.entry(record.paper.primary_category()).or_default().push(record);
      }
      for (code, records) in &groups {
        let name_en = categories::localize(&[code], Lang::En).remove(0);
        let name_zh = categories::localize(&[code], Lang::Zh).remove(0);
        body.push_str(&format!("## {name_zh}({code}:{name_en})\n\n"));
        for record in records {
          body.push_str(&self.render_paper(&record.paper, date).await);
        }
      }

      let file_path = output_dir.join(format!("{date}.md"));
      let content = format!("{}{body}", day_header(date, chosen.len(), meta));
      tokio::fs::write(&file_path, &content).await?;

      if !chosen.is_empty() {
        if let Err(e) = self.publish_day(date, &file_path).await {
          warn!("publishing day {date} failed: {e}");
        }
      }

      info!(
        "output {date}.md completed. {} papers chosen, {} papers filtered",
        chosen.len(),
        filtered.len()
      );
      date = date.succ_opt().expect("date in supported range");
    }
    Ok(())
  }

  /// Renders the full Markdown block for a chosen paper, running the
  /// per-paper enrichment side effects (summary file, PDF download and
  /// translation, artifact upload) along the way. Enrichment is
  /// best-effort: a failure is logged and the block is rendered with
  /// whatever artifacts exist.
  async fn render_paper(&self, paper: &Paper, date: NaiveDate) -> String {
    let title_zh = match &self.generator {
      Some(generator) => generator.translate(&paper.title).await,
      None => None,
    }
    .or_else(|| paper.title_translated.clone())
    .unwrap_or_else(|| "-".to_string());

    let summary = match &self.generator {
      Some(generator) => generator.translate(&paper.abstract_text).await,
      None => None,
    };
    let abstract_section = match &summary {
      Some(summary) => format!("> **摘要**: {summary}"),
      None => format!("- **Abstract**: {}", paper.abstract_text),
    };

    if let Err(e) = self.enrich_paper(paper, date, summary.as_deref()).await {
      warn!("enrichment for {} failed: {e}", paper.arxiv_id());
    }

    let categories_zh = categories::localize(&paper.categories, Lang::Zh).join(",");
    format!(
      "> **英文标题**: {}\n> **中文标题**: {title_zh}\n> **作者**: {}\n> **首次提交**: \
             {}\n> **首次公告**: {date}\n> **原文链接**: {}\n> **原文PDF链接**: {}\n> \
             **comment**: {}\n> **领域**: {categories_zh}\n{abstract_section}\n\n",
      paper.title,
      paper.authors,
      paper.first_submitted_date,
      paper.url,
      paper.pdf_url(),
      paper.comments,
    )
  }

  /// Produces and publishes the per-paper artifacts: the abstract+summary
  /// file, the original PDF (downloaded once), its translations (generated
  /// once), and an upload of whichever of those exist. Each sub-step is
  /// individually best-effort.
  async fn enrich_paper(
    &self,
    paper: &Paper,
    date: NaiveDate,
    summary: Option<&str>,
  ) -> Result<(), DigestError> {
    let id = paper.arxiv_id();
    let local_dir = self.config.paths.tmp_dir.join(id);
    tokio::fs::create_dir_all(&local_dir).await?;

    let summary_file = local_dir.join("摘要.md");
    let pdf_file = local_dir.join(format!("{id}.pdf"));
    let mono_pdf = local_dir.join(format!("{id}-mono.pdf"));
    let dual_pdf = local_dir.join(format!("{id}-dual.pdf"));

    let flat_abstract = paper.abstract_text.replace("\r\n", "").replace('\n', "");
    let summary_text = match summary {
      Some(summary) => format!("{flat_abstract}\n\n{summary}"),
      None => flat_abstract,
    };
    tokio::fs::write(&summary_file, summary_text).await?;

    if !pdf_file.exists() {
      if let Err(e) = download_pdf(&paper.pdf_url(), &pdf_file).await {
        warn!("PDF download for {id} failed: {e}");
      }
    }
    if let Some(pdf_config) = &self.config.pdf_translate {
      if pdf_file.exists() && !mono_pdf.exists() {
        if let Err(e) = translate_pdf(pdf_config, &pdf_file, &local_dir).await {
          warn!("PDF translation for {id} failed: {e}");
        }
      }
    }

    let remote_prefix = format!("{}/{date}/{id}", self.config.paths.remote_graph_dir);
    let mut uploads = Vec::new();
    for (local, name) in [
      (&summary_file, "摘要.md".to_string()),
      (&pdf_file, format!("{id}.pdf")),
      (&mono_pdf, format!("{id}-mono.pdf")),
      (&dual_pdf, format!("{id}-dual.pdf")),
    ] {
      if local.exists() {
        uploads.push((local.clone(), format!("{remote_prefix}/{name}")));
      }
    }
    if !uploads.is_empty() {
      let ftp_config = self.config.ftp.clone();
      tokio::task::spawn_blocking(move || ftp::upload_batch(&ftp_config, &uploads)).await??;
    }
    Ok(())
  }

  /// Publishes a finished day file: FTP upload under the configured base
  /// path, then a staging copy, header strip, chunk preprocessing, and
  /// knowledge base submission (always a fresh document; replacement is
  /// handled out-of-band).
  async fn publish_day(&self, date: NaiveDate, day_file: &Path) -> Result<(), DigestError> {
    let file_name = format!("{date}.md");
    let remote = format!("{}/{date}/{file_name}", self.config.ftp.base_path);
    let ftp_config = self.config.ftp.clone();
    let uploads = vec![(day_file.to_path_buf(), remote)];
    tokio::task::spawn_blocking(move || ftp::upload_batch(&ftp_config, &uploads)).await??;

    if let (Some(kb), Some(dify)) = (&self.knowledge_base, &self.config.dify) {
      let staging = day_file.with_file_name(format!("{}{file_name}", dify.file_prefix));
      tokio::fs::copy(day_file, &staging).await?;

      let content = tokio::fs::read_to_string(&staging).await?;
      let processed = chunk::process_document(chunk::strip_metadata_header(&content));
      let processed_path =
        day_file.with_file_name(format!("Processed_{}{file_name}", dify.file_prefix));
      tokio::fs::write(&processed_path, processed).await?;

      if let Err(e) =
        kb.create_document_from_file(&processed_path, None, &ChunkingRule::default()).await
      {
        warn!("knowledge base submission for {date} failed: {e}");
      }
      if let Err(e) = tokio::fs::remove_file(&processed_path).await {
        warn!("failed to remove temp file {}: {e}", processed_path.display());
      }
    }
    Ok(())
  }

  /// Renders the same per-day partition as CSV rows instead of Markdown.
  /// One file per day, chosen rows first, no publish step.
  pub async fn to_csv(&self) -> Result<(), DigestError> {
    let output_dir = &self.config.paths.output_dir;
    tokio::fs::create_dir_all(output_dir).await?;

    let mut date = self.date_from;
    while date <= self.date_until {
      let papers = self.db.fetch_by_date(date).await?;
      let (chosen, filtered) = self.filter_papers(papers);

      let path = output_dir.join(format!("{date}.csv"));
      let mut writer = csv::Writer::from_path(&path)?;
      writer.write_record(CSV_HEADERS)?;

      for record in chosen.iter().chain(filtered.iter()) {
        let paper = &record.paper;
        let categories = paper.categories.join(",");
        let mirror = paper.mirror_url();
        let submitted = paper.first_submitted_date.to_string();
        let announced =
          paper.first_announced_date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string());
        writer.write_record([
          paper.title.as_str(),
          if record.is_chosen() { "chosen" } else { "filtered" },
          paper.title_translated.as_deref().unwrap_or("-"),
          categories.as_str(),
          paper.authors.as_str(),
          paper.url.as_str(),
          mirror.as_str(),
          submitted.as_str(),
          announced.as_str(),
          paper.abstract_text.as_str(),
          paper.abstract_translated.as_deref().unwrap_or("-"),
          paper.comments.as_str(),
          record.comment.as_str(),
        ])?;
      }
      writer.flush()?;

      info!(
        "output {date}.csv completed. {} papers chosen, {} papers filtered",
        chosen.len(),
        filtered.len()
      );
      date = date.succ_opt().expect("date in supported range");
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use tempfile::{tempdir, TempDir};
  use tracing_test::traced_test;

  use super::*;
  use crate::config::{FtpConfig, PathsConfig};

  fn test_config(dir: &TempDir) -> ExportConfig {
    ExportConfig {
      database_path:        dir.path().join("papers.db"),
      categories_whitelist: vec![
        "cs.CV".to_string(),
        "cs.AI".to_string(),
        "cs.LG".to_string(),
        "cs.CL".to_string(),
      ],
      categories_blacklist: vec!["cs.RO".to_string()],
      ftp:                  FtpConfig {
        host:      "ftp.invalid".to_string(),
        user:      "paper".to_string(),
        password:  "secret".to_string(),
        base_path: "/AI/paper".to_string(),
      },
      paths:                PathsConfig {
        tmp_dir:          dir.path().join("tmp"),
        remote_graph_dir: "/AI/paper/graph".to_string(),
        output_dir:       dir.path().join("output"),
      },
      ollama:               None,
      dify:                 None,
      pdf_translate:        None,
    }
  }

  fn test_paper(id: &str, categories: &[&str], announced: NaiveDate) -> Paper {
    Paper {
      url:                  format!("https://arxiv.org/abs/{id}"),
      title:                format!("Paper {id}"),
      authors:              "John Doe".to_string(),
      abstract_text:        "An abstract.".to_string(),
      comments:             "8 pages".to_string(),
      categories:           categories.iter().map(|c| c.to_string()).collect(),
      first_submitted_date: NaiveDate::from_ymd_opt(2024, 8, 30).unwrap(),
      first_announced_date: Some(announced),
      title_translated:     None,
      abstract_translated:  None,
    }
  }

  async fn test_exporter(dir: &TempDir, from: NaiveDate, until: NaiveDate) -> Exporter {
    Exporter::new(test_config(dir), from, until).await.unwrap()
  }

  #[tokio::test]
  async fn test_filter_is_total_and_exhaustive() {
    let dir = tempdir().unwrap();
    let announced = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
    let exporter = test_exporter(&dir, announced, announced).await;

    let papers = vec![
      test_paper("2409.00001", &["cs.CL"], announced),
      test_paper("2409.00002", &["math.NT"], announced),
      test_paper("2409.00003", &["cs.CV", "cs.RO"], announced),
    ];
    let (chosen, filtered) = exporter.filter_papers(papers);
    assert_eq!(chosen.len() + filtered.len(), 3);
    assert_eq!(chosen.len(), 1);
    assert!(chosen[0].paper.url.ends_with("2409.00001"));
    assert!(chosen.iter().all(|r| r.is_chosen()));
    assert!(filtered.iter().all(|r| !r.is_chosen()));
  }

  #[tokio::test]
  async fn test_filter_reasons() {
    let dir = tempdir().unwrap();
    let announced = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
    let exporter = test_exporter(&dir, announced, announced).await;

    let (_, filtered) = exporter.filter_papers(vec![
      test_paper("2409.00001", &["math.NT", "math.AG"], announced),
      test_paper("2409.00002", &["cs.CV", "cs.RO"], announced),
    ]);
    assert_eq!(filtered[0].comment, "none of math.NT,math.AG in whitelist");
    assert_eq!(filtered[1].comment, "cat:cs.RO in blacklist");
  }

  #[tokio::test]
  async fn test_whitelist_rejection_takes_precedence_over_blacklist() {
    let dir = tempdir().unwrap();
    let announced = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
    let exporter = test_exporter(&dir, announced, announced).await;

    // blacklisted AND not whitelisted: the whitelist reason must win
    let (chosen, filtered) =
      exporter.filter_papers(vec![test_paper("2409.00001", &["cs.RO"], announced)]);
    assert!(chosen.is_empty());
    assert_eq!(filtered[0].comment, "none of cs.RO in whitelist");
  }

  #[test]
  fn test_day_header_is_exactly_seven_lines() {
    let date = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
    let header = day_header(date, 3, None);
    assert_eq!(header.lines().count(), 7);
    assert_eq!(header.matches('\n').count(), 7);
    assert!(header.contains("2024-09-02"));
    assert!(header.contains("共有3篇"));
    assert!(header.contains("> 领域白名单：-"));

    let meta = PrefaceMeta {
      category_whitelist: vec!["cs.CL".to_string(), "cs.CV".to_string()],
      optional_keywords:  vec!["retrieval".to_string(), "agents".to_string()],
    };
    let header = day_header(date, 0, Some(&meta));
    assert_eq!(header.lines().count(), 7);
    assert!(header.contains("> 领域白名单：cs.CL,cs.CV"));
    assert!(header.contains("> 关键词：retrieval, agents"));
  }

  #[tokio::test]
  async fn test_to_markdown_writes_one_file_per_day_on_empty_store() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let from = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
    let until = NaiveDate::from_ymd_opt(2024, 9, 4).unwrap();
    let exporter = test_exporter(&dir, from, until).await;

    exporter.to_markdown(None).await?;

    for day in ["2024-09-02", "2024-09-03", "2024-09-04"] {
      let content = std::fs::read_to_string(dir.path().join("output").join(format!("{day}.md")))?;
      assert!(content.contains("共有0篇"));
      // header only, no body
      assert_eq!(content.lines().count(), 7);
    }
    Ok(())
  }

  #[tokio::test]
  async fn test_to_markdown_filtered_only_day_skips_publish() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let announced = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
    let exporter = test_exporter(&dir, announced, announced).await;

    // not in the whitelist, so the day has zero chosen papers and the
    // publish step (which would hit the network) never runs
    exporter
      .database()
      .upsert(vec![test_paper("2409.00001", &["math.NT"], announced)])
      .await?;
    exporter.to_markdown(None).await?;

    let content =
      std::fs::read_to_string(dir.path().join("output").join("2024-09-02.md"))?;
    assert!(content.contains("共有0篇"));
    // filtered records appear in the CSV rendering only, never in the day
    // file body
    assert!(!content.contains("Paper 2409.00001"));
    assert!(!content.contains("Filtered Reason"));
    Ok(())
  }

  #[tokio::test]
  #[traced_test]
  async fn test_to_markdown_logs_per_day_counts() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let announced = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
    let exporter = test_exporter(&dir, announced, announced).await;

    exporter
      .database()
      .upsert(vec![test_paper("2409.00001", &["math.NT"], announced)])
      .await?;
    exporter.to_markdown(None).await?;

    assert!(logs_contain(
      "output 2024-09-02.md completed. 0 papers chosen, 1 papers filtered"
    ));
    Ok(())
  }

  #[tokio::test]
  async fn test_to_csv_renders_partition_with_reasons() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let announced = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
    let exporter = test_exporter(&dir, announced, announced).await;

    exporter
      .database()
      .upsert(vec![
        test_paper("2409.00001", &["cs.CL"], announced),
        test_paper("2409.00002", &["cs.CV", "cs.RO"], announced),
      ])
      .await?;
    exporter.to_csv().await?;

    let content =
      std::fs::read_to_string(dir.path().join("output").join("2024-09-02.csv"))?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Title,Interest,"));
    // chosen rows come first
    assert!(lines[1].contains("chosen"));
    assert!(lines[1].contains("https://papers.cool/arxiv/2409.00001"));
    assert!(lines[2].contains("filtered"));
    assert!(lines[2].contains("cat:cs.RO in blacklist"));
    Ok(())
  }

  #[tokio::test]
  async fn test_new_rejects_inverted_date_range() {
    let dir = tempdir().unwrap();
    let from = NaiveDate::from_ymd_opt(2024, 9, 4).unwrap();
    let until = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
    assert!(matches!(
      Exporter::new(test_config(&dir), from, until).await,
      Err(DigestError::Config(_))
    ));
  }
}
