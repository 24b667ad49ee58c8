use std::path::PathBuf;

use arxdigest::{
  clients::{KnowledgeBaseClient, TranslateClient},
  config::{ExportConfig, PrefaceMeta},
  database::Database,
  export::Exporter,
  schedule,
};
use chrono::{NaiveDate, Utc};
use clap::{builder::ArgAction, Parser, Subcommand, ValueEnum};
use console::{style, Emoji};
use errors::DigestdErrors;
use tracing::trace;
use tracing_subscriber::EnvFilter;

pub mod errors;

static BOOKS: Emoji<'_, '_> = Emoji("📚 ", "");
static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "");
static CLOCK: Emoji<'_, '_> = Emoji("🕛 ", "");
static GLOBE: Emoji<'_, '_> = Emoji("🌐 ", "");
static WARNING: Emoji<'_, '_> = Emoji("⚠️  ", "");
static SUCCESS: Emoji<'_, '_> = Emoji("✨ ", "");

#[derive(Parser)]
#[command(author, version, about = "CLI for the arxdigest paper export pipeline")]
struct Cli {
  /// Verbose mode (-v, -vv, -vvv)
  #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase logging verbosity"
    )]
  verbose: u8,

  #[command(subcommand)]
  command: Commands,
}

/// Output format of the `export` command.
#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
  /// Day-partitioned Markdown digests (published when a day chose papers)
  Md,
  /// Day-partitioned CSV tables (local only)
  Csv,
}

#[derive(Subcommand)]
enum Commands {
  /// Export day digests over a date range
  Export {
    /// Path to the pipeline configuration file
    #[arg(long, short)]
    config:   PathBuf,
    /// First day to export (defaults to the until day)
    #[arg(long)]
    from:     Option<NaiveDate>,
    /// Last day to export (defaults to today, UTC)
    #[arg(long)]
    until:    Option<NaiveDate>,
    /// Output format
    #[arg(long, value_enum, default_value = "md")]
    format:   ExportFormat,
    /// Keywords echoed into each day file header (repeatable)
    #[arg(long = "keyword")]
    keywords: Vec<String>,
  },
  /// Backfill missing title and abstract translations in the store
  Backfill {
    /// Path to the pipeline configuration file
    #[arg(long, short)]
    config: PathBuf,
  },
  /// Show store statistics and the next feed update time
  Status {
    /// Path to the database file
    #[arg(long, short)]
    path: Option<PathBuf>,
  },
  /// Print the next arXiv feed update time
  NextUpdate {
    /// Evaluate as of this UTC date's midnight instead of now
    #[arg(long)]
    date: Option<NaiveDate>,
  },
  /// Knowledge base administration
  Kb {
    /// Path to the pipeline configuration file
    #[arg(long, short)]
    config: PathBuf,

    #[command(subcommand)]
    command: KbCommands,
  },
  /// Removes the entire database
  Clean {
    /// Path to the database file
    #[arg(long, short)]
    path:            Option<PathBuf>,
    /// Skip interactive confirmation prompts
    #[arg(long)]
    accept_defaults: bool,
  },
}

#[derive(Subcommand)]
enum KbCommands {
  /// List documents in the configured dataset
  List {
    /// Page number
    #[arg(long, default_value_t = 1)]
    page:  u32,
    /// Documents per page
    #[arg(long, default_value_t = 20)]
    limit: u32,
  },
  /// Delete a document from the configured dataset
  Delete {
    /// Knowledge-base-assigned document id
    id: String,
  },
}

/// Setup logging with the specified verbosity level
fn setup_logging(verbosity: u8) {
  let filter = match verbosity {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  };

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_file(true)
    .with_line_number(true)
    .with_thread_ids(true)
    .with_target(true)
    .init();
}

#[tokio::main]
async fn main() -> Result<(), DigestdErrors> {
  let cli = Cli::parse();
  setup_logging(cli.verbose);

  match cli.command {
    Commands::Export { config, from, until, format, keywords } => {
      let config = ExportConfig::from_file(&config)?;
      let until = until.unwrap_or_else(|| Utc::now().date_naive());
      let from = from.unwrap_or(until);

      println!(
        "{} Exporting {} through {}",
        style(ROCKET).cyan(),
        style(from).yellow(),
        style(until).yellow()
      );

      let meta = PrefaceMeta {
        category_whitelist: config.categories_whitelist.clone(),
        optional_keywords:  keywords,
      };
      let exporter = Exporter::new(config, from, until).await?;

      match format {
        ExportFormat::Md => exporter.to_markdown(Some(&meta)).await?,
        ExportFormat::Csv => exporter.to_csv().await?,
      }

      println!("{} Export complete", style(SUCCESS).green());
      Ok(())
    },

    Commands::Backfill { config } => {
      let config = ExportConfig::from_file(&config)?;
      trace!("Using database at: {}", config.database_path.display());
      let db = Database::open(&config.database_path).await?;

      println!("{} Backfilling missing translations", style(GLOBE).cyan());

      let client = TranslateClient::new();
      let translate = move |text: String| {
        let client = client.clone();
        async move { client.translate(&text, "zh-CN").await }
      };
      let written = db.fill_missing_translations(translate).await?;

      println!(
        "{} Backfill complete, {} papers updated",
        style(SUCCESS).green(),
        style(written).yellow()
      );
      Ok(())
    },

    Commands::Status { path } => {
      let path = path.unwrap_or_else(Database::default_path);
      trace!("Using database at: {}", path.display());
      let db = Database::open(&path).await?;

      println!("{} Database: {}", style(BOOKS).cyan(), style(path.display()).yellow());

      let papers = db.fetch_all().await?;
      println!("   {} {}", style("Papers:").green().bold(), style(papers.len()).white());

      match db.latest_crawl_time().await {
        Ok(crawl_time) => {
          println!("   {} {}", style("Last crawl:").green().bold(), style(crawl_time).white());
        },
        Err(arxdigest::errors::DigestError::EmptyStore) => {
          println!("   {} store is empty", style("Last crawl:").green().bold());
        },
        Err(e) => return Err(e.into()),
      }

      println!(
        "   {} {}",
        style("Next update:").green().bold(),
        style(schedule::next_update_time(Utc::now())).white()
      );
      Ok(())
    },

    Commands::NextUpdate { date } => {
      let now = match date {
        Some(date) => {
          date.and_hms_opt(0, 0, 0).expect("midnight exists").and_utc()
        },
        None => Utc::now(),
      };

      println!(
        "{} Next feed update: {}",
        style(CLOCK).cyan(),
        style(schedule::next_update_time(now)).yellow()
      );
      Ok(())
    },

    Commands::Kb { config, command } => {
      let config = ExportConfig::from_file(&config)?;
      let dify = config.dify.ok_or_else(|| {
        arxdigest::errors::DigestError::Config("configuration has no dify section".into())
      })?;
      let kb = KnowledgeBaseClient::new(dify);

      match command {
        KbCommands::List { page, limit } => {
          let documents = kb.list_documents(page, limit).await?;
          if documents.is_empty() {
            println!("{} No documents on page {}", style(WARNING).yellow(), style(page).yellow());
          } else {
            println!(
              "{} {} documents on page {}:",
              style(BOOKS).cyan(),
              style(documents.len()).yellow(),
              style(page).yellow()
            );
            for document in documents {
              println!("   {} {}", style(&document.id).cyan(), style(&document.name).white());
            }
          }
        },
        KbCommands::Delete { id } => {
          kb.delete_document(&id).await?;
          println!("{} Deleted document {}", style(SUCCESS).green(), style(&id).yellow());
        },
      }
      Ok(())
    },

    Commands::Clean { path, accept_defaults } => {
      let path = path.unwrap_or_else(Database::default_path);
      if path.exists() {
        println!(
          "{} Database found at: {}",
          style(WARNING).yellow(),
          style(path.display()).yellow()
        );

        if !accept_defaults {
          // First confirmation
          if !dialoguer::Confirm::new()
            .with_prompt("Are you sure you want to delete this database?")
            .default(false)
            .wait_for_newline(true)
            .interact()?
          {
            println!("{} Operation cancelled", style("✖").red());
            return Ok(());
          }

          // Require typing DELETE for final confirmation
          let input = dialoguer::Input::<String>::new()
            .with_prompt(format!(
              "{} Type {} to confirm deletion",
              style("⚠️").red(),
              style("DELETE").red().bold()
            ))
            .interact_text()?;

          if input != "DELETE" {
            println!("{} Operation cancelled", style("✖").red());
            return Ok(());
          }
        }

        // Proceed with deletion
        println!(
          "{} Removing database: {}",
          style(WARNING).yellow(),
          style(path.display()).yellow()
        );
        std::fs::remove_file(&path)?;

        // Also remove any auxiliary files (WAL, journal)
        let aux_files = glob::glob(&format!("{}*", path.display()))?;
        for file in aux_files.flatten() {
          std::fs::remove_file(file)?;
        }
        println!("{} Database files cleaned", style(SUCCESS).green());
      } else {
        println!(
          "{} No database found at: {}",
          style(WARNING).yellow(),
          style(path.display()).yellow()
        );
      }
      Ok(())
    },
  }
}
