//! Operator CLI over an id-history store: stats, search, export, listings.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use id_history::auth::ChatAuthorizer;
use id_history::config::AppConfig;
use id_history::db::Database;
use id_history::export;
use id_history::logging::{init_logging, OperationTimer};
use id_history::metrics::MetricsCollector;
use id_history::models::ExportFormat;
use id_history::search::SearchEngine;
use id_history::validation::InputValidator;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show aggregate index counters
    Stats,
    /// Search the index by identifier
    Search {
        /// 10-digit identifier to look up
        #[arg(short, long)]
        identifier: String,

        /// Page offset to fetch
        #[arg(short, long, default_value_t = 0)]
        offset: u64,

        /// Acting operator id (for rate limiting and the search log)
        #[arg(short, long, default_value_t = 0)]
        user_id: i64,
    },
    /// Export the full row set for an identifier
    Export {
        /// 10-digit identifier to export
        #[arg(short, long)]
        identifier: String,

        /// Output format (csv or json)
        #[arg(short, long)]
        format: Option<String>,

        /// Output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// List authorized chats, most recently added first
    Chats,
    /// Show a user's recent searches
    Searches {
        /// User whose log to read
        #[arg(short, long)]
        user_id: i64,

        /// Maximum rows to show (defaults to the configured history limit)
        #[arg(short, long)]
        limit: Option<u64>,
    },
    /// Revoke a chat's authorization (superadmin only)
    Revoke {
        /// Chat whose authorization to drop
        #[arg(short, long)]
        chat_id: i64,

        /// Acting caller id, checked against the configured superadmin
        #[arg(short = 'u', long)]
        caller_id: i64,
    },
}

fn unix_now() -> Result<i64> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock before unix epoch")?;
    Ok(i64::try_from(now.as_secs()).unwrap_or(i64::MAX))
}

#[allow(clippy::print_stdout)]
fn main() -> Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    let _log_guard = init_logging(
        Some(&config.get_log_level()),
        config.logging.file_path.as_deref().map(std::path::Path::new),
    )?;
    MetricsCollector::init()?;

    let db = Arc::new(Database::new(&config.get_database_url())?);
    if config.auth.superadmin_id != 0 {
        db.add_admin(config.auth.superadmin_id)?;
    }
    let engine = SearchEngine::new(
        Arc::clone(&db),
        config.search.page_size,
        config.search.min_interval_secs,
    );

    let cli = Cli::parse();
    match cli.command {
        Commands::Stats => {
            let stats = engine.stats()?;
            println!(
                "identifiers: {}\nmessages: {}\nauthorized chats: {}",
                stats.distinct_identifiers, stats.total_messages, stats.authorized_chats
            );
        }
        Commands::Search {
            identifier,
            offset,
            user_id,
        } => {
            InputValidator::validate_identifier(&identifier)?;
            let timer = OperationTimer::new("cli_search");
            let page = if offset == 0 {
                engine.search(user_id, &identifier, unix_now()?)?
            } else {
                engine.next_page(&identifier, offset)?
            };
            timer.finish();

            if page.is_empty() {
                println!("no messages found for {identifier}");
                return Ok(());
            }
            for message in &page.items {
                println!(
                    "[{}] chat {} msg {} from {}: {}",
                    message.date,
                    message.chat_id,
                    message.message_id,
                    message.sender_username.as_deref().unwrap_or("-"),
                    message.text.as_deref().unwrap_or("(no text)")
                );
            }
            match page.next_offset {
                Some(next) => println!("{next}/{} (more available)", page.total),
                None => println!("{}/{}", page.total, page.total),
            }
        }
        Commands::Export {
            identifier,
            format,
            output_dir,
        } => {
            InputValidator::validate_identifier(&identifier)?;
            let format = match format
                .as_deref()
                .unwrap_or(config.export.default_format.as_str())
            {
                "json" => ExportFormat::Json,
                _ => ExportFormat::Csv,
            };
            let output_dir =
                output_dir.unwrap_or_else(|| PathBuf::from(&config.export.output_directory));

            let timer = OperationTimer::new("cli_export");
            let written = export::export_by_identifier(&db, &identifier, format, &output_dir)?;
            timer.finish();

            match written {
                Some(path) => {
                    info!(path = %path.display(), "export written");
                    println!("exported to {}", path.display());
                }
                None => println!("no messages found for {identifier}"),
            }
        }
        Commands::Chats => {
            for chat in db.list_authorized_chats()? {
                println!(
                    "{} [{}] added by {} at {}",
                    chat.title, chat.female_id, chat.added_by, chat.added_at
                );
            }
        }
        Commands::Searches { user_id, limit } => {
            let limit = limit.unwrap_or(config.search.history_limit);
            for entry in engine.recent_searches(user_id, limit)? {
                println!(
                    "{} \u{2022} {} \u{2022} {}",
                    entry.created_at, entry.query_type, entry.query_value
                );
            }
        }
        Commands::Revoke { chat_id, caller_id } => {
            let authorizer = ChatAuthorizer::new(
                Arc::clone(&db),
                config.auth.superadmin_id,
                Duration::from_secs(config.auth.membership_timeout_secs),
            );
            if authorizer.revoke(chat_id, caller_id)? {
                println!("authorization revoked for chat {chat_id}");
            } else {
                println!("chat {chat_id} was not authorized");
            }
        }
    }

    Ok(())
}
