//! CLI administration tool for NanoLink.
//!
//! Converts between IDs and short codes and inspects stored data without
//! going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Short code of an ID, and back
//! cargo run --bin admin -- encode 62
//! cargo run --bin admin -- decode ba
//!
//! # Click counter of one code, or deployment totals
//! cargo run --bin admin -- stats ba
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL`, or `DB_HOST`/`DB_PORT`/`DB_USER`/`DB_PASSWORD`/`DB_NAME`
//!   (required for `stats` and `db`): PostgreSQL connection

use nanolink::config::Config;
use nanolink::domain::repositories::{ClickCounterRepository, LinkRepository};
use nanolink::infrastructure::persistence::{PgClickCounterRepository, PgLinkRepository};
use nanolink::utils::base62;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing NanoLink.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Print the short code of a numeric ID
    Encode {
        id: u64,
    },

    /// Print the numeric ID behind a short code
    Decode {
        code: String,
    },

    /// Show click statistics for one code, or totals when no code is given
    Stats {
        code: Option<String>,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Encode { id } => handle_encode(id),
        Commands::Decode { code } => handle_decode(&code)?,
        Commands::Stats { code } => {
            let pool = connect().await?;
            match code {
                Some(code) => handle_code_stats(&pool, &code).await?,
                None => handle_totals(&pool).await?,
            }
        }
        Commands::Db { action } => {
            let pool = connect().await?;
            handle_db_action(action, &pool).await?
        }
    }

    Ok(())
}

async fn connect() -> Result<PgPool> {
    let database_url = Config::load_database_url()?;

    PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")
}

fn handle_encode(id: u64) {
    println!(
        "  {} {} {}",
        id.to_string().bright_white(),
        "→".bright_black(),
        base62::encode(id).bright_green().bold()
    );
}

fn handle_decode(code: &str) -> Result<()> {
    let id = base62::decode(code).map_err(|e| anyhow::anyhow!("{}", e))?;

    println!(
        "  {} {} {}",
        code.bright_white(),
        "→".bright_black(),
        id.to_string().bright_green().bold()
    );

    Ok(())
}

/// Displays the link and click counter of one short code.
///
/// # Output Format
///
/// ```text
/// 📊 Statistics for ba
///
///   Long URL:      https://example.com/page
///   Created:       2025-01-15 10:30
///   Clicks:        42
///   Last click:    2025-01-16 14:20
/// ```
async fn handle_code_stats(pool: &PgPool, code: &str) -> Result<()> {
    base62::decode(code).map_err(|e| anyhow::anyhow!("{}", e))?;

    let pool = Arc::new(pool.clone());
    let links = PgLinkRepository::new(pool.clone());
    let counters = PgClickCounterRepository::new(pool);

    println!(
        "{} {}",
        "📊 Statistics for".bright_blue().bold(),
        code.cyan().bold()
    );
    println!();

    let link = links
        .find_by_code(code)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;

    let Some(link) = link else {
        println!("{}", "  Short code not found".yellow());
        return Ok(());
    };

    println!("  Long URL:      {}", link.long_url.bright_white());
    println!(
        "  Created:       {}",
        link.created_at
            .format("%Y-%m-%d %H:%M")
            .to_string()
            .bright_black()
    );

    let counter = counters
        .find_by_code(code)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;

    match counter {
        Some(counter) => {
            println!(
                "  Clicks:        {}",
                counter.click_count.to_string().bright_green().bold()
            );
            println!(
                "  Last click:    {}",
                counter
                    .last_clicked_at
                    .format("%Y-%m-%d %H:%M")
                    .to_string()
                    .bright_black()
            );
        }
        None => println!("  Clicks:        {}", "0".bright_black()),
    }
    println!();

    Ok(())
}

/// Displays deployment-wide totals.
async fn handle_totals(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let links_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM links")
        .fetch_one(pool)
        .await?;

    let clicks_count: i64 =
        sqlx::query_scalar("SELECT COALESCE(SUM(click_count), 0)::BIGINT FROM click_counters")
            .fetch_one(pool)
            .await?;

    let clicked_links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM click_counters")
        .fetch_one(pool)
        .await?;

    println!(
        "  Links:         {}",
        links_count.to_string().bright_green().bold()
    );
    println!(
        "  Clicks:        {}",
        clicks_count.to_string().bright_green().bold()
    );
    println!(
        "  Clicked links: {}",
        clicked_links.to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let max_id: Option<i64> = sqlx::query_scalar("SELECT MAX(id) FROM links")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL:    {}", version.bright_white());
            println!(
                "  Highest ID:    {}",
                max_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string())
                    .bright_white()
            );
            println!();
        }
    }

    Ok(())
}
