//! khojney - quiz platform analytics and content CLI
//!
//! Runs the admin analytics report, the personal dashboard, leaderboards and
//! CSV bulk imports against the local store.

mod output;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use khojney_core::admin::user_overview;
use khojney_core::analytics::{
    generate_report, load_dashboard, load_leaderboard, AnalyticsScope, DateRange, HistoryFilter,
};
use khojney_core::import::{import_categories, import_questions, sample};
use khojney_core::quiz::load_result;
use khojney_core::{AuthSession, Config, Database, LeaderboardPeriod, SessionContext};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "khojney")]
#[command(about = "Khojney quiz platform - analytics and content tools")]
#[command(version)]
struct Args {
    /// Act as this user (profile id); the role is read from the profile
    #[arg(short, long, global = true, env = "KHOJNEY_USER")]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Admin analytics report for a date range (admin only)
    Analytics {
        /// First day of the range (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Last day of the range (YYYY-MM-DD, default: today)
        #[arg(long)]
        to: Option<String>,

        /// "all" or a user id
        #[arg(long, default_value = "all")]
        scope: String,

        /// Export format (md = markdown, json = JSON)
        #[arg(long)]
        export: Option<String>,
    },

    /// Personal dashboard of the signed-in user
    Dashboard {
        /// Category name to filter history by, or "all"
        #[arg(long, default_value = "all")]
        category: String,

        /// "started", "completed" or "all"
        #[arg(long, default_value = "all")]
        status: String,

        /// History page (1-based)
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Export format (json = JSON)
        #[arg(long)]
        export: Option<String>,
    },

    /// Show a leaderboard
    Leaderboard {
        /// all_time, monthly or weekly
        #[arg(long, default_value = "all_time")]
        period: String,

        /// Category slug; omit for the global board
        #[arg(long)]
        category: Option<String>,

        /// Maximum rows (default from config)
        #[arg(long)]
        limit: Option<usize>,

        /// Export format (json = JSON)
        #[arg(long)]
        export: Option<String>,
    },

    /// Review one of your quiz attempts question by question
    Review {
        attempt_id: String,

        /// Export format (json = JSON)
        #[arg(long)]
        export: Option<String>,
    },

    /// List users with a role breakdown (admin only)
    Users {
        /// Case-insensitive match on name or id
        #[arg(long)]
        search: Option<String>,

        /// Export format (json = JSON)
        #[arg(long)]
        export: Option<String>,
    },

    /// Bulk import a CSV file (admin only)
    Import {
        kind: ImportKind,
        file: PathBuf,
    },

    /// Print a sample CSV file
    Sample { kind: ImportKind },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ImportKind {
    Categories,
    Questions,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Samples need neither the store nor a session
    if let Command::Sample { kind } = &args.command {
        print_sample(*kind);
        return Ok(());
    }

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        khojney_core::logging::init(&config.logging).context("failed to initialize logging")?;

    // Open database
    let db_path = Config::database_path();
    let db = Arc::new(Database::open(&db_path).context("failed to open database")?);
    db.migrate().context("failed to run database migrations")?;

    let session = match &args.user {
        Some(user_id) => SessionContext::signed_in(&db, AuthSession::new(user_id.clone())),
        None => SessionContext::anonymous(),
    };
    tracing::debug!(command = ?args.command, user = ?args.user, "Running command");

    match args.command {
        Command::Analytics {
            from,
            to,
            scope,
            export,
        } => {
            let range = resolve_range(
                from.as_deref(),
                to.as_deref(),
                config.analytics.default_range_days,
            )?;
            let report = generate_report(
                Arc::clone(&db),
                &session,
                range,
                &AnalyticsScope::parse(&scope),
                &config.analytics,
            )
            .context("failed to generate analytics report")?;

            match export.as_deref() {
                Some("json") => output::print_json(&report)?,
                Some("md") => output::print_report_markdown(&report),
                Some(other) => anyhow::bail!("Unknown export format: {}. Use 'md' or 'json'", other),
                None => output::print_report_terminal(&report),
            }
        }

        Command::Dashboard {
            category,
            status,
            page,
            export,
        } => {
            let dashboard =
                load_dashboard(&db, &session).context("failed to load dashboard")?;
            let filter = HistoryFilter::parse(&category, &status)
                .context("invalid history filter")?;
            let history = dashboard.history(&filter, page, config.dashboard.attempts_per_page);

            match export.as_deref() {
                Some("json") => output::print_json(&serde_json::json!({
                    "dashboard": dashboard,
                    "available_categories": dashboard.available_categories(),
                    "history": history,
                }))?,
                Some(other) => anyhow::bail!("Unknown export format: {}. Use 'json'", other),
                None => output::print_dashboard_terminal(&dashboard, &history),
            }
        }

        Command::Leaderboard {
            period,
            category,
            limit,
            export,
        } => {
            let category_id = match category.as_deref() {
                Some(slug) => Some(
                    db.get_category_by_slug(slug)?
                        .with_context(|| format!("No category with slug '{}'", slug))?
                        .id,
                ),
                None => None,
            };
            let view = load_leaderboard(
                &db,
                &session,
                LeaderboardPeriod::parse_or_default(&period),
                category_id.as_deref(),
                limit.unwrap_or(config.leaderboard.limit),
            )
            .context("failed to load leaderboard")?;

            match export.as_deref() {
                Some("json") => output::print_json(&view)?,
                Some(other) => anyhow::bail!("Unknown export format: {}. Use 'json'", other),
                None => output::print_leaderboard_terminal(&view),
            }
        }

        Command::Review { attempt_id, export } => {
            let result = load_result(&db, &session, &attempt_id)
                .with_context(|| format!("failed to load result {}", attempt_id))?;

            match export.as_deref() {
                Some("json") => output::print_json(&result)?,
                Some(other) => anyhow::bail!("Unknown export format: {}. Use 'json'", other),
                None => output::print_result_terminal(&result),
            }
        }

        Command::Users { search, export } => {
            let overview = user_overview(&db, &session, search.as_deref())
                .context("failed to list users")?;

            match export.as_deref() {
                Some("json") => output::print_json(&overview)?,
                Some(other) => anyhow::bail!("Unknown export format: {}. Use 'json'", other),
                None => output::print_users_terminal(&overview),
            }
        }

        Command::Import { kind, file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let (summary, noun) = match kind {
                ImportKind::Categories => (import_categories(&db, &session, &text), "categories"),
                ImportKind::Questions => (import_questions(&db, &session, &text), "questions"),
            };
            let summary = summary.with_context(|| format!("failed to import {}", noun))?;
            println!("Successfully added {} {}!", summary.inserted, noun);
        }

        Command::Sample { kind } => print_sample(kind),
    }

    Ok(())
}

fn print_sample(kind: ImportKind) {
    match kind {
        ImportKind::Categories => print!("{}", sample::categories_csv()),
        ImportKind::Questions => print!("{}", sample::questions_csv()),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD", s))
}

/// `to` defaults to today and `from` to `default_days` before `to`.
fn resolve_range(from: Option<&str>, to: Option<&str>, default_days: u32) -> Result<DateRange> {
    let to = match to {
        Some(s) => parse_date(s)?,
        None => Utc::now().date_naive(),
    };
    match from {
        Some(s) => DateRange::new(parse_date(s)?, to).context("invalid report range"),
        None => Ok(DateRange::last_days(to, default_days)),
    }
}
