//! # khojney-core
//!
//! Core library for khojney - a quiz and trivia platform.
//!
//! This library provides:
//! - Domain types for categories, questions, attempts and leaderboards
//! - Database storage layer with SQLite
//! - The analytics pipeline behind the admin report and personal dashboard
//! - CSV bulk import of categories and questions
//! - Session and role gating, quiz play
//! - Configuration management and logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use khojney_core::analytics::{generate_report, AnalyticsScope, DateRange};
//! use khojney_core::auth::{AuthSession, SessionContext};
//! use khojney_core::{Config, Database};
//!
//! let config = Config::load().expect("failed to load config");
//!
//! let db = Arc::new(Database::open(&Config::database_path()).expect("failed to open database"));
//! db.migrate().expect("failed to run migrations");
//!
//! let session = SessionContext::signed_in(&db, AuthSession::new("admin-user-id"));
//! let range = DateRange::last_days(chrono::Utc::now().date_naive(), 30);
//! let report = generate_report(db, &session, range, &AnalyticsScope::AllUsers, &config.analytics)
//!     .expect("failed to build report");
//! println!("{} quizzes", report.kpis.total_quizzes);
//! ```

// Re-export commonly used items at the crate root
pub use auth::{AuthSession, SessionContext};
pub use config::Config;
pub use db::{AttemptFilter, Database};
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod admin;
pub mod analytics;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod logging;
pub mod quiz;
pub mod types;
