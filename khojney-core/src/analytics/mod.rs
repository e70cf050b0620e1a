//! Analytics pipeline
//!
//! Flat rows from the store flow through three stages:
//!
//! 1. [`aggregate`]: single pass into keyed `{sum, count}` buckets
//! 2. [`metrics`]: averages, rounding and period-over-period change
//! 3. [`chart`]: ordered, chart-ready rows
//!
//! [`report`] and [`dashboard`] assemble those stages into the admin
//! analytics report and the personal dashboard.

pub mod aggregate;
pub mod chart;
pub mod dashboard;
pub mod leaderboard;
pub mod metrics;
pub mod report;

pub use aggregate::{Bucket, Buckets, GENERAL_CATEGORY};
pub use chart::{ActivityPoint, CategoryPoint, SignupPoint};
pub use dashboard::{load_dashboard, HistoryFilter, HistoryPage, PersonalDashboard};
pub use leaderboard::{load_leaderboard, LeaderboardView};
pub use metrics::{format_change, percent_change, round1};
pub use report::{generate_report, AnalyticsReport, AnalyticsScope, DateRange};
