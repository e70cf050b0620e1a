//! Personal dashboard: a user's attempts, per-category accuracy and
//! a filterable, paginated quiz history.

use super::metrics::{percentage, round1};
use crate::auth::SessionContext;
use crate::db::{AttemptFilter, AttemptOrder, Database};
use crate::error::Result;
use crate::types::{AttemptRecord, AttemptStatus, CategoryPerformance, Profile};
use serde::Serialize;

/// Filter value matching every category or status.
pub const ALL: &str = "all";

/// Totals shown at the top of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallStats {
    /// Attempts of any status
    pub total_quizzes: i64,
    /// Questions answered across all categories
    pub total_questions: i64,
    /// Percent of answered questions that were correct, one decimal
    pub accuracy: f64,
}

/// One category's accuracy row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceRow {
    pub category_name: String,
    pub correct_answers: i64,
    pub total_questions_answered: i64,
    pub percentage: f64,
}

impl From<&CategoryPerformance> for PerformanceRow {
    fn from(p: &CategoryPerformance) -> Self {
        Self {
            category_name: p.category_name.clone(),
            correct_answers: p.correct_answers,
            total_questions_answered: p.total_questions_answered,
            percentage: percentage(p.correct_answers, p.total_questions_answered),
        }
    }
}

/// Quiz history filter; `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub category: Option<String>,
    pub status: Option<AttemptStatus>,
}

impl HistoryFilter {
    /// Build from the select values, where `"all"` disables a field.
    pub fn parse(category: &str, status: &str) -> Result<Self> {
        let category = match category {
            ALL => None,
            name => Some(name.to_string()),
        };
        let status = match status {
            ALL => None,
            s => Some(s.parse().map_err(crate::Error::InvalidFilter)?),
        };
        Ok(Self { category, status })
    }

    fn matches(&self, attempt: &AttemptRecord) -> bool {
        let category_ok = self
            .category
            .as_deref()
            .map_or(true, |c| attempt.category_name.as_deref() == Some(c));
        let status_ok = self.status.map_or(true, |s| attempt.status == s);
        category_ok && status_ok
    }
}

/// One page of filtered quiz history.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryPage {
    pub attempts: Vec<AttemptRecord>,
    /// 1-based
    pub page: usize,
    /// `ceil(total_filtered / per_page)`, 0 when nothing matches
    pub total_pages: usize,
    pub total_filtered: usize,
}

/// Everything the personal dashboard shows.
#[derive(Debug, Clone, Serialize)]
pub struct PersonalDashboard {
    pub profile: Option<Profile>,
    /// Most recently completed first
    pub attempts: Vec<AttemptRecord>,
    pub performance: Vec<PerformanceRow>,
    pub stats: OverallStats,
}

impl PersonalDashboard {
    pub fn new(
        profile: Option<Profile>,
        attempts: Vec<AttemptRecord>,
        performance: &[CategoryPerformance],
    ) -> Self {
        let total_correct: i64 = performance.iter().map(|p| p.correct_answers).sum();
        let total_questions: i64 = performance.iter().map(|p| p.total_questions_answered).sum();

        let stats = OverallStats {
            total_quizzes: attempts.len() as i64,
            total_questions,
            accuracy: round1(percentage(total_correct, total_questions)),
        };

        Self {
            profile,
            attempts,
            performance: performance.iter().map(PerformanceRow::from).collect(),
            stats,
        }
    }

    /// `"all"` followed by each category name in first-seen order.
    ///
    /// Attempts without a category are only reachable through `"all"`.
    pub fn available_categories(&self) -> Vec<String> {
        let mut names = vec![ALL.to_string()];
        for name in self.attempts.iter().filter_map(|a| a.category_name.as_ref()) {
            if !names.iter().any(|n| n == name) {
                names.push(name.clone());
            }
        }
        names
    }

    /// Filtered history page; `page` is clamped to the available pages.
    pub fn history(&self, filter: &HistoryFilter, page: usize, per_page: usize) -> HistoryPage {
        let per_page = per_page.max(1);
        let filtered: Vec<&AttemptRecord> =
            self.attempts.iter().filter(|a| filter.matches(a)).collect();

        let total_filtered = filtered.len();
        let total_pages = (total_filtered + per_page - 1) / per_page;
        let page = page.clamp(1, total_pages.max(1));

        let attempts = filtered
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .cloned()
            .collect();

        HistoryPage {
            attempts,
            page,
            total_pages,
            total_filtered,
        }
    }
}

/// Load the signed-in user's dashboard.
pub fn load_dashboard(db: &Database, session: &SessionContext) -> Result<PersonalDashboard> {
    let user_id = session.require_user()?;

    let profile = db.get_profile(user_id)?;
    let attempts = db.list_attempt_records(&AttemptFilter {
        order: AttemptOrder::CompletedDesc,
        ..AttemptFilter::default().for_user(user_id)
    })?;
    let performance = db.user_category_performance(user_id)?;

    tracing::debug!(
        user_id,
        attempts = attempts.len(),
        categories = performance.len(),
        "Loaded dashboard"
    );

    Ok(PersonalDashboard::new(profile, attempts, &performance))
}
