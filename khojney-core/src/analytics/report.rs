//! Admin analytics report.
//!
//! A report covers an inclusive date range and compares it with the
//! equal-length period immediately before it. Rows for both periods are
//! fetched concurrently, then reduced synchronously by [`build_report`].

use super::aggregate::{attempts_by_category, attempts_by_day, signups_by_day};
use super::chart::{
    activity_chart, category_chart, signup_chart, ActivityPoint, CategoryPoint, SignupPoint,
};
use super::metrics::{average, percent_change, round1};
use crate::auth::SessionContext;
use crate::config::AnalyticsConfig;
use crate::db::{AttemptFilter, Database};
use crate::error::{Error, Result};
use crate::types::{AttemptRecord, LeaderboardEntry, LeaderboardPeriod, QuestionStat};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Shown as the top category when a period has no attempts.
pub const NO_CATEGORY: &str = "N/A";

/// Inclusive range of calendar days (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(Error::InvalidRange(format!("{} is after {}", from, to)));
        }
        Ok(Self { from, to })
    }

    /// The `days` days before `today`, through the end of `today`.
    pub fn last_days(today: NaiveDate, days: u32) -> Self {
        Self {
            from: today - Duration::days(i64::from(days)),
            to: today,
        }
    }

    /// Midnight at the start of `from`.
    pub fn start(&self) -> DateTime<Utc> {
        self.from.and_time(NaiveTime::MIN).and_utc()
    }

    /// Last millisecond of `to`.
    pub fn end(&self) -> DateTime<Utc> {
        let next_day = (self.to + Duration::days(1)).and_time(NaiveTime::MIN).and_utc();
        next_day - Duration::milliseconds(1)
    }

    /// Number of whole days from `start()` to `end()`.
    pub fn whole_days(&self) -> i64 {
        (self.end() - self.start()).num_days()
    }

    /// The period of the same length ending the day before this one starts.
    pub fn previous(&self) -> Self {
        let shift = Duration::days(self.whole_days() + 1);
        Self {
            from: self.from - shift,
            to: self.to - shift,
        }
    }
}

/// Whose attempts a report covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AnalyticsScope {
    #[default]
    AllUsers,
    User(String),
}

impl AnalyticsScope {
    /// `"all"` means every user; anything else is a user id.
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "" | "all" => AnalyticsScope::AllUsers,
            id => AnalyticsScope::User(id.to_string()),
        }
    }

    fn user_id(&self) -> Option<&str> {
        match self {
            AnalyticsScope::AllUsers => None,
            AnalyticsScope::User(id) => Some(id),
        }
    }
}

/// Rows fetched for one period.
#[derive(Debug, Clone, Default)]
pub struct PeriodData {
    /// Completed attempts created in the period
    pub attempts: Vec<AttemptRecord>,
    /// Profile creation times in the period
    pub signups: Vec<DateTime<Utc>>,
}

/// Everything a report is built from.
#[derive(Debug, Clone, Default)]
pub struct ReportInput {
    pub current: PeriodData,
    pub previous: PeriodData,
    pub question_stats: Vec<QuestionStat>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Runs the report queries concurrently on a private runtime.
pub struct ReportFetcher {
    db: Arc<Database>,
    runtime: tokio::runtime::Runtime,
}

impl ReportFetcher {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Fetch(format!("failed to build tokio runtime: {e}")))?;
        Ok(Self { db, runtime })
    }

    /// Fetch both periods plus the current-period extras.
    ///
    /// The first failing query fails the whole fetch.
    pub fn fetch(
        &self,
        range: &DateRange,
        scope: &AnalyticsScope,
        leaderboard_limit: usize,
    ) -> Result<ReportInput> {
        let previous = range.previous();
        let user_id = scope.user_id().map(str::to_string);

        self.runtime.block_on(async {
            let (
                current_attempts,
                current_signups,
                previous_attempts,
                previous_signups,
                question_stats,
                leaderboard,
            ) = tokio::try_join!(
                self.attempts(range, user_id.clone()),
                self.signups(range),
                self.attempts(&previous, user_id.clone()),
                self.signups(&previous),
                self.blocking(|db| db.list_question_stats(1)),
                self.blocking(move |db| {
                    db.list_leaderboard(LeaderboardPeriod::AllTime, None, leaderboard_limit)
                }),
            )?;

            tracing::debug!(
                attempts = current_attempts.len(),
                previous_attempts = previous_attempts.len(),
                signups = current_signups.len(),
                "Fetched report rows"
            );

            Ok::<_, Error>(ReportInput {
                current: PeriodData {
                    attempts: current_attempts,
                    signups: current_signups,
                },
                previous: PeriodData {
                    attempts: previous_attempts,
                    signups: previous_signups,
                },
                question_stats,
                leaderboard,
            })
        })
    }

    async fn attempts(
        &self,
        range: &DateRange,
        user_id: Option<String>,
    ) -> Result<Vec<AttemptRecord>> {
        let mut filter = AttemptFilter::completed_between(range.start(), range.end());
        filter.user_id = user_id;
        self.blocking(move |db| db.list_attempt_records(&filter)).await
    }

    async fn signups(&self, range: &DateRange) -> Result<Vec<DateTime<Utc>>> {
        let (from, to) = (range.start(), range.end());
        self.blocking(move |db| db.list_signups(from, to)).await
    }

    async fn blocking<T, F>(&self, query: F) -> Result<T>
    where
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || query(&db))
            .await
            .map_err(|e| Error::Fetch(e.to_string()))?
    }
}

/// Headline numbers of one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_quizzes: i64,
    /// Mean score of completed attempts, one decimal
    pub avg_score: f64,
    pub top_category: String,
    /// Signups in the period
    pub total_users: i64,
}

/// Percent change of each KPI against the previous period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiChanges {
    pub total_quizzes: f64,
    pub avg_score: f64,
    pub total_users: f64,
}

/// Hardest and easiest questions by correct percentage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QuestionHighlights {
    pub hardest: Vec<QuestionStat>,
    pub easiest: Vec<QuestionStat>,
}

impl QuestionHighlights {
    pub fn from_stats(stats: &[QuestionStat], top: usize) -> Self {
        let mut hardest = stats.to_vec();
        hardest.sort_by(|a, b| a.correct_percentage.total_cmp(&b.correct_percentage));
        hardest.truncate(top);

        let mut easiest = stats.to_vec();
        easiest.sort_by(|a, b| b.correct_percentage.total_cmp(&a.correct_percentage));
        easiest.truncate(top);

        Self { hardest, easiest }
    }
}

/// The full admin analytics report.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub range: DateRange,
    pub previous_range: DateRange,
    /// `None` when the report covers every user
    pub user_id: Option<String>,
    pub kpis: Kpis,
    pub previous_kpis: Kpis,
    pub changes: KpiChanges,
    pub category_chart: Vec<CategoryPoint>,
    pub activity_chart: Vec<ActivityPoint>,
    pub signup_chart: Vec<SignupPoint>,
    pub question_stats: QuestionHighlights,
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Unrounded numbers the KPIs and their changes derive from.
struct PeriodSummary {
    total_quizzes: i64,
    avg_score: f64,
    total_users: i64,
    top_category: String,
}

impl PeriodSummary {
    fn of(data: &PeriodData) -> Self {
        let score_sum: f64 = data
            .attempts
            .iter()
            .map(|a| a.score.unwrap_or(0) as f64)
            .sum();
        let total_quizzes = data.attempts.len() as i64;
        let top_category = category_chart(&attempts_by_category(&data.attempts))
            .into_iter()
            .next()
            .map(|p| p.name)
            .unwrap_or_else(|| NO_CATEGORY.to_string());

        Self {
            total_quizzes,
            avg_score: average(score_sum, total_quizzes),
            total_users: data.signups.len() as i64,
            top_category,
        }
    }

    fn kpis(&self) -> Kpis {
        Kpis {
            total_quizzes: self.total_quizzes,
            avg_score: round1(self.avg_score),
            top_category: self.top_category.clone(),
            total_users: self.total_users,
        }
    }

    fn changes_from(&self, previous: &PeriodSummary) -> KpiChanges {
        KpiChanges {
            total_quizzes: percent_change(self.total_quizzes as f64, previous.total_quizzes as f64),
            avg_score: percent_change(self.avg_score, previous.avg_score),
            total_users: percent_change(self.total_users as f64, previous.total_users as f64),
        }
    }
}

/// Reduce fetched rows into a report.
pub fn build_report(
    input: &ReportInput,
    range: DateRange,
    scope: &AnalyticsScope,
    config: &AnalyticsConfig,
) -> AnalyticsReport {
    let current = PeriodSummary::of(&input.current);
    let previous = PeriodSummary::of(&input.previous);

    AnalyticsReport {
        range,
        previous_range: range.previous(),
        user_id: scope.user_id().map(str::to_string),
        kpis: current.kpis(),
        previous_kpis: previous.kpis(),
        changes: current.changes_from(&previous),
        category_chart: category_chart(&attempts_by_category(&input.current.attempts)),
        activity_chart: activity_chart(&attempts_by_day(&input.current.attempts)),
        signup_chart: signup_chart(&signups_by_day(&input.current.signups)),
        question_stats: QuestionHighlights::from_stats(&input.question_stats, config.top_questions),
        leaderboard: input.leaderboard.clone(),
    }
}

/// Fetch and build the admin analytics report. Admin only.
pub fn generate_report(
    db: Arc<Database>,
    session: &SessionContext,
    range: DateRange,
    scope: &AnalyticsScope,
    config: &AnalyticsConfig,
) -> Result<AnalyticsReport> {
    let admin = session.require_admin()?;
    tracing::info!(
        admin,
        from = %range.from,
        to = %range.to,
        scope = ?scope,
        "Generating analytics report"
    );

    let fetcher = ReportFetcher::new(db)?;
    let input = fetcher.fetch(&range, scope, config.leaderboard_limit)?;
    Ok(build_report(&input, range, scope, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthSession;
    use crate::types::{AttemptStatus, Profile, Role};
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(category: Option<&str>, score: i64, ts: DateTime<Utc>) -> AttemptRecord {
        AttemptRecord {
            id: format!("{}-{}", score, ts),
            user_id: "u1".to_string(),
            category_name: category.map(str::to_string),
            score: Some(score),
            status: AttemptStatus::Completed,
            created_at: ts,
            completed_at: Some(ts),
        }
    }

    fn stat(id: &str, pct: f64) -> QuestionStat {
        QuestionStat {
            question_id: id.to_string(),
            question_text: format!("Question {}", id),
            total_attempts: 4,
            correct_percentage: pct,
        }
    }

    #[test]
    fn test_range_bounds() {
        let range = DateRange::new(date(2024, 3, 1), date(2024, 3, 10)).unwrap();
        assert_eq!(range.start(), Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(
            range.end(),
            Utc.with_ymd_and_hms(2024, 3, 10, 23, 59, 59).unwrap() + Duration::milliseconds(999)
        );
        assert_eq!(range.whole_days(), 9);
    }

    #[test]
    fn test_previous_period_is_adjacent_and_equal_length() {
        let range = DateRange::new(date(2024, 3, 1), date(2024, 3, 10)).unwrap();
        let previous = range.previous();
        assert_eq!(previous.from, date(2024, 2, 20));
        assert_eq!(previous.to, date(2024, 2, 29));

        let single = DateRange::new(date(2024, 3, 1), date(2024, 3, 1)).unwrap();
        assert_eq!(single.previous().from, date(2024, 2, 29));
        assert_eq!(single.previous().to, date(2024, 2, 29));
    }

    #[test]
    fn test_reversed_range_rejected() {
        let result = DateRange::new(date(2024, 3, 10), date(2024, 3, 1));
        assert!(matches!(result, Err(Error::InvalidRange(_))));
    }

    #[test]
    fn test_default_range() {
        let range = DateRange::last_days(date(2024, 3, 31), 30);
        assert_eq!(range.from, date(2024, 3, 1));
        assert_eq!(range.to, date(2024, 3, 31));
    }

    #[test]
    fn test_scope_parse() {
        assert_eq!(AnalyticsScope::parse("all"), AnalyticsScope::AllUsers);
        assert_eq!(AnalyticsScope::parse(""), AnalyticsScope::AllUsers);
        assert_eq!(
            AnalyticsScope::parse("u-42"),
            AnalyticsScope::User("u-42".to_string())
        );
    }

    #[test]
    fn test_build_report_kpis_and_changes() {
        let ts = |d: u32| Utc.with_ymd_and_hms(2024, 3, d, 9, 0, 0).unwrap();
        let input = ReportInput {
            current: PeriodData {
                attempts: vec![
                    record(Some("Math"), 8, ts(2)),
                    record(Some("Math"), 6, ts(3)),
                    record(Some("Science"), 10, ts(2)),
                ],
                signups: vec![ts(1), ts(1), ts(4)],
            },
            previous: PeriodData {
                attempts: vec![record(None, 6, ts(1)), record(None, 6, ts(1))],
                signups: vec![],
            },
            question_stats: vec![],
            leaderboard: vec![],
        };
        let range = DateRange::new(date(2024, 3, 1), date(2024, 3, 10)).unwrap();
        let report = build_report(&input, range, &AnalyticsScope::AllUsers, &AnalyticsConfig::default());

        assert_eq!(report.kpis.total_quizzes, 3);
        assert_eq!(report.kpis.avg_score, 8.0);
        assert_eq!(report.kpis.top_category, "Math");
        assert_eq!(report.kpis.total_users, 3);
        assert_eq!(report.previous_kpis.top_category, "General");

        assert_eq!(report.changes.total_quizzes, 50.0);
        assert!((report.changes.avg_score - 33.333).abs() < 0.01);
        assert_eq!(report.changes.total_users, 100.0);

        assert_eq!(report.category_chart.len(), 2);
        let days: Vec<_> = report.activity_chart.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(days, vec!["2024-03-02", "2024-03-03"]);
        assert_eq!(report.signup_chart[0].new_users, 2);
    }

    #[test]
    fn test_empty_periods() {
        let range = DateRange::new(date(2024, 3, 1), date(2024, 3, 1)).unwrap();
        let report = build_report(
            &ReportInput::default(),
            range,
            &AnalyticsScope::AllUsers,
            &AnalyticsConfig::default(),
        );
        assert_eq!(report.kpis.total_quizzes, 0);
        assert_eq!(report.kpis.avg_score, 0.0);
        assert_eq!(report.kpis.top_category, NO_CATEGORY);
        assert_eq!(report.changes.total_quizzes, 0.0);
        assert!(report.category_chart.is_empty());
    }

    #[test]
    fn test_question_highlights() {
        let stats = vec![
            stat("a", 50.0),
            stat("b", 10.0),
            stat("c", 90.0),
            stat("d", 10.0),
        ];
        let highlights = QuestionHighlights::from_stats(&stats, 2);
        let hardest: Vec<_> = highlights.hardest.iter().map(|s| s.question_id.as_str()).collect();
        let easiest: Vec<_> = highlights.easiest.iter().map(|s| s.question_id.as_str()).collect();
        assert_eq!(hardest, vec!["b", "d"]);
        assert_eq!(easiest, vec!["c", "a"]);
    }

    #[test]
    fn test_generate_report_requires_admin() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        db.migrate().unwrap();
        db.insert_profile(&Profile {
            id: "u1".to_string(),
            full_name: None,
            role: Role::PremiumUser,
            current_streak: 0,
            created_at: Utc::now(),
        })
        .unwrap();

        let session = SessionContext::signed_in(&db, AuthSession::new("u1"));
        let range = DateRange::last_days(Utc::now().date_naive(), 30);
        let result = generate_report(
            Arc::clone(&db),
            &session,
            range,
            &AnalyticsScope::AllUsers,
            &AnalyticsConfig::default(),
        );
        assert!(matches!(result, Err(Error::Unauthorized(_))));
    }

    #[test]
    fn test_generate_report_fetches_both_periods() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        db.migrate().unwrap();
        let signup = Utc.with_ymd_and_hms(2024, 3, 5, 8, 0, 0).unwrap();
        db.insert_profile(&Profile {
            id: "admin".to_string(),
            full_name: Some("Admin".to_string()),
            role: Role::Admin,
            current_streak: 0,
            created_at: signup,
        })
        .unwrap();

        let current = db.start_attempt("admin", None, signup).unwrap();
        db.complete_attempt(&current.id, "admin", 4, &[], signup, 30).unwrap();
        let earlier = Utc.with_ymd_and_hms(2024, 2, 25, 8, 0, 0).unwrap();
        let old = db.start_attempt("admin", None, earlier).unwrap();
        db.complete_attempt(&old.id, "admin", 2, &[], earlier, 30).unwrap();

        let session = SessionContext::signed_in(&db, AuthSession::new("admin"));
        let range = DateRange::new(date(2024, 3, 1), date(2024, 3, 10)).unwrap();
        let report = generate_report(
            db,
            &session,
            range,
            &AnalyticsScope::User("admin".to_string()),
            &AnalyticsConfig::default(),
        )
        .unwrap();

        assert_eq!(report.kpis.total_quizzes, 1);
        assert_eq!(report.kpis.avg_score, 4.0);
        assert_eq!(report.previous_kpis.total_quizzes, 1);
        assert_eq!(report.changes.avg_score, 100.0);
        assert_eq!(report.kpis.total_users, 1);
        assert_eq!(report.user_id.as_deref(), Some("admin"));
    }
}
