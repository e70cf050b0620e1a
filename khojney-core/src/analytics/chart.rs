//! Chart-ready rows built from [`Buckets`].
//!
//! Time series are chronological; category rankings are by descending
//! volume. All sorts are stable, so ties keep the buckets' insertion order.

use super::aggregate::Buckets;
use super::metrics::round1;
use serde::Serialize;

/// One bar of the category performance chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPoint {
    pub name: String,
    /// Average score, rounded to one decimal
    pub avg_score: f64,
    /// Number of attempts
    pub quizzes: i64,
}

/// One point of the daily activity chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityPoint {
    /// `YYYY-MM-DD`
    pub date: String,
    pub quizzes: i64,
}

/// One point of the daily signup chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignupPoint {
    /// `YYYY-MM-DD`
    pub date: String,
    pub new_users: i64,
}

/// Category ranking, most attempted first.
pub fn category_chart(buckets: &Buckets) -> Vec<CategoryPoint> {
    let mut points: Vec<CategoryPoint> = buckets
        .iter()
        .map(|(name, bucket)| CategoryPoint {
            name: name.to_string(),
            avg_score: round1(bucket.average()),
            quizzes: bucket.count,
        })
        .collect();
    points.sort_by(|a, b| b.quizzes.cmp(&a.quizzes));
    points
}

/// Attempts per day, oldest first.
pub fn activity_chart(buckets: &Buckets) -> Vec<ActivityPoint> {
    let mut points: Vec<ActivityPoint> = buckets
        .iter()
        .map(|(date, bucket)| ActivityPoint {
            date: date.to_string(),
            quizzes: bucket.count,
        })
        .collect();
    // ISO dates sort chronologically as strings
    points.sort_by(|a, b| a.date.cmp(&b.date));
    points
}

/// New users per day, oldest first.
pub fn signup_chart(buckets: &Buckets) -> Vec<SignupPoint> {
    let mut points: Vec<SignupPoint> = buckets
        .iter()
        .map(|(date, bucket)| SignupPoint {
            date: date.to_string(),
            new_users: bucket.count,
        })
        .collect();
    points.sort_by(|a, b| a.date.cmp(&b.date));
    points
}
