//! Core domain types for khojney
//!
//! These types mirror the rows of the quiz platform's relational store.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Category** | A topic; categories form a tree through `parent_category_id` |
//! | **Question** | A multiple-choice question owning its options |
//! | **Attempt** | One instance of a user taking a quiz |
//! | **Profile** | Per-user record holding the access [`Role`] |
//! | **Leaderboard** | Precomputed ranking for a [`LeaderboardPeriod`], written by external jobs |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Profiles and roles
// ============================================

/// Access tier stored on each profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Free tier
    User,
    /// Paid tier
    PremiumUser,
    /// Content and analytics administrator
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::PremiumUser => "premium_user",
            Role::Admin => "admin",
        }
    }

    /// Free-tier users see the upgrade prompt instead of starting quizzes.
    pub fn is_free_tier(&self) -> bool {
        matches!(self, Role::User)
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "premium_user" => Ok(Role::PremiumUser),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("unknown role: {}", s)),
        }
    }
}

/// A user's profile row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Same id as the auth provider's user
    pub id: String,
    pub full_name: Option<String>,
    pub role: Role,
    /// Consecutive days with a completed quiz
    pub current_streak: i64,
    /// Signup time
    pub created_at: DateTime<Utc>,
}

// ============================================
// Categories
// ============================================

/// A quiz category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name_en: String,
    pub slug: String,
    pub name_ne: Option<String>,
    pub description_en: Option<String>,
    pub description_ne: Option<String>,
    /// Parent in the category tree (one level used in practice)
    pub parent_category_id: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when creating a category.
#[derive(Debug, Clone, Default)]
pub struct NewCategory {
    pub name_en: String,
    pub slug: String,
    pub name_ne: Option<String>,
    pub description_en: Option<String>,
    pub description_ne: Option<String>,
    pub parent_category_id: Option<String>,
    pub is_published: bool,
}

// ============================================
// Questions
// ============================================

/// Question difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(format!("unknown difficulty: {}", s)),
        }
    }
}

/// A stored question with its options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub question_text_en: String,
    pub difficulty: Difficulty,
    pub points: i64,
    pub explanation_en: Option<String>,
    pub is_published: bool,
    pub language: String,
    pub options: Vec<QuizOption>,
}

impl Question {
    /// The option marked correct, if any.
    pub fn correct_option(&self) -> Option<&QuizOption> {
        self.options.iter().find(|o| o.is_correct)
    }
}

/// One answer choice of a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizOption {
    pub id: String,
    pub question_id: String,
    pub option_text_en: String,
    pub is_correct: bool,
    pub display_order: i64,
}

/// A question as entered in the admin form or a CSV row, before insertion.
#[derive(Debug, Clone)]
pub struct QuestionDraft {
    pub question_text_en: String,
    pub difficulty: Difficulty,
    pub points: i64,
    pub explanation_en: Option<String>,
    pub is_published: bool,
    pub language: String,
    pub options: Vec<OptionDraft>,
    /// Categories to link through `question_categories`
    pub category_ids: Vec<String>,
}

/// An option of a [`QuestionDraft`].
#[derive(Debug, Clone)]
pub struct OptionDraft {
    pub option_text_en: String,
    pub is_correct: bool,
}

impl QuestionDraft {
    /// Checks the rules the admin question form enforces.
    ///
    /// The store itself does not constrain the number of correct options.
    pub fn validate(&self) -> crate::Result<()> {
        if self.question_text_en.trim().is_empty() {
            return Err(crate::Error::InvalidQuestion(
                "question text is empty".to_string(),
            ));
        }
        if self.options.iter().any(|o| o.option_text_en.trim().is_empty()) {
            return Err(crate::Error::InvalidQuestion(format!(
                "\"{}\" has an option with empty text",
                self.question_text_en
            )));
        }
        let correct = self.options.iter().filter(|o| o.is_correct).count();
        if correct != 1 {
            return Err(crate::Error::InvalidQuestion(format!(
                "\"{}\" must have exactly one correct option, found {}",
                self.question_text_en, correct
            )));
        }
        Ok(())
    }
}

// ============================================
// Attempts and answers
// ============================================

/// Lifecycle state of an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Started,
    Completed,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::Started => "started",
            AttemptStatus::Completed => "completed",
        }
    }
}

impl std::str::FromStr for AttemptStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "started" => Ok(AttemptStatus::Started),
            "completed" => Ok(AttemptStatus::Completed),
            _ => Err(format!("unknown attempt status: {}", s)),
        }
    }
}

/// A quiz attempt row.
///
/// `score` is only meaningful once `status` is [`AttemptStatus::Completed`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: String,
    pub user_id: String,
    pub category_id: Option<String>,
    pub score: Option<i64>,
    pub status: AttemptStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub time_taken_seconds: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// An attempt joined with its category name, the shape analytics consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub id: String,
    pub user_id: String,
    /// `None` when the attempt has no category
    pub category_name: Option<String>,
    pub score: Option<i64>,
    pub status: AttemptStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// One answered question within an attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAnswer {
    pub question_id: String,
    /// `None` when the timer ran out without an answer
    pub selected_option_id: Option<String>,
    pub is_correct: Option<bool>,
}

/// A stored answer read back with the question it answered.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerReview {
    /// The question with all of its options
    pub question: Question,
    pub selected_option_id: Option<String>,
    pub is_correct: Option<bool>,
}

// ============================================
// Derived views
// ============================================

/// Per-question answer statistics (from the `question_stats` view).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionStat {
    pub question_id: String,
    pub question_text: String,
    pub total_attempts: i64,
    pub correct_percentage: f64,
}

/// A user's answer totals in one category (from `user_category_performance`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPerformance {
    pub category_name: String,
    pub correct_answers: i64,
    pub total_questions_answered: i64,
}

// ============================================
// Leaderboards
// ============================================

/// Ranking window of a precomputed leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardPeriod {
    #[default]
    AllTime,
    Monthly,
    Weekly,
}

impl LeaderboardPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaderboardPeriod::AllTime => "all_time",
            LeaderboardPeriod::Monthly => "monthly",
            LeaderboardPeriod::Weekly => "weekly",
        }
    }

    /// Parses a period, falling back to all-time for unknown values.
    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl std::str::FromStr for LeaderboardPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all_time" => Ok(LeaderboardPeriod::AllTime),
            "monthly" => Ok(LeaderboardPeriod::Monthly),
            "weekly" => Ok(LeaderboardPeriod::Weekly),
            _ => Err(format!("unknown leaderboard period: {}", s)),
        }
    }
}

/// A precomputed leaderboard row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub user_id: String,
    pub full_name: Option<String>,
    pub period: LeaderboardPeriod,
    /// `None` for the global board
    pub category_id: Option<String>,
    pub total_score: i64,
    pub quizzes_completed: i64,
}
