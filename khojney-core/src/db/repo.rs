//! Database repository layer
//!
//! Provides query and insert operations for all entity types.

use crate::error::{Error, Result};
use crate::types::*;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Filter for attempt queries.
///
/// Bounds are inclusive. Unset fields do not restrict the query.
#[derive(Debug, Clone, Default)]
pub struct AttemptFilter {
    pub user_id: Option<String>,
    pub category_id: Option<String>,
    pub status: Option<AttemptStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub order: AttemptOrder,
}

impl AttemptFilter {
    /// Completed attempts created within `[from, to]`.
    pub fn completed_between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            status: Some(AttemptStatus::Completed),
            from: Some(from),
            to: Some(to),
            ..Default::default()
        }
    }

    /// Restrict to one user.
    pub fn for_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// Result ordering for attempt queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttemptOrder {
    /// Oldest first by creation time
    #[default]
    CreatedAsc,
    /// Most recently completed first, unfinished attempts last
    CompletedDesc,
}

/// Formats a timestamp the way every DATETIME column stores it.
///
/// Fixed millisecond precision keeps lexicographic order equal to time order.
pub(crate) fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Database handle with a single serialized connection
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock();
        super::schema::run_migrations(&conn)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock leaves no partial SQLite state behind.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ============================================
    // Profile operations
    // ============================================

    /// Insert a profile
    pub fn insert_profile(&self, profile: &Profile) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            r#"
            INSERT INTO profiles (id, full_name, role, current_streak, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                profile.id,
                profile.full_name,
                profile.role.as_str(),
                profile.current_streak,
                fmt_ts(&profile.created_at),
            ],
        )?;
        Ok(())
    }

    /// Get a profile by ID
    pub fn get_profile(&self, id: &str) -> Result<Option<Profile>> {
        let conn = self.lock();
        conn.query_row("SELECT * FROM profiles WHERE id = ?", [id], |row| {
            Self::row_to_profile(row)
        })
        .optional()
        .map_err(Error::from)
    }

    /// Read only the role column for a user
    pub fn get_role(&self, id: &str) -> Result<Option<Role>> {
        let conn = self.lock();
        let role: Option<String> = conn
            .query_row("SELECT role FROM profiles WHERE id = ?", [id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(role.and_then(|r| r.parse().ok()))
    }

    /// Update the display name of a profile
    pub fn update_profile_name(&self, id: &str, full_name: &str) -> Result<()> {
        let conn = self.lock();
        let updated = conn.execute(
            "UPDATE profiles SET full_name = ?1 WHERE id = ?2",
            params![full_name, id],
        )?;
        if updated == 0 {
            return Err(Error::ProfileNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Change the role of a profile
    pub fn set_role(&self, id: &str, role: Role) -> Result<()> {
        let conn = self.lock();
        let updated = conn.execute(
            "UPDATE profiles SET role = ?1 WHERE id = ?2",
            params![role.as_str(), id],
        )?;
        if updated == 0 {
            return Err(Error::ProfileNotFound(id.to_string()));
        }
        Ok(())
    }

    /// List all profiles, newest signups first
    pub fn list_profiles(&self) -> Result<Vec<Profile>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT * FROM profiles ORDER BY created_at DESC")?;
        let profiles = stmt
            .query_map([], Self::row_to_profile)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(profiles)
    }

    /// Signup timestamps within `[from, to]`, oldest first
    pub fn list_signups(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<DateTime<Utc>>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            r#"
            SELECT created_at FROM profiles
            WHERE created_at >= ?1 AND created_at <= ?2
            ORDER BY created_at ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![fmt_ts(&from), fmt_ts(&to)], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows.iter().filter_map(|s| parse_ts(s)).collect())
    }

    /// Delete a profile together with its attempts and answers
    pub fn delete_profile(&self, id: &str) -> Result<()> {
        let conn = self.lock();
        let deleted = conn.execute("DELETE FROM profiles WHERE id = ?", [id])?;
        if deleted == 0 {
            return Err(Error::ProfileNotFound(id.to_string()));
        }
        tracing::info!(user_id = id, "Deleted profile and its attempts");
        Ok(())
    }

    fn row_to_profile(row: &Row) -> rusqlite::Result<Profile> {
        let role_str: String = row.get("role")?;
        let created_at_str: String = row.get("created_at")?;

        Ok(Profile {
            id: row.get("id")?,
            full_name: row.get("full_name")?,
            role: role_str.parse().unwrap_or(Role::User),
            current_streak: row.get("current_streak")?,
            created_at: parse_ts(&created_at_str).unwrap_or_else(Utc::now),
        })
    }

    // ============================================
    // Category operations
    // ============================================

    /// Insert a category and return the stored row
    pub fn insert_category(&self, category: &NewCategory) -> Result<Category> {
        let stored = Category {
            id: uuid::Uuid::new_v4().to_string(),
            name_en: category.name_en.clone(),
            slug: category.slug.clone(),
            name_ne: category.name_ne.clone(),
            description_en: category.description_en.clone(),
            description_ne: category.description_ne.clone(),
            parent_category_id: category.parent_category_id.clone(),
            is_published: category.is_published,
            created_at: Utc::now(),
        };

        let conn = self.lock();
        conn.execute(
            r#"
            INSERT INTO categories (id, name_en, slug, name_ne, description_en, description_ne,
                                    parent_category_id, is_published, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                stored.id,
                stored.name_en,
                stored.slug,
                stored.name_ne,
                stored.description_en,
                stored.description_ne,
                stored.parent_category_id,
                stored.is_published,
                fmt_ts(&stored.created_at),
            ],
        )?;
        Ok(stored)
    }

    /// List all categories ordered by English name
    pub fn list_categories(&self) -> Result<Vec<Category>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT * FROM categories ORDER BY name_en ASC")?;
        let categories = stmt
            .query_map([], Self::row_to_category)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    /// Get a category by ID
    pub fn get_category(&self, id: &str) -> Result<Option<Category>> {
        let conn = self.lock();
        conn.query_row("SELECT * FROM categories WHERE id = ?", [id], |row| {
            Self::row_to_category(row)
        })
        .optional()
        .map_err(Error::from)
    }

    /// Get a category by its unique slug
    pub fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let conn = self.lock();
        conn.query_row("SELECT * FROM categories WHERE slug = ?", [slug], |row| {
            Self::row_to_category(row)
        })
        .optional()
        .map_err(Error::from)
    }

    /// Map of lowercased English category name to id
    pub fn category_name_index(&self) -> Result<HashMap<String, String>> {
        Ok(self
            .list_categories()?
            .into_iter()
            .map(|c| (c.name_en.to_lowercase(), c.id))
            .collect())
    }

    fn row_to_category(row: &Row) -> rusqlite::Result<Category> {
        let created_at_str: String = row.get("created_at")?;

        Ok(Category {
            id: row.get("id")?,
            name_en: row.get("name_en")?,
            slug: row.get("slug")?,
            name_ne: row.get("name_ne")?,
            description_en: row.get("description_en")?,
            description_ne: row.get("description_ne")?,
            parent_category_id: row.get("parent_category_id")?,
            is_published: row.get("is_published")?,
            created_at: parse_ts(&created_at_str).unwrap_or_else(Utc::now),
        })
    }

    // ============================================
    // Question operations
    // ============================================

    /// Insert a question with its options and category links.
    ///
    /// Runs in one transaction. Does not validate the draft; see
    /// [`QuestionDraft::validate`].
    pub fn insert_question(&self, draft: &QuestionDraft) -> Result<String> {
        let question_id = uuid::Uuid::new_v4().to_string();
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO questions (id, question_text_en, difficulty_level, points,
                                   explanation_en, is_published, language, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                question_id,
                draft.question_text_en,
                draft.difficulty.as_str(),
                draft.points,
                draft.explanation_en,
                draft.is_published,
                draft.language,
                fmt_ts(&Utc::now()),
            ],
        )?;

        {
            let mut option_stmt = tx.prepare(
                r#"
                INSERT INTO options (id, question_id, option_text_en, is_correct, display_order)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )?;
            for (order, option) in draft.options.iter().enumerate() {
                option_stmt.execute(params![
                    uuid::Uuid::new_v4().to_string(),
                    question_id,
                    option.option_text_en,
                    option.is_correct,
                    order as i64,
                ])?;
            }

            let mut link_stmt = tx.prepare(
                "INSERT OR IGNORE INTO question_categories (question_id, category_id) VALUES (?1, ?2)",
            )?;
            for category_id in &draft.category_ids {
                link_stmt.execute(params![question_id, category_id])?;
            }
        }

        tx.commit()?;
        Ok(question_id)
    }

    /// Published questions of a published category, optionally filtered by difficulty.
    pub fn list_quiz_questions(
        &self,
        category_slug: &str,
        difficulty: Option<Difficulty>,
        limit: usize,
    ) -> Result<Vec<Question>> {
        let conn = self.lock();

        let mut sql = String::from(
            r#"
            SELECT q.id, q.question_text_en, q.difficulty_level, q.points,
                   q.explanation_en, q.is_published, q.language
            FROM questions q
            JOIN question_categories qc ON qc.question_id = q.id
            JOIN categories c ON c.id = qc.category_id
            WHERE c.slug = ? AND c.is_published = 1 AND q.is_published = 1
            "#,
        );
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(category_slug.to_string())];

        if let Some(difficulty) = difficulty {
            sql.push_str(" AND q.difficulty_level = ?");
            params.push(Box::new(difficulty.as_str().to_string()));
        }

        sql.push_str(&format!(" ORDER BY q.created_at ASC, q.id ASC LIMIT {}", limit));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&sql)?;
        let mut questions = stmt
            .query_map(params_refs.as_slice(), Self::row_to_question)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for question in &mut questions {
            question.options = Self::load_options(&conn, &question.id)?;
        }

        Ok(questions)
    }

    fn load_options(conn: &Connection, question_id: &str) -> Result<Vec<QuizOption>> {
        let mut stmt = conn.prepare_cached(
            r#"
            SELECT id, question_id, option_text_en, is_correct, display_order
            FROM options WHERE question_id = ? ORDER BY display_order ASC
            "#,
        )?;
        let options = stmt
            .query_map([question_id], |row| {
                Ok(QuizOption {
                    id: row.get("id")?,
                    question_id: row.get("question_id")?,
                    option_text_en: row.get("option_text_en")?,
                    is_correct: row.get("is_correct")?,
                    display_order: row.get("display_order")?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(options)
    }

    fn row_to_question(row: &Row) -> rusqlite::Result<Question> {
        let difficulty_str: String = row.get("difficulty_level")?;
        Ok(Question {
            id: row.get("id")?,
            question_text_en: row.get("question_text_en")?,
            difficulty: difficulty_str.parse().unwrap_or(Difficulty::Medium),
            points: row.get("points")?,
            explanation_en: row.get("explanation_en")?,
            is_published: row.get("is_published")?,
            language: row.get("language")?,
            options: vec![],
        })
    }

    /// Count questions in the store
    pub fn count_questions(&self) -> Result<i64> {
        let conn = self.lock();
        let count = conn.query_row("SELECT COUNT(*) FROM questions", [], |r| r.get(0))?;
        Ok(count)
    }

    // ============================================
    // Attempt operations
    // ============================================

    /// Create a `started` attempt
    pub fn start_attempt(
        &self,
        user_id: &str,
        category_id: Option<&str>,
        started_at: DateTime<Utc>,
    ) -> Result<QuizAttempt> {
        let attempt = QuizAttempt {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            category_id: category_id.map(str::to_string),
            score: None,
            status: AttemptStatus::Started,
            started_at,
            completed_at: None,
            time_taken_seconds: None,
            created_at: started_at,
        };

        let conn = self.lock();
        conn.execute(
            r#"
            INSERT INTO quiz_attempts (id, user_id, category_id, score, status,
                                       started_at, completed_at, time_taken_seconds, created_at)
            VALUES (?1, ?2, ?3, NULL, ?4, ?5, NULL, NULL, ?6)
            "#,
            params![
                attempt.id,
                attempt.user_id,
                attempt.category_id,
                attempt.status.as_str(),
                fmt_ts(&attempt.started_at),
                fmt_ts(&attempt.created_at),
            ],
        )?;
        Ok(attempt)
    }

    /// Mark a `started` attempt of `user_id` completed and store its answers.
    ///
    /// An attempt that does not exist or belongs to someone else is
    /// [`Error::AttemptNotFound`]; one that is already completed is
    /// [`Error::AttemptCompleted`]. Nothing is written in either case.
    pub fn complete_attempt(
        &self,
        attempt_id: &str,
        user_id: &str,
        score: i64,
        answers: &[UserAnswer],
        completed_at: DateTime<Utc>,
        time_taken_seconds: i64,
    ) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let updated = tx.execute(
            r#"
            UPDATE quiz_attempts
            SET score = ?1, status = ?2, completed_at = ?3, time_taken_seconds = ?4
            WHERE id = ?5 AND user_id = ?6 AND status = ?7
            "#,
            params![
                score,
                AttemptStatus::Completed.as_str(),
                fmt_ts(&completed_at),
                time_taken_seconds,
                attempt_id,
                user_id,
                AttemptStatus::Started.as_str(),
            ],
        )?;
        if updated == 0 {
            let owner: Option<String> = tx
                .query_row(
                    "SELECT user_id FROM quiz_attempts WHERE id = ?",
                    [attempt_id],
                    |row| row.get(0),
                )
                .optional()?;
            return Err(match owner {
                Some(owner) if owner == user_id => Error::AttemptCompleted(attempt_id.to_string()),
                _ => Error::AttemptNotFound(attempt_id.to_string()),
            });
        }

        {
            let mut answer_stmt = tx.prepare(
                r#"
                INSERT INTO user_answers (id, quiz_attempt_id, question_id, selected_option_id,
                                          is_correct, answered_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )?;
            for answer in answers {
                answer_stmt.execute(params![
                    uuid::Uuid::new_v4().to_string(),
                    attempt_id,
                    answer.question_id,
                    answer.selected_option_id,
                    answer.is_correct,
                    fmt_ts(&completed_at),
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Stored answers of an attempt in answer order, each with its question and options
    pub fn list_attempt_answers(&self, attempt_id: &str) -> Result<Vec<AnswerReview>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            r#"
            SELECT ua.selected_option_id, ua.is_correct,
                   q.id, q.question_text_en, q.difficulty_level, q.points,
                   q.explanation_en, q.is_published, q.language
            FROM user_answers ua
            JOIN questions q ON q.id = ua.question_id
            WHERE ua.quiz_attempt_id = ?
            ORDER BY ua.rowid ASC
            "#,
        )?;
        let mut reviews = stmt
            .query_map([attempt_id], |row| {
                Ok(AnswerReview {
                    question: Self::row_to_question(row)?,
                    selected_option_id: row.get("selected_option_id")?,
                    is_correct: row.get("is_correct")?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for review in &mut reviews {
            review.question.options = Self::load_options(&conn, &review.question.id)?;
        }
        Ok(reviews)
    }

    /// Get an attempt by ID
    pub fn get_attempt(&self, id: &str) -> Result<Option<QuizAttempt>> {
        let conn = self.lock();
        conn.query_row("SELECT * FROM quiz_attempts WHERE id = ?", [id], |row| {
            Self::row_to_attempt(row)
        })
        .optional()
        .map_err(Error::from)
    }

    /// List attempts joined with their category name
    pub fn list_attempt_records(&self, filter: &AttemptFilter) -> Result<Vec<AttemptRecord>> {
        let conn = self.lock();

        let mut sql = String::from(
            r#"
            SELECT qa.id, qa.user_id, c.name_en AS category_name, qa.score, qa.status,
                   qa.created_at, qa.completed_at
            FROM quiz_attempts qa
            LEFT JOIN categories c ON c.id = qa.category_id
            WHERE 1=1
            "#,
        );
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![];

        if let Some(user_id) = &filter.user_id {
            sql.push_str(" AND qa.user_id = ?");
            params.push(Box::new(user_id.clone()));
        }

        if let Some(category_id) = &filter.category_id {
            sql.push_str(" AND qa.category_id = ?");
            params.push(Box::new(category_id.clone()));
        }

        if let Some(status) = &filter.status {
            sql.push_str(" AND qa.status = ?");
            params.push(Box::new(status.as_str().to_string()));
        }

        if let Some(from) = &filter.from {
            sql.push_str(" AND qa.created_at >= ?");
            params.push(Box::new(fmt_ts(from)));
        }

        if let Some(to) = &filter.to {
            sql.push_str(" AND qa.created_at <= ?");
            params.push(Box::new(fmt_ts(to)));
        }

        match filter.order {
            AttemptOrder::CreatedAsc => sql.push_str(" ORDER BY qa.created_at ASC, qa.id ASC"),
            AttemptOrder::CompletedDesc => {
                sql.push_str(" ORDER BY qa.completed_at DESC NULLS LAST, qa.created_at DESC")
            }
        }

        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_refs.as_slice(), |row| {
                let status_str: String = row.get("status")?;
                let created_at_str: String = row.get("created_at")?;
                let completed_at_str: Option<String> = row.get("completed_at")?;
                Ok(AttemptRecord {
                    id: row.get("id")?,
                    user_id: row.get("user_id")?,
                    category_name: row.get("category_name")?,
                    score: row.get("score")?,
                    status: status_str.parse().unwrap_or(AttemptStatus::Started),
                    created_at: parse_ts(&created_at_str).unwrap_or_else(Utc::now),
                    completed_at: completed_at_str.as_deref().and_then(parse_ts),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn row_to_attempt(row: &Row) -> rusqlite::Result<QuizAttempt> {
        let status_str: String = row.get("status")?;
        let started_at_str: String = row.get("started_at")?;
        let completed_at_str: Option<String> = row.get("completed_at")?;
        let created_at_str: String = row.get("created_at")?;

        Ok(QuizAttempt {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            category_id: row.get("category_id")?,
            score: row.get("score")?,
            status: status_str.parse().unwrap_or(AttemptStatus::Started),
            started_at: parse_ts(&started_at_str).unwrap_or_else(Utc::now),
            completed_at: completed_at_str.as_deref().and_then(parse_ts),
            time_taken_seconds: row.get("time_taken_seconds")?,
            created_at: parse_ts(&created_at_str).unwrap_or_else(Utc::now),
        })
    }

    // ============================================
    // Derived statistics
    // ============================================

    /// Per-question stats for questions answered at least `min_attempts` times
    pub fn list_question_stats(&self, min_attempts: i64) -> Result<Vec<QuestionStat>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            r#"
            SELECT question_id, question_text, total_attempts, correct_percentage
            FROM question_stats
            WHERE total_attempts >= ?
            ORDER BY question_id ASC
            "#,
        )?;
        let stats = stmt
            .query_map([min_attempts], |row| {
                Ok(QuestionStat {
                    question_id: row.get(0)?,
                    question_text: row.get(1)?,
                    total_attempts: row.get(2)?,
                    correct_percentage: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(stats)
    }

    /// A user's answer totals per category, most answered first
    pub fn user_category_performance(&self, user_id: &str) -> Result<Vec<CategoryPerformance>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            r#"
            SELECT category_name, correct_answers, total_questions_answered
            FROM user_category_performance
            WHERE user_id = ?
            ORDER BY total_questions_answered DESC, category_name ASC
            "#,
        )?;
        let rows = stmt
            .query_map([user_id], |row| {
                Ok(CategoryPerformance {
                    category_name: row.get(0)?,
                    correct_answers: row.get(1)?,
                    total_questions_answered: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ============================================
    // Leaderboard operations
    // ============================================

    /// Replace all rows of one leaderboard view, as the ranking job does
    pub fn replace_leaderboard(
        &self,
        period: LeaderboardPeriod,
        category_id: Option<&str>,
        entries: &[LeaderboardEntry],
    ) -> Result<()> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM leaderboards WHERE period = ?1 AND category_id IS ?2",
            params![period.as_str(), category_id],
        )?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO leaderboards (period, category_id, rank, user_id, full_name,
                                          total_score, quizzes_completed)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;
            for entry in entries {
                stmt.execute(params![
                    period.as_str(),
                    category_id,
                    entry.rank,
                    entry.user_id,
                    entry.full_name,
                    entry.total_score,
                    entry.quizzes_completed,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Leaderboard rows for a view ordered by rank
    pub fn list_leaderboard(
        &self,
        period: LeaderboardPeriod,
        category_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT * FROM leaderboards
            WHERE period = ?1 AND category_id IS ?2
            ORDER BY rank ASC
            LIMIT {}
            "#,
            limit
        ))?;
        let entries = stmt
            .query_map(params![period.as_str(), category_id], Self::row_to_leaderboard_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// A single user's row in a leaderboard view
    pub fn get_user_leaderboard_entry(
        &self,
        user_id: &str,
        period: LeaderboardPeriod,
        category_id: Option<&str>,
    ) -> Result<Option<LeaderboardEntry>> {
        let conn = self.lock();
        conn.query_row(
            "SELECT * FROM leaderboards WHERE user_id = ?1 AND period = ?2 AND category_id IS ?3",
            params![user_id, period.as_str(), category_id],
            Self::row_to_leaderboard_entry,
        )
        .optional()
        .map_err(Error::from)
    }

    fn row_to_leaderboard_entry(row: &Row) -> rusqlite::Result<LeaderboardEntry> {
        let period_str: String = row.get("period")?;

        Ok(LeaderboardEntry {
            rank: row.get("rank")?,
            user_id: row.get("user_id")?,
            full_name: row.get("full_name")?,
            period: LeaderboardPeriod::parse_or_default(&period_str),
            category_id: row.get("category_id")?,
            total_score: row.get("total_score")?,
            quizzes_completed: row.get("quizzes_completed")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn setup() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn create_test_profile(id: &str, role: Role, created_at: DateTime<Utc>) -> Profile {
        Profile {
            id: id.to_string(),
            full_name: Some(format!("User {}", id)),
            role,
            current_streak: 0,
            created_at,
        }
    }

    fn create_test_category(db: &Database, name: &str) -> Category {
        db.insert_category(&NewCategory {
            name_en: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            is_published: true,
            ..Default::default()
        })
        .unwrap()
    }

    fn create_test_question(category_ids: Vec<String>) -> QuestionDraft {
        QuestionDraft {
            question_text_en: "2 + 2?".to_string(),
            difficulty: Difficulty::Easy,
            points: 1,
            explanation_en: None,
            is_published: true,
            language: "en".to_string(),
            options: vec![
                OptionDraft {
                    option_text_en: "3".to_string(),
                    is_correct: false,
                },
                OptionDraft {
                    option_text_en: "4".to_string(),
                    is_correct: true,
                },
            ],
            category_ids,
        }
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_profile_roundtrip_and_role() {
        let db = setup();
        db.insert_profile(&create_test_profile("u1", Role::Admin, day(1)))
            .unwrap();

        let profile = db.get_profile("u1").unwrap().unwrap();
        assert_eq!(profile.role, Role::Admin);
        assert_eq!(profile.created_at, day(1));
        assert_eq!(db.get_role("u1").unwrap(), Some(Role::Admin));
        assert_eq!(db.get_role("missing").unwrap(), None);

        db.set_role("u1", Role::PremiumUser).unwrap();
        assert_eq!(db.get_role("u1").unwrap(), Some(Role::PremiumUser));
        assert!(matches!(
            db.set_role("missing", Role::User),
            Err(Error::ProfileNotFound(_))
        ));
    }

    #[test]
    fn test_signups_in_range() {
        let db = setup();
        for (id, d) in [("a", 1), ("b", 5), ("c", 9)] {
            db.insert_profile(&create_test_profile(id, Role::User, day(d)))
                .unwrap();
        }

        let signups = db.list_signups(day(2), day(9)).unwrap();
        assert_eq!(signups, vec![day(5), day(9)]);
    }

    #[test]
    fn test_question_insert_and_quiz_listing() {
        let db = setup();
        let math = create_test_category(&db, "Math");
        db.insert_question(&create_test_question(vec![math.id.clone()]))
            .unwrap();

        let questions = db.list_quiz_questions("math", None, 10).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].options.len(), 2);
        assert_eq!(questions[0].correct_option().unwrap().option_text_en, "4");

        let hard = db
            .list_quiz_questions("math", Some(Difficulty::Hard), 10)
            .unwrap();
        assert!(hard.is_empty());
    }

    #[test]
    fn test_attempt_lifecycle_and_filters() {
        let db = setup();
        db.insert_profile(&create_test_profile("u1", Role::PremiumUser, day(1)))
            .unwrap();
        let math = create_test_category(&db, "Math");

        let attempt = db.start_attempt("u1", Some(&math.id), day(3)).unwrap();
        db.start_attempt("u1", None, day(4)).unwrap();

        db.complete_attempt(&attempt.id, "u1", 7, &[], day(3), 120).unwrap();

        let stored = db.get_attempt(&attempt.id).unwrap().unwrap();
        assert_eq!(stored.status, AttemptStatus::Completed);
        assert_eq!(stored.score, Some(7));
        assert_eq!(stored.time_taken_seconds, Some(120));

        let completed = db
            .list_attempt_records(&AttemptFilter::completed_between(day(1), day(5)))
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].category_name.as_deref(), Some("Math"));

        let all = db
            .list_attempt_records(&AttemptFilter::default().for_user("u1"))
            .unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[1].category_name.is_none());
    }

    #[test]
    fn test_complete_missing_attempt_fails() {
        let db = setup();
        let result = db.complete_attempt("nope", "u1", 1, &[], day(1), 1);
        assert!(matches!(result, Err(Error::AttemptNotFound(_))));
    }

    #[test]
    fn test_complete_attempt_only_once_and_only_by_owner() {
        let db = setup();
        for id in ["u1", "u2"] {
            db.insert_profile(&create_test_profile(id, Role::PremiumUser, day(1)))
                .unwrap();
        }
        let math = create_test_category(&db, "Math");
        let question_id = db
            .insert_question(&create_test_question(vec![math.id.clone()]))
            .unwrap();
        let answer = |is_correct| UserAnswer {
            question_id: question_id.clone(),
            selected_option_id: None,
            is_correct: Some(is_correct),
        };

        let attempt = db.start_attempt("u1", Some(&math.id), day(2)).unwrap();

        let stolen = db.complete_attempt(&attempt.id, "u2", 1, &[answer(true)], day(2), 5);
        assert!(matches!(stolen, Err(Error::AttemptNotFound(_))));

        db.complete_attempt(&attempt.id, "u1", 1, &[answer(true)], day(2), 5)
            .unwrap();
        let again = db.complete_attempt(&attempt.id, "u1", 0, &[answer(false)], day(3), 500);
        assert!(matches!(again, Err(Error::AttemptCompleted(_))));

        let stored = db.get_attempt(&attempt.id).unwrap().unwrap();
        assert_eq!(stored.score, Some(1));
        assert_eq!(stored.time_taken_seconds, Some(5));
        assert_eq!(stored.completed_at, Some(day(2)));

        let stats = db.list_question_stats(1).unwrap();
        assert_eq!(stats[0].total_attempts, 1);
        assert_eq!(stats[0].correct_percentage, 100.0);
        assert_eq!(db.list_attempt_answers(&attempt.id).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_profile_cascades_to_attempts() {
        let db = setup();
        db.insert_profile(&create_test_profile("u1", Role::User, day(1)))
            .unwrap();
        db.start_attempt("u1", None, day(2)).unwrap();

        db.delete_profile("u1").unwrap();
        let remaining = db.list_attempt_records(&AttemptFilter::default()).unwrap();
        assert!(remaining.is_empty());
    }

    #[test]
    fn test_leaderboard_replace_and_lookup() {
        let db = setup();
        let entry = |rank: i64, user: &str, score: i64| LeaderboardEntry {
            rank,
            user_id: user.to_string(),
            full_name: None,
            period: LeaderboardPeriod::Weekly,
            category_id: None,
            total_score: score,
            quizzes_completed: 1,
        };

        db.replace_leaderboard(LeaderboardPeriod::Weekly, None, &[entry(1, "a", 50)])
            .unwrap();
        db.replace_leaderboard(
            LeaderboardPeriod::Weekly,
            None,
            &[entry(2, "b", 30), entry(1, "a", 60)],
        )
        .unwrap();

        let rows = db
            .list_leaderboard(LeaderboardPeriod::Weekly, None, 100)
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].user_id, "a");
        assert_eq!(rows[0].total_score, 60);

        let mine = db
            .get_user_leaderboard_entry("b", LeaderboardPeriod::Weekly, None)
            .unwrap()
            .unwrap();
        assert_eq!(mine.rank, 2);
        assert!(db
            .get_user_leaderboard_entry("b", LeaderboardPeriod::Monthly, None)
            .unwrap()
            .is_none());
    }
}
