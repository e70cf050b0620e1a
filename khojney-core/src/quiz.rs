//! Quiz play: question selection, scoring and attempt completion.

use crate::analytics::metrics::round1;
use crate::auth::SessionContext;
use crate::config::QuizConfig;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::types::{AnswerReview, Category, Difficulty, Question, QuizAttempt, UserAnswer};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// What the player asked for.
#[derive(Debug, Clone, Default)]
pub struct QuizRequest {
    pub category_slug: String,
    /// `None` for any difficulty
    pub difficulty: Option<Difficulty>,
    /// `None` uses the configured default
    pub limit: Option<usize>,
}

/// A quiz in progress.
#[derive(Debug, Clone)]
pub struct QuizPlay {
    pub attempt: QuizAttempt,
    pub category: Category,
    pub questions: Vec<Question>,
}

/// Outcome of a finished quiz.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizResult {
    pub attempt_id: String,
    /// Number of correctly answered questions
    pub score: i64,
    pub total_questions: usize,
    pub time_taken_seconds: i64,
    /// Seconds per question, one decimal; `None` without questions
    pub time_per_question: Option<f64>,
}

/// Select questions and record a `started` attempt.
///
/// Free-tier users are turned away before anything is written.
pub fn start_quiz(
    db: &Database,
    session: &SessionContext,
    request: &QuizRequest,
    config: &QuizConfig,
) -> Result<QuizPlay> {
    let user_id = session.require_user()?;
    if !session.can_start_quiz() {
        return Err(Error::Unauthorized(
            "premium membership required to start quizzes".to_string(),
        ));
    }

    let category = db
        .get_category_by_slug(&request.category_slug)?
        .filter(|c| c.is_published)
        .ok_or_else(|| Error::CategoryNotFound(request.category_slug.clone()))?;

    let limit = request.limit.unwrap_or(config.default_question_limit);
    let questions = db.list_quiz_questions(&category.slug, request.difficulty, limit)?;
    let attempt = db.start_attempt(user_id, Some(&category.id), Utc::now())?;

    tracing::info!(
        user_id,
        attempt_id = %attempt.id,
        category = %category.slug,
        questions = questions.len(),
        "Quiz started"
    );

    Ok(QuizPlay {
        attempt,
        category,
        questions,
    })
}

/// Grade each question against the chosen option ids (question id to option id).
///
/// Unanswered questions get no selection and no correctness.
pub fn grade_answers(questions: &[Question], answers: &HashMap<String, String>) -> Vec<UserAnswer> {
    questions
        .iter()
        .map(|q| {
            let selected = answers.get(&q.id).cloned();
            let is_correct = selected
                .as_deref()
                .map(|chosen| q.correct_option().map_or(false, |o| o.id == chosen));
            UserAnswer {
                question_id: q.id.clone(),
                selected_option_id: selected,
                is_correct,
            }
        })
        .collect()
}

/// Number of questions whose chosen option is the correct one.
pub fn score_answers(questions: &[Question], answers: &HashMap<String, String>) -> i64 {
    grade_answers(questions, answers)
        .iter()
        .filter(|a| a.is_correct == Some(true))
        .count() as i64
}

/// Store the answers and complete the attempt.
///
/// Only the player who started the attempt may finish it, and only once.
pub fn finish_quiz(
    db: &Database,
    session: &SessionContext,
    play: &QuizPlay,
    answers: &HashMap<String, String>,
    completed_at: DateTime<Utc>,
) -> Result<QuizResult> {
    let user_id = session.require_user()?;
    let graded = grade_answers(&play.questions, answers);
    let score = graded.iter().filter(|a| a.is_correct == Some(true)).count() as i64;
    let time_taken_seconds = (completed_at - play.attempt.started_at).num_seconds().max(0);

    db.complete_attempt(
        &play.attempt.id,
        user_id,
        score,
        &graded,
        completed_at,
        time_taken_seconds,
    )?;

    let total_questions = play.questions.len();
    let time_per_question =
        (total_questions > 0).then(|| round1(time_taken_seconds as f64 / total_questions as f64));

    tracing::info!(
        attempt_id = %play.attempt.id,
        score,
        total_questions,
        time_taken_seconds,
        "Quiz completed"
    );

    Ok(QuizResult {
        attempt_id: play.attempt.id.clone(),
        score,
        total_questions,
        time_taken_seconds,
        time_per_question,
    })
}

/// A stored attempt with per-question review, as shown after a quiz.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptResult {
    pub attempt: QuizAttempt,
    /// Category name, or "Quiz" for attempts without one
    pub category_name: String,
    /// Answers stored for the attempt
    pub total_questions: usize,
    pub correct_answers: i64,
    /// Whole percent of correct answers
    pub accuracy: i64,
    /// Seconds per question, one decimal; `None` without answers or timing
    pub time_per_question: Option<f64>,
    pub answers: Vec<AnswerReview>,
}

/// Load one of the signed-in user's attempts with its answers.
///
/// Another user's attempt is reported as not found.
pub fn load_result(
    db: &Database,
    session: &SessionContext,
    attempt_id: &str,
) -> Result<AttemptResult> {
    let user_id = session.require_user()?;
    let attempt = db
        .get_attempt(attempt_id)?
        .filter(|a| a.user_id == user_id)
        .ok_or_else(|| Error::AttemptNotFound(attempt_id.to_string()))?;

    let category_name = match &attempt.category_id {
        Some(id) => db.get_category(id)?.map(|c| c.name_en),
        None => None,
    }
    .unwrap_or_else(|| "Quiz".to_string());

    let answers = db.list_attempt_answers(attempt_id)?;
    let total_questions = answers.len();
    let correct_answers = attempt.score.unwrap_or(0);
    let accuracy = if total_questions > 0 {
        (correct_answers as f64 / total_questions as f64 * 100.0).round() as i64
    } else {
        0
    };
    let time_per_question = attempt
        .time_taken_seconds
        .filter(|_| total_questions > 0)
        .map(|secs| round1(secs as f64 / total_questions as f64));

    tracing::debug!(attempt_id, total_questions, accuracy, "Loaded quiz result");

    Ok(AttemptResult {
        attempt,
        category_name,
        total_questions,
        correct_answers,
        accuracy,
        time_per_question,
        answers,
    })
}
