//! Integration tests for the khojney content, play and analytics flow
//!
//! Each test builds a store from the sample import files, plays quizzes
//! through the public API and reads the results back through analytics.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use khojney_core::analytics::{
    generate_report, load_dashboard, load_leaderboard, AnalyticsScope, DateRange, HistoryFilter,
};
use khojney_core::config::{AnalyticsConfig, QuizConfig};
use khojney_core::import::{import_categories, import_questions, sample};
use khojney_core::quiz::{finish_quiz, load_result, start_quiz, QuizRequest};
use khojney_core::{
    AuthSession, Database, Error, LeaderboardEntry, LeaderboardPeriod, Profile, Role,
    SessionContext,
};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

fn add_profile(db: &Database, id: &str, role: Role) {
    db.insert_profile(&Profile {
        id: id.to_string(),
        full_name: Some(format!("User {}", id)),
        role,
        current_streak: 0,
        created_at: Utc::now(),
    })
    .unwrap();
}

/// A migrated store with an admin, a premium player and the sample content.
fn seeded_db() -> Arc<Database> {
    khojney_core::logging::init_test();
    let db = Arc::new(Database::open_in_memory().unwrap());
    db.migrate().unwrap();
    add_profile(&db, "admin", Role::Admin);
    add_profile(&db, "player", Role::PremiumUser);

    let admin = SessionContext::signed_in(&db, AuthSession::new("admin"));
    db.insert_category(&khojney_core::NewCategory {
        name_en: "Geography".to_string(),
        slug: "geography".to_string(),
        is_published: true,
        ..Default::default()
    })
    .unwrap();
    import_categories(&db, &admin, &sample::categories_csv()).unwrap();
    import_questions(&db, &admin, &sample::questions_csv()).unwrap();
    db
}

fn play_geography(db: &Database, user: &str, pick_correct: bool) -> String {
    let session = SessionContext::signed_in(db, AuthSession::new(user));
    let request = QuizRequest {
        category_slug: "geography".to_string(),
        ..Default::default()
    };
    let play = start_quiz(db, &session, &request, &QuizConfig::default()).unwrap();

    let mut answers = HashMap::new();
    for q in &play.questions {
        let option = q
            .options
            .iter()
            .find(|o| o.is_correct == pick_correct)
            .unwrap();
        answers.insert(q.id.clone(), option.id.clone());
    }
    let done = play.attempt.started_at + Duration::seconds(20);
    finish_quiz(db, &session, &play, &answers, done)
        .unwrap()
        .attempt_id
}

// ============================================
// Import
// ============================================

#[test]
fn test_sample_files_import_into_tree() {
    let db = seeded_db();
    let physics = db.get_category_by_slug("physics").unwrap().unwrap();
    let quantum = db.get_category_by_slug("quantum-mechanics").unwrap().unwrap();
    assert_eq!(quantum.parent_category_id.as_deref(), Some(physics.id.as_str()));
    assert_eq!(db.count_questions().unwrap(), 1);

    // Unknown "General Knowledge" was skipped, Geography linked
    let questions = db.list_quiz_questions("geography", None, 10).unwrap();
    assert_eq!(questions.len(), 1);
}

#[test]
fn test_child_before_parent_reports_parent_not_found() {
    let db = Database::open_in_memory().unwrap();
    db.migrate().unwrap();
    add_profile(&db, "admin", Role::Admin);
    let admin = SessionContext::signed_in(&db, AuthSession::new("admin"));

    let csv = "name_en,slug,name_ne,description_en,description_ne,parent_category_name,is_published\n\
               Quantum Mechanics,quantum-mechanics,,,,Physics,true\n\
               Physics,physics,,,,,true\n";
    let err = import_categories(&db, &admin, csv).unwrap_err();

    assert!(matches!(err, Error::Import { line: 2, .. }));
    assert!(err.to_string().contains("not found"));
    assert!(db.list_categories().unwrap().is_empty());
}

// ============================================
// Quiz play and dashboard
// ============================================

#[test]
fn test_played_quizzes_show_on_dashboard() {
    let db = seeded_db();
    play_geography(&db, "player", true);
    play_geography(&db, "player", false);

    let session = SessionContext::signed_in(&db, AuthSession::new("player"));
    let dashboard = load_dashboard(&db, &session).unwrap();

    assert_eq!(dashboard.stats.total_quizzes, 2);
    assert_eq!(dashboard.stats.total_questions, 2);
    assert_eq!(dashboard.stats.accuracy, 50.0);
    assert_eq!(dashboard.performance.len(), 1);
    assert_eq!(dashboard.performance[0].category_name, "Geography");
    assert_eq!(
        dashboard.available_categories(),
        vec!["all".to_string(), "Geography".to_string()]
    );

    let filter = HistoryFilter::parse("Geography", "completed").unwrap();
    let page = dashboard.history(&filter, 1, 5);
    assert_eq!(page.total_filtered, 2);
    assert_eq!(page.total_pages, 1);
}

#[test]
fn test_dashboard_lists_latest_completion_first() {
    let db = seeded_db();
    let geography = db.get_category_by_slug("geography").unwrap().unwrap();
    let at = |day: u32| Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).unwrap();

    let first_started = db.start_attempt("player", Some(&geography.id), at(1)).unwrap();
    let second_started = db.start_attempt("player", Some(&geography.id), at(2)).unwrap();
    let abandoned = db.start_attempt("player", Some(&geography.id), at(3)).unwrap();
    let in_progress = db.start_attempt("player", None, at(4)).unwrap();

    // Finished in the opposite order to how they were started
    db.complete_attempt(&second_started.id, "player", 1, &[], at(5), 60)
        .unwrap();
    db.complete_attempt(&first_started.id, "player", 0, &[], at(9), 60)
        .unwrap();

    let session = SessionContext::signed_in(&db, AuthSession::new("player"));
    let dashboard = load_dashboard(&db, &session).unwrap();
    let expected = vec![
        first_started.id.as_str(),
        second_started.id.as_str(),
        in_progress.id.as_str(),
        abandoned.id.as_str(),
    ];

    let ids: Vec<_> = dashboard.attempts.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, expected);

    let page = dashboard.history(&HistoryFilter::default(), 1, 10);
    let ids: Vec<_> = page.attempts.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, expected);
}

#[test]
fn test_stored_result_belongs_to_player() {
    let db = seeded_db();
    let attempt_id = play_geography(&db, "player", true);

    let player = SessionContext::signed_in(&db, AuthSession::new("player"));
    let result = load_result(&db, &player, &attempt_id).unwrap();
    assert_eq!(result.category_name, "Geography");
    assert_eq!(result.total_questions, 1);
    assert_eq!(result.accuracy, 100);
    assert_eq!(result.time_per_question, Some(20.0));
    assert_eq!(
        result.answers[0].question.explanation_en.as_deref(),
        db.list_quiz_questions("geography", None, 1).unwrap()[0]
            .explanation_en
            .as_deref()
    );

    let admin = SessionContext::signed_in(&db, AuthSession::new("admin"));
    assert!(matches!(
        load_result(&db, &admin, &attempt_id),
        Err(Error::AttemptNotFound(_))
    ));
}

#[test]
fn test_free_tier_cannot_play() {
    let db = seeded_db();
    add_profile(&db, "free", Role::User);
    let session = SessionContext::signed_in(&db, AuthSession::new("free"));
    let request = QuizRequest {
        category_slug: "geography".to_string(),
        ..Default::default()
    };
    assert!(matches!(
        start_quiz(&db, &session, &request, &QuizConfig::default()),
        Err(Error::Unauthorized(_))
    ));
}

// ============================================
// Analytics report
// ============================================

#[test]
fn test_report_over_played_quizzes() {
    let db = seeded_db();
    play_geography(&db, "player", true);
    play_geography(&db, "admin", true);

    let admin = SessionContext::signed_in(&db, AuthSession::new("admin"));
    let today = Utc::now().date_naive();
    let range = DateRange::last_days(today, 7);
    let report = generate_report(
        Arc::clone(&db),
        &admin,
        range,
        &AnalyticsScope::AllUsers,
        &AnalyticsConfig::default(),
    )
    .unwrap();

    assert_eq!(report.kpis.total_quizzes, 2);
    assert_eq!(report.kpis.avg_score, 1.0);
    assert_eq!(report.kpis.top_category, "Geography");
    assert_eq!(report.kpis.total_users, 2);
    assert_eq!(report.changes.total_quizzes, 100.0);
    assert_eq!(report.category_chart[0].quizzes, 2);
    assert_eq!(report.activity_chart.len(), 1);
    assert_eq!(report.question_stats.hardest.len(), 1);
    assert_eq!(report.question_stats.hardest[0].correct_percentage, 100.0);

    let single = generate_report(
        db,
        &admin,
        range,
        &AnalyticsScope::User("player".to_string()),
        &AnalyticsConfig::default(),
    )
    .unwrap();
    assert_eq!(single.kpis.total_quizzes, 1);
}

#[test]
fn test_report_range_excludes_other_periods() {
    let db = seeded_db();
    let admin = SessionContext::signed_in(&db, AuthSession::new("admin"));

    let long_ago = Utc.with_ymd_and_hms(2020, 1, 15, 12, 0, 0).unwrap();
    let attempt = db.start_attempt("player", None, long_ago).unwrap();
    db.complete_attempt(&attempt.id, "player", 9, &[], long_ago, 60).unwrap();

    let january = DateRange::new(
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2020, 1, 31).unwrap(),
    )
    .unwrap();
    let report = generate_report(
        Arc::clone(&db),
        &admin,
        january,
        &AnalyticsScope::AllUsers,
        &AnalyticsConfig::default(),
    )
    .unwrap();
    assert_eq!(report.kpis.total_quizzes, 1);
    assert_eq!(report.kpis.top_category, "General");
    assert_eq!(report.kpis.total_users, 0);

    let february = DateRange::new(
        NaiveDate::from_ymd_opt(2020, 2, 1).unwrap(),
        NaiveDate::from_ymd_opt(2020, 2, 29).unwrap(),
    )
    .unwrap();
    let report = generate_report(
        db,
        &admin,
        february,
        &AnalyticsScope::AllUsers,
        &AnalyticsConfig::default(),
    )
    .unwrap();
    assert_eq!(report.kpis.total_quizzes, 0);
    assert_eq!(report.previous_kpis.total_quizzes, 1);
    assert_eq!(report.changes.total_quizzes, -100.0);
}

// ============================================
// Leaderboard
// ============================================

#[test]
fn test_leaderboard_view_with_own_rank() {
    let db = seeded_db();
    let entry = |rank: i64, user: &str| LeaderboardEntry {
        rank,
        user_id: user.to_string(),
        full_name: None,
        period: LeaderboardPeriod::Weekly,
        category_id: None,
        total_score: 10 * (3 - rank),
        quizzes_completed: 1,
    };
    db.replace_leaderboard(
        LeaderboardPeriod::Weekly,
        None,
        &[entry(1, "admin"), entry(2, "player")],
    )
    .unwrap();

    let session = SessionContext::signed_in(&db, AuthSession::new("player"));
    let view = load_leaderboard(&db, &session, LeaderboardPeriod::Weekly, None, 100).unwrap();
    assert_eq!(view.entries.len(), 2);
    assert_eq!(view.user_rank.map(|e| e.rank), Some(2));
}

// ============================================
// File-backed store
// ============================================

#[test]
fn test_file_database_persists_across_opens() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/data.db");

    {
        let db = Database::open(&path).unwrap();
        db.migrate().unwrap();
        add_profile(&db, "admin", Role::Admin);
    }

    let db = Database::open(&path).unwrap();
    db.migrate().unwrap();
    assert_eq!(db.get_role("admin").unwrap(), Some(Role::Admin));
}
