//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: content, attempts, profiles, leaderboards
    r#"
    CREATE TABLE IF NOT EXISTS profiles (
        id               TEXT PRIMARY KEY,
        full_name        TEXT,
        role             TEXT NOT NULL DEFAULT 'user',
        current_streak   INTEGER NOT NULL DEFAULT 0,
        created_at       DATETIME NOT NULL
    );

    CREATE TABLE IF NOT EXISTS categories (
        id                 TEXT PRIMARY KEY,
        name_en            TEXT NOT NULL,
        slug               TEXT NOT NULL UNIQUE,
        name_ne            TEXT,
        description_en     TEXT,
        description_ne     TEXT,
        parent_category_id TEXT REFERENCES categories(id),
        is_published       INTEGER NOT NULL DEFAULT 1,
        created_at         DATETIME NOT NULL
    );

    CREATE TABLE IF NOT EXISTS questions (
        id               TEXT PRIMARY KEY,
        question_text_en TEXT NOT NULL,
        difficulty_level TEXT NOT NULL,
        points           INTEGER NOT NULL DEFAULT 1,
        explanation_en   TEXT,
        is_published     INTEGER NOT NULL DEFAULT 1,
        language         TEXT NOT NULL DEFAULT 'en',
        created_at       DATETIME NOT NULL
    );

    CREATE TABLE IF NOT EXISTS options (
        id               TEXT PRIMARY KEY,
        question_id      TEXT NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
        option_text_en   TEXT NOT NULL,
        is_correct       INTEGER NOT NULL DEFAULT 0,
        display_order    INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS question_categories (
        question_id      TEXT NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
        category_id      TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
        PRIMARY KEY (question_id, category_id)
    );

    CREATE TABLE IF NOT EXISTS quiz_attempts (
        id                 TEXT PRIMARY KEY,
        user_id            TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
        category_id        TEXT REFERENCES categories(id),
        score              INTEGER,
        status             TEXT NOT NULL,
        started_at         DATETIME NOT NULL,
        completed_at       DATETIME,
        time_taken_seconds INTEGER,
        created_at         DATETIME NOT NULL
    );

    CREATE TABLE IF NOT EXISTS user_answers (
        id                 TEXT PRIMARY KEY,
        quiz_attempt_id    TEXT NOT NULL REFERENCES quiz_attempts(id) ON DELETE CASCADE,
        question_id        TEXT NOT NULL REFERENCES questions(id),
        selected_option_id TEXT REFERENCES options(id),
        is_correct         INTEGER,
        answered_at        DATETIME NOT NULL
    );

    -- Written by external ranking jobs
    CREATE TABLE IF NOT EXISTS leaderboards (
        id                INTEGER PRIMARY KEY AUTOINCREMENT,
        period            TEXT NOT NULL,
        category_id       TEXT REFERENCES categories(id),
        rank              INTEGER NOT NULL,
        user_id           TEXT NOT NULL,
        full_name         TEXT,
        total_score       INTEGER NOT NULL,
        quizzes_completed INTEGER NOT NULL DEFAULT 0
    );

    CREATE INDEX IF NOT EXISTS idx_attempts_user ON quiz_attempts(user_id);
    CREATE INDEX IF NOT EXISTS idx_attempts_created ON quiz_attempts(created_at);
    CREATE INDEX IF NOT EXISTS idx_attempts_status ON quiz_attempts(status);
    CREATE INDEX IF NOT EXISTS idx_answers_attempt ON user_answers(quiz_attempt_id);
    CREATE INDEX IF NOT EXISTS idx_options_question ON options(question_id);
    CREATE INDEX IF NOT EXISTS idx_profiles_created ON profiles(created_at);
    CREATE INDEX IF NOT EXISTS idx_leaderboards_view ON leaderboards(period, category_id, rank);
    CREATE INDEX IF NOT EXISTS idx_leaderboards_user ON leaderboards(user_id);
    "#,
    // Version 2: derived views read by analytics and the dashboard
    r#"
    CREATE VIEW IF NOT EXISTS question_stats AS
    SELECT
        ua.question_id                                          AS question_id,
        q.question_text_en                                      AS question_text,
        COUNT(*)                                                AS total_attempts,
        100.0 * SUM(CASE WHEN ua.is_correct = 1 THEN 1 ELSE 0 END) / COUNT(*)
                                                                AS correct_percentage
    FROM user_answers ua
    JOIN questions q ON q.id = ua.question_id
    GROUP BY ua.question_id;

    CREATE VIEW IF NOT EXISTS user_category_performance AS
    SELECT
        qa.user_id                                              AS user_id,
        c.name_en                                               AS category_name,
        SUM(CASE WHEN ua.is_correct = 1 THEN 1 ELSE 0 END)      AS correct_answers,
        COUNT(*)                                                AS total_questions_answered
    FROM user_answers ua
    JOIN quiz_attempts qa ON qa.id = ua.quiz_attempt_id
    JOIN categories c ON c.id = qa.category_id
    GROUP BY qa.user_id, c.id;
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}
