//! Question CSV import.

use super::csv::{CsvRow, CsvTable};
use super::ImportSummary;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::types::{Difficulty, OptionDraft, QuestionDraft};
use std::collections::HashMap;

/// Options per row in an import file.
pub const MAX_OPTIONS: usize = 4;

/// Header of a question import file.
pub fn headers() -> Vec<String> {
    let mut headers: Vec<String> = [
        "question_text_en",
        "difficulty_level",
        "points",
        "explanation_en",
        "is_published",
        "language",
        "categories",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();
    for i in 1..=MAX_OPTIONS {
        headers.push(format!("option{}_text", i));
        headers.push(format!("option{}_is_correct", i));
    }
    headers
}

const REQUIRED: [&str; 3] = ["question_text_en", "difficulty_level", "points"];

/// Validate and insert questions in file order.
///
/// Category names are matched case-insensitively; unknown names are skipped.
pub(crate) fn import(db: &Database, text: &str) -> Result<ImportSummary> {
    let table = CsvTable::parse(text);
    table.require_columns(&REQUIRED)?;

    let by_name = db.category_name_index()?;
    let mut summary = ImportSummary::default();

    for row in &table.rows {
        let result = draft_from_row(row, &by_name).and_then(|draft| {
            db.insert_question(&draft).map_err(|e| {
                row.error(format!(
                    "Adding question \"{}\": {}",
                    preview(&draft.question_text_en),
                    e
                ))
            })
        });
        if let Err(e) = result {
            tracing::warn!(
                line = row.line,
                inserted = summary.inserted,
                error = %e,
                "Question import stopped; earlier rows were kept"
            );
            return Err(e);
        }
        summary.inserted += 1;
    }

    tracing::info!(inserted = summary.inserted, "Imported questions");
    Ok(summary)
}

fn draft_from_row(row: &CsvRow, by_name: &HashMap<String, String>) -> Result<QuestionDraft> {
    let question_text_en = row.required("question_text_en")?.to_string();

    let difficulty_raw = row.required("difficulty_level")?;
    let difficulty: Difficulty = difficulty_raw.parse().map_err(|e: String| row.error(e))?;

    let points_raw = row.required("points")?;
    let points: i64 = points_raw.parse().map_err(|_| {
        row.error(format!("points must be an integer, got \"{}\"", points_raw))
    })?;

    let mut options = Vec::new();
    for i in 1..=MAX_OPTIONS {
        if let Some(text) = row.get(&format!("option{}_text", i)) {
            options.push(OptionDraft {
                option_text_en: text.to_string(),
                is_correct: row.bool_or(&format!("option{}_is_correct", i), false)?,
            });
        }
    }

    let mut category_ids = Vec::new();
    for name in row
        .get("categories")
        .unwrap_or_default()
        .split('|')
        .map(str::trim)
        .filter(|n| !n.is_empty())
    {
        match by_name.get(&name.to_lowercase()) {
            Some(id) => category_ids.push(id.clone()),
            None => tracing::debug!(line = row.line, category = name, "Skipping unknown category"),
        }
    }

    let draft = QuestionDraft {
        question_text_en,
        difficulty,
        points,
        explanation_en: row.get("explanation_en").map(str::to_string),
        is_published: row.bool_or("is_published", true)?,
        language: row.get("language").unwrap_or("en").to_string(),
        options,
        category_ids,
    };

    draft.validate().map_err(|e| match e {
        Error::InvalidQuestion(message) => row.error(message),
        other => other,
    })?;
    Ok(draft)
}

fn preview(text: &str) -> String {
    let mut short: String = text.chars().take(20).collect();
    if short.len() < text.len() {
        short.push_str("...");
    }
    short
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NewCategory;

    fn setup() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        for (name, slug) in [("General Knowledge", "general-knowledge"), ("Geography", "geography")] {
            db.insert_category(&NewCategory {
                name_en: name.to_string(),
                slug: slug.to_string(),
                is_published: true,
                ..Default::default()
            })
            .unwrap();
        }
        db
    }

    fn csv(rows: &[&str]) -> String {
        let mut lines = vec![headers().join(",")];
        lines.extend(rows.iter().map(|r| r.to_string()));
        lines.join("\n")
    }

    #[test]
    fn test_import_links_known_categories_and_skips_unknown() {
        let db = setup();
        let text = csv(&[
            r#""What is the capital of France?","easy",1,"Paris is the capital city.","true","en","general knowledge|Geography|Astronomy","London","false","Paris","true","Berlin","false","Madrid","false""#,
        ]);
        assert_eq!(import(&db, &text).unwrap().inserted, 1);

        let questions = db.list_quiz_questions("geography", None, 10).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].options.len(), 4);
        assert_eq!(questions[0].correct_option().unwrap().option_text_en, "Paris");
        assert_eq!(
            db.list_quiz_questions("general-knowledge", None, 10).unwrap().len(),
            1
        );
    }

    #[test]
    fn test_defaults_and_optional_options() {
        let db = setup();
        let text = csv(&["Is water wet?,Medium,2,,,,Geography,Yes,TRUE,No,,,,,"]);
        import(&db, &text).unwrap();

        let q = &db.list_quiz_questions("geography", None, 10).unwrap()[0];
        assert_eq!(q.difficulty, Difficulty::Medium);
        assert_eq!(q.points, 2);
        assert_eq!(q.language, "en");
        assert!(q.is_published);
        assert_eq!(q.options.len(), 2);
    }

    #[test]
    fn test_invalid_points() {
        let db = setup();
        let err = import(&db, &csv(&["Q?,easy,one,,,,,A,true,,,,,,"])).unwrap_err();
        assert!(matches!(err, Error::Import { line: 2, .. }));
        assert!(err.to_string().contains("points must be an integer"));
    }

    #[test]
    fn test_two_correct_options_rejected_after_earlier_rows_kept() {
        let db = setup();
        let text = csv(&[
            "Q1?,easy,1,,,,,A,true,B,false,,,,",
            "Q2?,hard,1,,,,,A,true,B,true,,,,",
            "Q3?,easy,1,,,,,A,true,,,,,,",
        ]);
        let err = import(&db, &text).unwrap_err();
        assert!(matches!(err, Error::Import { line: 3, .. }));
        assert!(err.to_string().contains("exactly one correct option"));
        assert_eq!(db.count_questions().unwrap(), 1);
    }

    #[test]
    fn test_unknown_difficulty() {
        let db = setup();
        let err = import(&db, &csv(&["Q?,extreme,1,,,,,A,true,,,,,,"])).unwrap_err();
        assert!(err.to_string().contains("unknown difficulty"));
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short"), "short");
        assert_eq!(
            preview("What is the capital of France?"),
            "What is the capital ..."
        );
    }
}
