//! Category CSV import.

use super::csv::{CsvRow, CsvTable};
use super::ImportSummary;
use crate::db::Database;
use crate::error::Result;
use crate::types::NewCategory;
use std::collections::HashMap;

/// Header of a category import file.
pub const HEADERS: [&str; 7] = [
    "name_en",
    "slug",
    "name_ne",
    "description_en",
    "description_ne",
    "parent_category_name",
    "is_published",
];

const REQUIRED: [&str; 2] = ["name_en", "slug"];

/// Insert categories in file order.
///
/// Parents are resolved by case-insensitive name against existing categories
/// and rows inserted earlier in the same file, so parents must come first.
pub(crate) fn import(db: &Database, text: &str) -> Result<ImportSummary> {
    let table = CsvTable::parse(text);
    table.require_columns(&REQUIRED)?;

    let mut by_name = db.category_name_index()?;
    let mut summary = ImportSummary::default();

    for row in &table.rows {
        if let Err(e) = import_row(db, row, &mut by_name) {
            tracing::warn!(
                line = row.line,
                inserted = summary.inserted,
                error = %e,
                "Category import stopped; earlier rows were kept"
            );
            return Err(e);
        }
        summary.inserted += 1;
    }

    tracing::info!(inserted = summary.inserted, "Imported categories");
    Ok(summary)
}

fn import_row(db: &Database, row: &CsvRow, by_name: &mut HashMap<String, String>) -> Result<()> {
    let name_en = row.required("name_en")?;

    let parent_category_id = match row.get("parent_category_name") {
        None => None,
        Some(parent) => Some(by_name.get(&parent.to_lowercase()).cloned().ok_or_else(|| {
            row.error(format!(
                "Parent category \"{}\" not found for child \"{}\". \
                 Parents must exist or be listed before their children.",
                parent, name_en
            ))
        })?),
    };

    let category = NewCategory {
        name_en: name_en.to_string(),
        slug: row.required("slug")?.to_string(),
        name_ne: row.get("name_ne").map(str::to_string),
        description_en: row.get("description_en").map(str::to_string),
        description_ne: row.get("description_ne").map(str::to_string),
        parent_category_id,
        is_published: row.bool_or("is_published", true)?,
    };

    let stored = db
        .insert_category(&category)
        .map_err(|e| row.error(format!("Error adding category \"{}\": {}", name_en, e)))?;
    by_name.insert(stored.name_en.to_lowercase(), stored.id);
    Ok(())
}
