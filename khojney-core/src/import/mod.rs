//! CSV bulk import of categories and questions
//!
//! Rows are inserted one at a time in file order. The first failing row
//! stops the import with an [`Error::Import`](crate::Error::Import) naming
//! its line; rows before it stay in the store.

pub mod categories;
pub mod csv;
pub mod questions;
pub mod sample;

use crate::auth::SessionContext;
use crate::db::Database;
use crate::error::Result;
use serde::Serialize;

/// Outcome of a successful import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub inserted: usize,
}

/// Import a category CSV. Admin only.
pub fn import_categories(
    db: &Database,
    session: &SessionContext,
    text: &str,
) -> Result<ImportSummary> {
    let admin = session.require_admin()?;
    tracing::info!(admin, "Importing categories");
    categories::import(db, text)
}

/// Import a question CSV. Admin only.
pub fn import_questions(
    db: &Database,
    session: &SessionContext,
    text: &str,
) -> Result<ImportSummary> {
    let admin = session.require_admin()?;
    tracing::info!(admin, "Importing questions");
    questions::import(db, text)
}
