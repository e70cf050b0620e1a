//! Admin-only content and user management.
//!
//! Every operation checks the session's role before touching the store.

use crate::auth::SessionContext;
use crate::db::Database;
use crate::error::Result;
use crate::types::{Category, NewCategory, Profile, QuestionDraft, Role};
use serde::Serialize;

/// Profile counts per role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoleBreakdown {
    pub total: usize,
    pub admins: usize,
    pub regular_users: usize,
    pub premium_users: usize,
}

impl RoleBreakdown {
    pub fn of(profiles: &[Profile]) -> Self {
        let count = |role: Role| profiles.iter().filter(|p| p.role == role).count();
        Self {
            total: profiles.len(),
            admins: count(Role::Admin),
            regular_users: count(Role::User),
            premium_users: count(Role::PremiumUser),
        }
    }
}

/// The users page: matching profiles plus their role breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct UserOverview {
    pub users: Vec<Profile>,
    pub breakdown: RoleBreakdown,
}

/// List profiles, newest first, optionally narrowed by a case-insensitive
/// search over name and id.
pub fn user_overview(
    db: &Database,
    session: &SessionContext,
    search: Option<&str>,
) -> Result<UserOverview> {
    session.require_admin()?;

    let needle = search.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());
    let users: Vec<Profile> = db
        .list_profiles()?
        .into_iter()
        .filter(|p| match &needle {
            None => true,
            Some(needle) => {
                p.id.to_lowercase().contains(needle)
                    || p
                        .full_name
                        .as_deref()
                        .map_or(false, |n| n.to_lowercase().contains(needle))
            }
        })
        .collect();

    let breakdown = RoleBreakdown::of(&users);
    Ok(UserOverview { users, breakdown })
}

/// Change a user's role.
pub fn set_user_role(
    db: &Database,
    session: &SessionContext,
    user_id: &str,
    role: Role,
) -> Result<()> {
    let admin = session.require_admin()?;
    db.set_role(user_id, role)?;
    tracing::info!(admin, user_id, role = role.as_str(), "Role changed");
    Ok(())
}

/// Rename a user.
pub fn rename_user(
    db: &Database,
    session: &SessionContext,
    user_id: &str,
    full_name: &str,
) -> Result<()> {
    session.require_admin()?;
    db.update_profile_name(user_id, full_name)
}

/// Delete a user together with their attempts and answers.
pub fn delete_user(db: &Database, session: &SessionContext, user_id: &str) -> Result<()> {
    let admin = session.require_admin()?;
    db.delete_profile(user_id)?;
    tracing::warn!(admin, user_id, "User deleted");
    Ok(())
}

/// Create a category from the admin form.
pub fn add_category(
    db: &Database,
    session: &SessionContext,
    category: &NewCategory,
) -> Result<Category> {
    session.require_admin()?;
    db.insert_category(category)
}

/// Validate and store a question from the admin form.
pub fn add_question(db: &Database, session: &SessionContext, draft: &QuestionDraft) -> Result<String> {
    session.require_admin()?;
    draft.validate()?;
    db.insert_question(draft)
}
