//! Leaderboard reads.
//!
//! Rows are precomputed by an external ranking job; this module only lists
//! them and looks up the signed-in user's own position.

use crate::auth::SessionContext;
use crate::db::Database;
use crate::error::Result;
use crate::types::{LeaderboardEntry, LeaderboardPeriod};
use serde::Serialize;

/// One leaderboard view as shown to a user.
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardView {
    pub period: LeaderboardPeriod,
    /// `None` for the global board
    pub category_id: Option<String>,
    /// Ordered by rank
    pub entries: Vec<LeaderboardEntry>,
    /// The viewer's own row, when signed in and ranked
    pub user_rank: Option<LeaderboardEntry>,
}

/// Load a leaderboard view.
///
/// Anonymous sessions get the listing without a personal rank.
pub fn load_leaderboard(
    db: &Database,
    session: &SessionContext,
    period: LeaderboardPeriod,
    category_id: Option<&str>,
    limit: usize,
) -> Result<LeaderboardView> {
    let entries = db.list_leaderboard(period, category_id, limit)?;

    let user_rank = match session.user_id() {
        Some(user_id) => db.get_user_leaderboard_entry(user_id, period, category_id)?,
        None => None,
    };

    tracing::debug!(
        period = period.as_str(),
        category_id,
        entries = entries.len(),
        ranked = user_rank.is_some(),
        "Loaded leaderboard"
    );

    Ok(LeaderboardView {
        period,
        category_id: category_id.map(str::to_string),
        entries,
        user_rank,
    })
}
