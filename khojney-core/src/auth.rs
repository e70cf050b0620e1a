//! Session and role context.
//!
//! The hosted auth provider supplies the session; the role always comes from
//! `profiles.role`, never from the session token. The cached role lives as
//! long as the session and is dropped on sign-out or the next refresh.

use crate::db::Database;
use crate::error::{Error, Result};
use crate::types::Role;
use chrono::{DateTime, Utc};

/// A signed-in session as handed over by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user_id: String,
    /// `None` for sessions without a known expiry
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            expires_at: None,
        }
    }

    pub fn expiring_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |exp| now < exp)
    }
}

/// Current session plus the role read for it.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    session: Option<AuthSession>,
    role: Option<Role>,
}

impl SessionContext {
    /// A context with nobody signed in.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Sign in and load the role in one step.
    pub fn signed_in(db: &Database, session: AuthSession) -> Self {
        let mut ctx = Self::default();
        ctx.refresh(db, Some(session));
        ctx
    }

    /// Apply an auth state change (sign-in, token refresh or sign-out).
    ///
    /// Role lookup failures are logged and leave the role unset rather
    /// than failing the caller.
    pub fn refresh(&mut self, db: &Database, session: Option<AuthSession>) {
        self.role = None;
        self.session = session;

        let Some(session) = &self.session else {
            tracing::debug!("Session cleared");
            return;
        };

        match db.get_role(&session.user_id) {
            Ok(Some(role)) => {
                tracing::debug!(user_id = %session.user_id, role = role.as_str(), "Role loaded");
                self.role = Some(role);
            }
            Ok(None) => {
                tracing::warn!(user_id = %session.user_id, "User profile not found");
            }
            Err(e) => {
                tracing::error!(user_id = %session.user_id, error = %e, "Error fetching user role");
            }
        }
    }

    /// Forget the session and its role.
    pub fn sign_out(&mut self) {
        self.session = None;
        self.role = None;
    }

    fn active_session(&self) -> Option<&AuthSession> {
        self.session
            .as_ref()
            .filter(|s| s.is_active_at(Utc::now()))
    }

    /// Signed-in user id; `None` when signed out or expired.
    pub fn user_id(&self) -> Option<&str> {
        self.active_session().map(|s| s.user_id.as_str())
    }

    /// Role of the signed-in user, if known.
    pub fn role(&self) -> Option<Role> {
        self.active_session().and(self.role)
    }

    pub fn is_signed_in(&self) -> bool {
        self.active_session().is_some()
    }

    /// The signed-in user id, or [`Error::Unauthorized`].
    pub fn require_user(&self) -> Result<&str> {
        self.user_id()
            .ok_or_else(|| Error::Unauthorized("sign-in required".to_string()))
    }

    /// The signed-in admin's id, or [`Error::Unauthorized`].
    pub fn require_admin(&self) -> Result<&str> {
        let user_id = self.require_user()?;
        if self.role() == Some(Role::Admin) {
            Ok(user_id)
        } else {
            Err(Error::Unauthorized("admin role required".to_string()))
        }
    }

    /// Premium users and admins may start quizzes; the free tier may not.
    pub fn can_start_quiz(&self) -> bool {
        matches!(self.role(), Some(role) if !role.is_free_tier())
    }
}
