//! Session slice: authentication status and the signed-in user.

use serde::{Deserialize, Serialize};
use storekeep_core::{Email, RoleId, SessionStatus};

/// The signed-in user as normalized from an auth response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: Email,
    pub role_id: Option<RoleId>,
}

/// Authentication state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub status: SessionStatus,
    pub user: Option<User>,
    pub last_error: Option<String>,
}

/// Session transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// A login, signup or verification request was issued.
    Started,
    /// The pending request produced a user.
    Authenticated(User),
    /// The pending request failed.
    Failed(String),
    /// The user logged out.
    LoggedOut,
    /// The server rejected the stored token.
    Expired(String),
}

impl SessionState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == SessionStatus::Pending
    }

    /// Apply a transition.
    ///
    /// `Authenticated` and `Failed` only land from `Pending`; out-of-order
    /// completions are ignored.
    #[must_use]
    pub fn reduce(&self, action: &SessionAction) -> Self {
        match (self.status, action) {
            (_, SessionAction::Started) => Self {
                status: SessionStatus::Pending,
                user: None,
                last_error: None,
            },
            (SessionStatus::Pending, SessionAction::Authenticated(user)) => Self {
                status: SessionStatus::Authenticated,
                user: Some(user.clone()),
                last_error: None,
            },
            (SessionStatus::Pending, SessionAction::Failed(message)) => Self {
                status: SessionStatus::Failed,
                user: None,
                last_error: Some(message.clone()),
            },
            (_, SessionAction::LoggedOut) => Self::default(),
            (_, SessionAction::Expired(message)) => Self {
                status: SessionStatus::Anonymous,
                user: None,
                last_error: Some(message.clone()),
            },
            (_, SessionAction::Authenticated(_) | SessionAction::Failed(_)) => self.clone(),
        }
    }

    /// Fix up a session restored from storage.
    ///
    /// An in-flight status cannot survive a restart, and an authenticated
    /// session without a stored token is stale.
    #[must_use]
    pub fn rehydrate(self, has_token: bool) -> Self {
        match self.status {
            SessionStatus::Authenticated if has_token && self.user.is_some() => self,
            _ => Self::default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn jane() -> User {
        User {
            name: "Jane".to_string(),
            email: Email::parse("jane@example.com").unwrap(),
            role_id: Some(RoleId::new(1)),
        }
    }

    #[test]
    fn test_login_success_path() {
        let state = SessionState::default()
            .reduce(&SessionAction::Started)
            .reduce(&SessionAction::Authenticated(jane()));
        assert!(state.is_authenticated());
        assert_eq!(state.user, Some(jane()));
    }

    #[test]
    fn test_failure_then_retry() {
        let failed = SessionState::default()
            .reduce(&SessionAction::Started)
            .reduce(&SessionAction::Failed("bad password".to_string()));
        assert_eq!(failed.status, SessionStatus::Failed);
        assert_eq!(failed.last_error.as_deref(), Some("bad password"));

        let retry = failed.reduce(&SessionAction::Started);
        assert!(retry.is_pending());
        assert!(retry.last_error.is_none());
    }

    #[test]
    fn test_completion_without_pending_is_ignored() {
        let anonymous = SessionState::default();
        assert_eq!(
            anonymous.reduce(&SessionAction::Authenticated(jane())),
            anonymous
        );
        assert_eq!(
            anonymous.reduce(&SessionAction::Failed("late".to_string())),
            anonymous
        );
    }

    #[test]
    fn test_logout_from_any_state() {
        let authed = SessionState::default()
            .reduce(&SessionAction::Started)
            .reduce(&SessionAction::Authenticated(jane()));
        assert_eq!(
            authed.reduce(&SessionAction::LoggedOut),
            SessionState::default()
        );
    }

    #[test]
    fn test_expired_keeps_reason() {
        let expired = SessionState::default()
            .reduce(&SessionAction::Started)
            .reduce(&SessionAction::Authenticated(jane()))
            .reduce(&SessionAction::Expired("token rejected".to_string()));
        assert_eq!(expired.status, SessionStatus::Anonymous);
        assert!(expired.user.is_none());
        assert_eq!(expired.last_error.as_deref(), Some("token rejected"));
    }

    #[test]
    fn test_rehydrate() {
        let authed = SessionState {
            status: SessionStatus::Authenticated,
            user: Some(jane()),
            last_error: None,
        };
        assert!(authed.clone().rehydrate(true).is_authenticated());
        assert_eq!(authed.rehydrate(false), SessionState::default());

        let pending = SessionState {
            status: SessionStatus::Pending,
            ..SessionState::default()
        };
        assert_eq!(pending.rehydrate(true), SessionState::default());
    }
}
