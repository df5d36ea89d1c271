//! Unified client error taxonomy with Sentry integration.
//!
//! Every network collaborator returns a [`ClientError`]. The variant decides
//! how callers react:
//!
//! - `Validation`/`InvalidOrder`/`SubmissionInFlight` - rejected locally
//!   before any request
//! - `Auth` - the stored token is no longer accepted; forces logout
//! - `ServerUnavailable` - transient, safe to retry, state unchanged
//! - `BadRequest` - the server rejected the input; message shown verbatim
//! - `Unknown` - anything else

use reqwest::StatusCode;
use thiserror::Error;

use crate::checkout::OrderValidationError;

/// Coarse error class used when mapping errors to notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Auth,
    ServerUnavailable,
    BadRequest,
    Unknown,
}

/// Client-level error type for the storefront core.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Input rejected before any network call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Order failed checkout validation.
    #[error("Invalid order: {0}")]
    InvalidOrder(#[from] OrderValidationError),

    /// An order submission is already outstanding.
    #[error("An order is already being submitted")]
    SubmissionInFlight,

    /// Missing or rejected credentials (HTTP 401).
    #[error("Unauthorized: {0}")]
    Auth(String),

    /// Server error, timeout or unreachable host.
    #[error("Server unavailable: {0}")]
    ServerUnavailable(String),

    /// Server-side validation failure (HTTP 400).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Anything that does not fit the other classes.
    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl ClientError {
    /// The taxonomy class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::InvalidOrder(_) | Self::SubmissionInFlight => {
                ErrorKind::Validation
            }
            Self::Auth(_) => ErrorKind::Auth,
            Self::ServerUnavailable(_) => ErrorKind::ServerUnavailable,
            Self::BadRequest(_) => ErrorKind::BadRequest,
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Whether repeating the same call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ServerUnavailable(_))
    }

    /// Message suitable for an inline error or toast.
    ///
    /// Server-reported validation messages pass through untouched; internal
    /// details of unknown errors are not exposed.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) | Self::BadRequest(msg) => msg.clone(),
            Self::InvalidOrder(err) => err.to_string(),
            Self::SubmissionInFlight => "Your order is already being placed".to_string(),
            Self::Auth(_) => "Your session has expired, please log in again".to_string(),
            Self::ServerUnavailable(_) => {
                "The store is temporarily unavailable, please try again".to_string()
            }
            Self::Unknown(_) => "Something went wrong".to_string(),
        }
    }

    /// Map a non-success HTTP status and its body to an error.
    ///
    /// A JSON body with a `message` field contributes that message, otherwise
    /// the raw body (truncated) is used.
    #[must_use]
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = extract_message(body).unwrap_or_else(|| {
            if body.trim().is_empty() {
                status.to_string()
            } else {
                body.chars().take(200).collect()
            }
        });

        match status {
            StatusCode::UNAUTHORIZED => Self::Auth(message),
            StatusCode::BAD_REQUEST => Self::BadRequest(message),
            StatusCode::TOO_MANY_REQUESTS | StatusCode::REQUEST_TIMEOUT => {
                Self::ServerUnavailable(message)
            }
            s if s.is_server_error() => Self::ServerUnavailable(message),
            _ => Self::Unknown(format!("HTTP {status}: {message}")),
        }
    }

    /// Capture server-side and unexpected errors to Sentry.
    ///
    /// Validation, auth and bad-request errors are user-facing outcomes and
    /// are only logged.
    pub fn report(&self) {
        if matches!(self, Self::ServerUnavailable(_) | Self::Unknown(_)) {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Storefront request failed"
            );
        } else {
            tracing::debug!(error = %self, kind = ?self.kind(), "Storefront request rejected");
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            return Self::ServerUnavailable(err.to_string());
        }
        if let Some(status) = err.status() {
            return Self::from_status(status, "");
        }
        if err.is_decode() {
            return Self::Unknown(format!("Malformed response: {err}"));
        }
        Self::Unknown(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Unknown(format!("Malformed response: {err}"))
    }
}

impl From<storekeep_core::EmailError> for ClientError {
    fn from(err: storekeep_core::EmailError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<storekeep_core::CardNumberError> for ClientError {
    fn from(err: storekeep_core::CardNumberError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<storekeep_core::CardExpiryError> for ClientError {
    fn from(err: storekeep_core::CardExpiryError) -> Self {
        Self::Validation(err.to_string())
    }
}

fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Set the Sentry user context after a successful login or verification.
pub fn set_sentry_user(email: &str, name: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            email: Some(email.to_string()),
            username: Some(name.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context on logout.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ClientError::from_status(StatusCode::UNAUTHORIZED, "").kind(),
            ErrorKind::Auth
        );
        assert_eq!(
            ClientError::from_status(StatusCode::BAD_REQUEST, "").kind(),
            ErrorKind::BadRequest
        );
        assert_eq!(
            ClientError::from_status(StatusCode::BAD_GATEWAY, "").kind(),
            ErrorKind::ServerUnavailable
        );
        assert_eq!(
            ClientError::from_status(StatusCode::SERVICE_UNAVAILABLE, "").kind(),
            ErrorKind::ServerUnavailable
        );
        assert_eq!(
            ClientError::from_status(StatusCode::NOT_FOUND, "").kind(),
            ErrorKind::Unknown
        );
    }

    #[test]
    fn test_bad_request_message_is_verbatim() {
        let err = ClientError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"message":"Address title is required"}"#,
        );
        assert_eq!(err.user_message(), "Address title is required");
    }

    #[test]
    fn test_plain_text_body_is_used() {
        let err = ClientError::from_status(StatusCode::BAD_REQUEST, "email already taken");
        assert_eq!(err.to_string(), "Bad request: email already taken");
    }

    #[test]
    fn test_unknown_hides_details_from_user() {
        let err = ClientError::Unknown("decoder exploded at byte 17".to_string());
        assert_eq!(err.user_message(), "Something went wrong");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_server_unavailable_is_retryable() {
        assert!(ClientError::ServerUnavailable("timeout".to_string()).is_retryable());
    }
}
