//! Session manager.
//!
//! Owns the authentication flows. Verification is guarded by a marker in the
//! session storage tier. The marker check and set happen under the store lock,
//! so concurrent callers in one process issue at most one outbound
//! verification. A second process sharing the session directory sees the
//! marker too, but the read and write are not atomic across processes, so that
//! case is best effort. The marker is removed by a drop guard whether the
//! request succeeds, fails or is cancelled.

use std::ops::ControlFlow;

use chrono::Utc;
use secrecy::SecretString;
use tracing::{info, instrument, warn};

use crate::api::{AuthBackend, AuthPayload, Credentials, SignupForm};
use crate::error::{ClientError, Result, clear_sentry_user, set_sentry_user};
use crate::persistence::{PersistenceAdapter, Tier};
use crate::state::ClientState;
use crate::store::{SessionAction, User};

/// Result of [`SessionManager::verify_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Another verification is in flight; nothing was sent.
    InFlight,
    /// The session is already authenticated; nothing was sent.
    AlreadyAuthenticated,
    /// No token is stored; the session stays anonymous.
    NoToken,
    /// The server accepted the token.
    Verified(User),
}

/// Result of [`SessionManager::signup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupOutcome {
    /// The server returned a token; the user is logged in.
    Authenticated(User),
    /// The account was created but must be activated before logging in.
    ActivationRequired,
}

/// Clears the verification marker when dropped.
struct VerifyGuard<'a> {
    persistence: &'a PersistenceAdapter,
}

impl Drop for VerifyGuard<'_> {
    fn drop(&mut self) {
        self.persistence.clear_verify_marker();
    }
}

/// Authentication flows over an [`AuthBackend`].
#[derive(Debug)]
pub struct SessionManager<'a, B> {
    state: &'a ClientState,
    backend: &'a B,
}

impl<'a, B: AuthBackend> SessionManager<'a, B> {
    #[must_use]
    pub const fn new(state: &'a ClientState, backend: &'a B) -> Self {
        Self { state, backend }
    }

    /// Log in and store the token in the tier chosen by `remember_me`.
    ///
    /// # Errors
    ///
    /// Returns the backend error, or `ClientError::Unknown` if the response
    /// lacks a token or user. The session ends up `failed` and nothing is
    /// persisted.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: Credentials, remember_me: bool) -> Result<User> {
        self.state.dispatch(SessionAction::Started);

        let outcome = self
            .backend
            .login(&credentials)
            .await
            .and_then(Self::into_session);

        match outcome {
            Ok((user, token)) => {
                self.establish(&user, &token, Tier::for_remember_me(remember_me));
                info!(remember_me, "User logged in");
                Ok(user)
            }
            Err(e) => {
                e.report();
                // A rejected login carries the server's reason, not an expired session.
                let message = match &e {
                    ClientError::Auth(reason) => reason.clone(),
                    other => other.user_message(),
                };
                self.state.dispatch(SessionAction::Failed(message));
                Err(e)
            }
        }
    }

    /// Create an account. Logs in directly when the server returns a token.
    ///
    /// The session is left untouched unless a token is returned.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn signup(&self, form: SignupForm, remember_me: bool) -> Result<SignupOutcome> {
        let payload = self.backend.signup(&form).await.inspect_err(ClientError::report)?;

        if payload.token.is_none() {
            info!("Account created, activation required");
            return Ok(SignupOutcome::ActivationRequired);
        }

        let (user, token) = Self::into_session(payload)?;
        self.state.dispatch(SessionAction::Started);
        self.establish(&user, &token, Tier::for_remember_me(remember_me));
        info!(remember_me, "User signed up and logged in");
        Ok(SignupOutcome::Authenticated(user))
    }

    /// Confirm the stored token with the server.
    ///
    /// No request is sent when the session is already authenticated, when no
    /// token is stored, or when another verification is in flight. A refreshed
    /// token in the response replaces the stored one in the same tier.
    ///
    /// # Errors
    ///
    /// Any failure, including a response without a usable user, marks the
    /// session `failed`, clears the stored token and returns the error.
    #[instrument(skip(self))]
    pub async fn verify_session(&self) -> Result<VerifyOutcome> {
        let now = Utc::now();
        let claimed = self.state.with_store(|store| {
            if store.state().session.is_authenticated() {
                return ControlFlow::Break(VerifyOutcome::AlreadyAuthenticated);
            }
            let persistence = store.persistence();
            if persistence.verify_in_flight(now) {
                return ControlFlow::Break(VerifyOutcome::InFlight);
            }
            let Some((token, tier)) = persistence.token() else {
                return ControlFlow::Break(VerifyOutcome::NoToken);
            };
            persistence.set_verify_marker(now);
            store.dispatch(SessionAction::Started);
            ControlFlow::Continue((token, tier))
        });

        let (token, tier) = match claimed {
            ControlFlow::Continue(claimed) => claimed,
            ControlFlow::Break(outcome) => return Ok(outcome),
        };
        let _guard = VerifyGuard {
            persistence: self.state.persistence(),
        };

        let outcome = match self.backend.verify(&token).await {
            Ok(Some(payload)) => match payload.user() {
                Some(user) => Ok((user, payload.token)),
                None => Err(ClientError::Auth(
                    "Verification response did not include a user".to_string(),
                )),
            },
            Ok(None) => Err(ClientError::Auth(
                "Verification response was empty".to_string(),
            )),
            Err(e) => Err(e),
        };

        match outcome {
            Ok((user, refreshed)) => {
                let token = refreshed.unwrap_or(token);
                self.establish(&user, &token, tier);
                info!("Session verified");
                Ok(VerifyOutcome::Verified(user))
            }
            Err(e) => {
                warn!(error = %e, "Session verification failed");
                e.report();
                self.state.persistence().clear_token();
                self.state
                    .dispatch(SessionAction::Failed(e.user_message()));
                Err(e)
            }
        }
    }

    /// Log out: clear the token and the cart, return to `anonymous`.
    pub fn logout(&self) {
        self.state.persistence().clear_token();
        self.state.dispatch(SessionAction::LoggedOut);
        clear_sentry_user();
        info!("User logged out");
    }

    fn into_session(payload: AuthPayload) -> Result<(User, SecretString)> {
        let user = payload.user().ok_or_else(|| {
            ClientError::Unknown("Auth response did not include a user".to_string())
        })?;
        let token = payload.token.ok_or_else(|| {
            ClientError::Unknown("Auth response did not include a token".to_string())
        })?;
        Ok((user, token))
    }

    /// Store the token first so the snapshot written by the dispatch lands in
    /// the same tier.
    fn establish(&self, user: &User, token: &SecretString, tier: Tier) {
        self.state.persistence().store_token(token, tier);
        self.state
            .dispatch(SessionAction::Authenticated(user.clone()));
        set_sentry_user(user.email.as_str(), &user.name);
    }
}
