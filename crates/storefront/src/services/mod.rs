//! Services that combine the store with the remote API.
//!
//! # Services
//!
//! - [`SessionManager`] - login, signup, guarded verification, logout
//! - [`CheckoutService`] - totals, address/card selection, order submission
//! - [`CatalogService`] - product listing, categories and roles
//! - [`AccountService`] - address book, card wallet, order history
//!
//! Each service borrows the shared [`ClientState`] and a backend. Any backend
//! call that fails with [`ErrorKind::Auth`] purges the stored token and
//! expires the session.

mod account;
mod catalog;
mod checkout;
mod session;

use secrecy::SecretString;
use tracing::warn;

pub use account::AccountService;
pub use catalog::{CatalogService, top_categories};
pub use checkout::CheckoutService;
pub use session::{SessionManager, SignupOutcome, VerifyOutcome};

use crate::error::{ClientError, ErrorKind, Result, clear_sentry_user};
use crate::state::ClientState;
use crate::store::SessionAction;

/// The stored bearer token, or an `Auth` error if nobody is logged in.
pub(crate) fn require_token(state: &ClientState) -> Result<SecretString> {
    state
        .persistence()
        .token()
        .map(|(token, _)| token)
        .ok_or_else(|| ClientError::Auth("You need to log in first".to_string()))
}

/// Report a failed backend call and apply the global 401 rule.
pub(crate) fn settle<T>(state: &ClientState, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        e.report();
        if e.kind() == ErrorKind::Auth {
            expire_session(state, e);
        }
    }
    result
}

fn expire_session(state: &ClientState, error: &ClientError) {
    warn!(error = %error, "Server rejected the session token, logging out");
    state.persistence().clear_token();
    state.dispatch(SessionAction::Expired(error.user_message()));
    clear_sentry_user();
}
