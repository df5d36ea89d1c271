//! Session lifecycle: login tiers, guarded verification, logout and expiry.

#![allow(clippy::unwrap_used)]

use chrono::{TimeDelta, Utc};
use secrecy::{ExposeSecret, SecretString};
use storekeep_core::{Email, RoleId, SessionStatus};
use storekeep_integration_tests::{
    FakeBackend, Reply, TOKEN, TestContext, VerifyBody, count, snapshot,
};
use storekeep_storefront::ErrorKind;
use storekeep_storefront::api::{Credentials, SignupForm};
use storekeep_storefront::persistence::{StorageTier, Tier, keys};
use storekeep_storefront::services::{SessionManager, SignupOutcome, VerifyOutcome};
use storekeep_storefront::store::CartAction;

fn seed_token(ctx: &TestContext, tier: Tier) {
    ctx.state
        .persistence()
        .store_token(&SecretString::from(TOKEN), tier);
}

// ============================================================================
// Login and remember-me
// ============================================================================

#[tokio::test]
async fn test_remember_me_login_survives_session_loss() {
    let ctx = TestContext::new();
    ctx.login(true).await.unwrap();

    assert_eq!(ctx.state.persistence().token_tier(), Some(Tier::Durable));
    assert!(ctx.session.read(keys::TOKEN).unwrap().is_none());

    let restarted = ctx.restart_without_session();
    assert!(restarted.snapshot().session.is_authenticated());
}

#[tokio::test]
async fn test_session_login_is_forgotten_with_session_tier() {
    let ctx = TestContext::new();
    ctx.login(false).await.unwrap();
    ctx.state
        .dispatch(CartAction::Add(snapshot(&ctx.backend.products[0])));

    assert_eq!(ctx.state.persistence().token_tier(), Some(Tier::Session));
    assert!(ctx.durable.read(keys::TOKEN).unwrap().is_none());
    assert!(ctx.durable.read(keys::STATE).unwrap().is_none());

    // Same session tier: still logged in with the cart.
    let resumed = ctx.restart();
    assert!(resumed.snapshot().session.is_authenticated());
    assert_eq!(resumed.snapshot().cart.len(), 1);

    let restarted = ctx.restart_without_session();
    assert_eq!(restarted.snapshot().session.status, SessionStatus::Anonymous);
    assert!(restarted.snapshot().cart.is_empty());
}

#[tokio::test]
async fn test_switching_tiers_leaves_token_in_one_place() {
    let ctx = TestContext::new();
    ctx.login(true).await.unwrap();
    ctx.login(false).await.unwrap();

    assert!(ctx.durable.read(keys::TOKEN).unwrap().is_none());
    assert!(ctx.durable.read(keys::STATE).unwrap().is_none());
    assert!(ctx.session.read(keys::TOKEN).unwrap().is_some());
}

#[tokio::test]
async fn test_wrong_password_fails_without_persisting() {
    let ctx = TestContext::new();
    let credentials = Credentials {
        email: Email::parse("jane@example.com").unwrap(),
        password: SecretString::from("nope"),
    };

    let err = ctx
        .session_manager()
        .login(credentials, true)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);

    let state = ctx.state.snapshot();
    assert_eq!(state.session.status, SessionStatus::Failed);
    assert_eq!(
        state.session.last_error.as_deref(),
        Some("Invalid email or password")
    );
    assert!(ctx.state.persistence().token().is_none());
}

#[tokio::test]
async fn test_unavailable_login_is_retryable() {
    let ctx = TestContext::new();
    *ctx.backend.login_reply.lock() = Reply::Unavailable;

    let err = ctx.login(false).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(ctx.state.snapshot().session.status, SessionStatus::Failed);
}

// ============================================================================
// Signup
// ============================================================================

fn signup_form() -> SignupForm {
    SignupForm {
        name: "Jane Doe".to_string(),
        email: Email::parse("jane@example.com").unwrap(),
        password: SecretString::from("Secret-123"),
        role_id: RoleId::new(2),
    }
}

#[tokio::test]
async fn test_signup_with_token_logs_in() {
    let ctx = TestContext::new();
    let outcome = ctx
        .session_manager()
        .signup(signup_form(), false)
        .await
        .unwrap();

    assert!(matches!(outcome, SignupOutcome::Authenticated(ref user) if user.name == "Jane Doe"));
    assert!(ctx.state.snapshot().session.is_authenticated());
    assert_eq!(ctx.state.persistence().token_tier(), Some(Tier::Session));
}

#[tokio::test]
async fn test_signup_without_token_requires_activation() {
    let ctx = TestContext::new();
    *ctx.backend.signup_token.lock() = false;

    let outcome = ctx
        .session_manager()
        .signup(signup_form(), false)
        .await
        .unwrap();

    assert_eq!(outcome, SignupOutcome::ActivationRequired);
    assert_eq!(ctx.state.snapshot().session.status, SessionStatus::Anonymous);
    assert!(ctx.state.persistence().token().is_none());
}

// ============================================================================
// Verification guard
// ============================================================================

#[tokio::test]
async fn test_concurrent_verify_sends_one_request() {
    let ctx = TestContext::new();
    seed_token(&ctx, Tier::Durable);

    let first = SessionManager::new(&ctx.state, &ctx.backend);
    let second = SessionManager::new(&ctx.state, &ctx.backend);
    let (a, b) = tokio::join!(first.verify_session(), second.verify_session());

    let mut outcomes = [a.unwrap(), b.unwrap()];
    outcomes.sort_by_key(|o| matches!(o, VerifyOutcome::InFlight));
    assert!(matches!(outcomes[0], VerifyOutcome::Verified(_)));
    assert_eq!(outcomes[1], VerifyOutcome::InFlight);

    assert_eq!(count(&ctx.backend.calls.verify), 1);
    assert!(ctx.state.snapshot().session.is_authenticated());
    assert!(ctx.state.persistence().verify_marker().is_none());
}

#[tokio::test]
async fn test_verify_guard_spans_clients_sharing_session_tier() {
    let ctx = TestContext::new();
    seed_token(&ctx, Tier::Session);
    let other = ctx.restart();

    let here = SessionManager::new(&ctx.state, &ctx.backend);
    let there = SessionManager::new(&other, &ctx.backend);
    let (a, b) = tokio::join!(here.verify_session(), there.verify_session());

    assert!(matches!(a.unwrap(), VerifyOutcome::Verified(_)));
    assert_eq!(b.unwrap(), VerifyOutcome::InFlight);
    assert_eq!(count(&ctx.backend.calls.verify), 1);
}

#[tokio::test]
async fn test_verify_skips_when_authenticated_or_tokenless() {
    let ctx = TestContext::new();
    assert_eq!(
        ctx.session_manager().verify_session().await.unwrap(),
        VerifyOutcome::NoToken
    );

    ctx.login(false).await.unwrap();
    assert_eq!(
        ctx.session_manager().verify_session().await.unwrap(),
        VerifyOutcome::AlreadyAuthenticated
    );
    assert_eq!(count(&ctx.backend.calls.verify), 0);
}

#[tokio::test]
async fn test_abandoned_marker_does_not_block_forever() {
    let ctx = TestContext::new();
    seed_token(&ctx, Tier::Session);
    ctx.state
        .persistence()
        .set_verify_marker(Utc::now() - TimeDelta::minutes(5));

    let outcome = ctx.session_manager().verify_session().await.unwrap();
    assert!(matches!(outcome, VerifyOutcome::Verified(_)));
}

#[tokio::test]
async fn test_fresh_marker_blocks_verification() {
    let ctx = TestContext::new();
    seed_token(&ctx, Tier::Session);
    ctx.state.persistence().set_verify_marker(Utc::now());

    let outcome = ctx.session_manager().verify_session().await.unwrap();
    assert_eq!(outcome, VerifyOutcome::InFlight);
    assert_eq!(count(&ctx.backend.calls.verify), 0);
}

#[tokio::test]
async fn test_rejected_token_is_cleared() {
    let ctx = TestContext::new();
    seed_token(&ctx, Tier::Durable);
    *ctx.backend.verify_reply.lock() = Reply::Unauthorized;

    let err = ctx.session_manager().verify_session().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);

    assert_eq!(ctx.state.snapshot().session.status, SessionStatus::Failed);
    assert!(ctx.state.persistence().token().is_none());
    assert!(ctx.state.persistence().verify_marker().is_none());
}

fn assert_verification_failed(ctx: &TestContext) {
    assert_eq!(ctx.state.snapshot().session.status, SessionStatus::Failed);
    assert!(ctx.state.persistence().token().is_none());
    assert!(ctx.state.persistence().verify_marker().is_none());
}

#[tokio::test]
async fn test_empty_verify_response_is_a_failure() {
    let ctx = TestContext::new();
    seed_token(&ctx, Tier::Durable);
    *ctx.backend.verify_body.lock() = VerifyBody::Empty;

    let err = ctx.session_manager().verify_session().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);
    assert_verification_failed(&ctx);
}

#[tokio::test]
async fn test_verify_response_without_user_is_a_failure() {
    let ctx = TestContext::new();
    seed_token(&ctx, Tier::Session);
    *ctx.backend.verify_body.lock() = VerifyBody::NoUser;

    let err = ctx.session_manager().verify_session().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);
    assert_verification_failed(&ctx);
}

#[tokio::test]
async fn test_unreachable_server_fails_verification() {
    let ctx = TestContext::new();
    seed_token(&ctx, Tier::Durable);
    *ctx.backend.verify_reply.lock() = Reply::Unavailable;

    let err = ctx.session_manager().verify_session().await.unwrap_err();
    assert!(err.is_retryable());
    assert_verification_failed(&ctx);
}

#[tokio::test]
async fn test_refreshed_token_replaces_stored_one_in_place() {
    let backend = FakeBackend::default();
    *backend.refreshed_token.lock() = Some("rotated".to_string());
    let ctx = TestContext::with_backend(backend);
    seed_token(&ctx, Tier::Durable);

    ctx.session_manager().verify_session().await.unwrap();

    let (token, tier) = ctx.state.persistence().token().unwrap();
    assert_eq!(token.expose_secret(), "rotated");
    assert_eq!(tier, Tier::Durable);
}

// ============================================================================
// Logout and expiry
// ============================================================================

#[tokio::test]
async fn test_logout_clears_token_and_cart() {
    let ctx = TestContext::new();
    ctx.login(true).await.unwrap();
    ctx.state
        .dispatch(CartAction::Add(snapshot(&ctx.backend.products[0])));

    ctx.session_manager().logout();

    let state = ctx.state.snapshot();
    assert_eq!(state.session.status, SessionStatus::Anonymous);
    assert!(state.cart.is_empty());
    assert!(ctx.state.persistence().token().is_none());
    assert!(ctx.restart().snapshot().cart.is_empty());
}

#[tokio::test]
async fn test_unauthorized_account_call_expires_session() {
    let ctx = TestContext::new();
    ctx.login(true).await.unwrap();
    *ctx.backend.account_reply.lock() = Reply::Unauthorized;

    let err = ctx.account().load_addresses().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);

    let state = ctx.state.snapshot();
    assert_eq!(state.session.status, SessionStatus::Anonymous);
    assert!(state.session.last_error.is_some());
    assert!(ctx.state.persistence().token().is_none());
}
