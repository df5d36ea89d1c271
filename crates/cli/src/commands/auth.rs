//! Session commands: login, signup, logout, verify, whoami.

use clap::Args;
use secrecy::SecretString;
use storekeep_core::{Email, RoleId};
use storekeep_storefront::api::{Credentials, SignupForm};
use storekeep_storefront::services::{SessionManager, SignupOutcome, VerifyOutcome};

use super::{CliError, Context};

/// Customer role used when none is given.
const DEFAULT_ROLE_ID: i64 = 2;

#[derive(Args)]
pub struct LoginArgs {
    /// Account email address
    #[arg(short, long)]
    email: String,

    /// Account password
    #[arg(long, env = "STOREKEEP_PASSWORD", hide_env_values = true)]
    password: String,

    /// Keep the session after the session directory is cleared
    #[arg(long)]
    remember_me: bool,
}

#[derive(Args)]
pub struct SignupArgs {
    /// Display name
    #[arg(short, long)]
    name: String,

    /// Account email address
    #[arg(short, long)]
    email: String,

    /// Account password
    #[arg(long, env = "STOREKEEP_PASSWORD", hide_env_values = true)]
    password: String,

    /// Role id (see the server's `/roles`)
    #[arg(short, long, default_value_t = DEFAULT_ROLE_ID)]
    role: i64,

    /// Keep the session after the session directory is cleared
    #[arg(long)]
    remember_me: bool,
}

pub async fn login(ctx: &Context, args: LoginArgs) -> Result<(), CliError> {
    let credentials = Credentials {
        email: Email::parse(&args.email).map_err(storekeep_storefront::ClientError::from)?,
        password: SecretString::from(args.password),
    };

    let user = SessionManager::new(&ctx.state, &ctx.api)
        .login(credentials, args.remember_me)
        .await?;
    println!("Logged in as {} <{}>", user.name, user.email);
    Ok(())
}

pub async fn signup(ctx: &Context, args: SignupArgs) -> Result<(), CliError> {
    if args.name.trim().len() < 3 {
        return Err(CliError::Usage(
            "Name must be at least 3 characters".to_string(),
        ));
    }
    let form = SignupForm {
        name: args.name.trim().to_string(),
        email: Email::parse(&args.email).map_err(storekeep_storefront::ClientError::from)?,
        password: SecretString::from(args.password),
        role_id: RoleId::new(args.role),
    };

    match SessionManager::new(&ctx.state, &ctx.api)
        .signup(form, args.remember_me)
        .await?
    {
        SignupOutcome::Authenticated(user) => {
            println!("Account created, logged in as {}", user.name);
        }
        SignupOutcome::ActivationRequired => {
            println!("Account created. Check your email to activate it before logging in.");
        }
    }
    Ok(())
}

pub fn logout(ctx: &Context) {
    SessionManager::new(&ctx.state, &ctx.api).logout();
    println!("Logged out");
}

pub async fn verify(ctx: &Context) -> Result<(), CliError> {
    match SessionManager::new(&ctx.state, &ctx.api)
        .verify_session()
        .await?
    {
        VerifyOutcome::Verified(user) => println!("Session valid for {}", user.email),
        VerifyOutcome::AlreadyAuthenticated => println!("Already authenticated"),
        VerifyOutcome::NoToken => println!("Not logged in"),
        VerifyOutcome::InFlight => println!("Another verification is in progress"),
    }
    Ok(())
}

pub fn whoami(ctx: &Context) {
    let state = ctx.state.snapshot();
    let session = &state.session;
    match &session.user {
        Some(user) => println!("{} <{}> ({})", user.name, user.email, session.status),
        None => println!("{}", session.status),
    }
    if let Some(tier) = ctx.state.persistence().token_tier() {
        println!("Token stored in {tier} storage");
    }
    if let Some(error) = &session.last_error {
        println!("Last error: {error}");
    }
}
