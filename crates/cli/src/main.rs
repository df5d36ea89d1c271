//! Storekeep CLI - drive the storefront client from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Log in and keep the session across restarts
//! storekeep login -e jane@example.com --remember-me
//!
//! # Browse and fill the cart
//! storekeep products --category 2 --sort price:asc
//! storekeep cart add 17 --quantity 2
//! storekeep cart list
//!
//! # Place an order for the selected lines
//! storekeep checkout submit --address 4 --card 9 --cvv 123
//! ```
//!
//! # Environment Variables
//!
//! See [`storekeep_storefront::config`]. `RUST_LOG` overrides the default
//! log filter.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout)]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use storekeep_storefront::ClientConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{Context, account, auth, cart, catalog, checkout};

#[derive(Parser)]
#[command(name = "storekeep")]
#[command(author, version, about = "Storekeep storefront client")]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with email and password
    Login(auth::LoginArgs),
    /// Create an account
    Signup(auth::SignupArgs),
    /// Log out and clear the cart
    Logout,
    /// Confirm the stored token with the server
    Verify,
    /// Show the current session
    Whoami,
    /// List products
    Products(catalog::ProductsArgs),
    /// List the best-rated categories
    Categories {
        /// How many categories to show
        #[arg(short, long, default_value_t = 10)]
        top: usize,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: cart::CartCommand,
    },
    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        action: cart::WishlistCommand,
    },
    /// Manage saved addresses
    Address {
        #[command(subcommand)]
        action: account::AddressCommand,
    },
    /// Manage saved cards
    Card {
        #[command(subcommand)]
        action: account::CardCommand,
    },
    /// Review totals and place orders
    Checkout {
        #[command(subcommand)]
        action: checkout::CheckoutCommand,
    },
    /// Show order history
    Orders,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "storekeep=info,storekeep_storefront=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = ClientConfig::from_env().expect("Failed to load configuration");
    let _sentry_guard = init_sentry(&config);
    init_tracing(cli.json_logs);

    let ctx = Context::open(config).expect("Failed to open client state");

    if let Err(e) = run(cli.command, &ctx).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, ctx: &Context) -> Result<(), commands::CliError> {
    match command {
        Commands::Login(args) => auth::login(ctx, args).await?,
        Commands::Signup(args) => auth::signup(ctx, args).await?,
        Commands::Logout => auth::logout(ctx),
        Commands::Verify => auth::verify(ctx).await?,
        Commands::Whoami => auth::whoami(ctx),
        Commands::Products(args) => catalog::products(ctx, args).await?,
        Commands::Categories { top } => catalog::categories(ctx, top).await?,
        Commands::Cart { action } => cart::run_cart(ctx, action).await?,
        Commands::Wishlist { action } => cart::run_wishlist(ctx, action).await?,
        Commands::Address { action } => account::run_address(ctx, action).await?,
        Commands::Card { action } => account::run_card(ctx, action).await?,
        Commands::Checkout { action } => checkout::run(ctx, action).await?,
        Commands::Orders => account::orders(ctx).await?,
    }
    Ok(())
}
