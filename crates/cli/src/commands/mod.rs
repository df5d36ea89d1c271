//! Subcommand implementations.
//!
//! Each command builds the service it needs from the shared [`Context`] and
//! prints a short human-readable result.

pub mod account;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;

use storekeep_storefront::api::ApiClient;
use storekeep_storefront::config::ConfigError;
use storekeep_storefront::persistence::StorageError;
use storekeep_storefront::{ClientConfig, ClientError, ClientState};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Local storage could not be opened.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A client operation failed.
    #[error("{}", .0.user_message())]
    Client(#[from] ClientError),

    /// The command line was valid but the request makes no sense.
    #[error("{0}")]
    Usage(String),
}

/// Client state and API client shared by every command.
pub struct Context {
    pub state: ClientState,
    pub api: ApiClient,
}

impl Context {
    /// Open file-backed state and build the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `CliError` if storage cannot be opened or the client cannot be
    /// built.
    pub fn open(config: ClientConfig) -> Result<Self, CliError> {
        let api = ApiClient::new(&config)?;
        let state = ClientState::open(config)?;
        Ok(Self { state, api })
    }
}
