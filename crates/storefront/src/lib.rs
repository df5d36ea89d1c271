//! Storekeep Storefront library.
//!
//! The client-side core of a small e-commerce storefront: a central state
//! store with pure reducers, two-tier persistence, a session manager with
//! guarded token verification, the cart and wishlist aggregates, the checkout
//! calculator and the order payload builder.
//!
//! # Modules
//!
//! - [`api`] - REST client, backend traits and the catalog cache
//! - [`checkout`] - totals and order payload construction
//! - [`config`] - environment-driven configuration
//! - [`error`] - the client error taxonomy
//! - [`persistence`] - durable and session storage tiers
//! - [`services`] - session, catalog, account and checkout flows
//! - [`state`] - shared handle over the store, persistence and caches
//! - [`store`] - application state, actions and reducers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod checkout;
pub mod config;
pub mod error;
pub mod persistence;
pub mod services;
pub mod state;
pub mod store;

pub use config::ClientConfig;
pub use error::{ClientError, ErrorKind, Result};
pub use state::ClientState;
