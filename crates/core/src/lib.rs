//! Storekeep Core - Shared types library.
//!
//! This crate provides common types used across all Storekeep components:
//! - `storefront` - Client-side state store, persistence and checkout pipeline
//! - `cli` - Command-line front end driving the storefront client
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, payment cards and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
