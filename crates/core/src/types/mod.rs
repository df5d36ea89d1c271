//! Core types for Storekeep.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod card;
pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use card::{CardExpiry, CardExpiryError, CardNumber, CardNumberError, Cvv, CvvError};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::Price;
pub use status::*;
