//! Account service: address book, card wallet and order history.
//!
//! Every mutation re-fetches the affected list so the account slice mirrors
//! the server.

use chrono::Utc;
use storekeep_core::{AddressId, CardExpiry, CardId};
use tracing::{info, instrument};

use super::{require_token, settle};
use crate::api::{AccountBackend, Address, AddressInput, CardInput, OrderSummary, StoredCard};
use crate::error::{ClientError, Result};
use crate::state::ClientState;
use crate::store::AccountAction;

/// Reject an address with any blank field.
fn validate_address(address: &AddressInput) -> Result<()> {
    let fields = [
        ("title", &address.title),
        ("name", &address.name),
        ("surname", &address.surname),
        ("phone", &address.phone),
        ("city", &address.city),
        ("district", &address.district),
        ("neighborhood", &address.neighborhood),
    ];
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((field, _)) => Err(ClientError::Validation(format!(
            "Address {field} is required"
        ))),
        None => Ok(()),
    }
}

/// Authenticated account operations over an [`AccountBackend`].
#[derive(Debug)]
pub struct AccountService<'a, B> {
    state: &'a ClientState,
    backend: &'a B,
}

impl<'a, B: AccountBackend> AccountService<'a, B> {
    #[must_use]
    pub const fn new(state: &'a ClientState, backend: &'a B) -> Self {
        Self { state, backend }
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// Fetch saved addresses into the account slice.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Auth` when logged out, or the backend error.
    #[instrument(skip(self))]
    pub async fn load_addresses(&self) -> Result<Vec<Address>> {
        let token = require_token(self.state)?;
        let addresses = settle(self.state, self.backend.addresses(&token).await)?;
        self.state
            .dispatch(AccountAction::AddressesLoaded(addresses.clone()));
        Ok(addresses)
    }

    /// Save a new address.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` for blank fields, `ClientError::Auth`
    /// when logged out, or the backend error.
    #[instrument(skip(self, address))]
    pub async fn add_address(&self, address: &AddressInput) -> Result<Vec<Address>> {
        validate_address(address)?;
        let token = require_token(self.state)?;
        settle(self.state, self.backend.add_address(&token, address).await)?;
        info!(title = %address.title, "Address added");
        self.load_addresses().await
    }

    /// Replace a saved address.
    ///
    /// # Errors
    ///
    /// Same as [`Self::add_address`].
    #[instrument(skip(self, address), fields(id = %address.id))]
    pub async fn update_address(&self, address: &Address) -> Result<Vec<Address>> {
        validate_address(&address.fields)?;
        let token = require_token(self.state)?;
        settle(self.state, self.backend.update_address(&token, address).await)?;
        self.load_addresses().await
    }

    /// Delete a saved address.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Auth` when logged out, or the backend error.
    #[instrument(skip(self))]
    pub async fn delete_address(&self, id: AddressId) -> Result<Vec<Address>> {
        let token = require_token(self.state)?;
        settle(self.state, self.backend.delete_address(&token, id).await)?;
        info!("Address deleted");
        self.load_addresses().await
    }

    // =========================================================================
    // Cards
    // =========================================================================

    /// Fetch saved cards into the account slice.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Auth` when logged out, or the backend error.
    #[instrument(skip(self))]
    pub async fn load_cards(&self) -> Result<Vec<StoredCard>> {
        let token = require_token(self.state)?;
        let cards = settle(self.state, self.backend.cards(&token).await)?;
        self.state.dispatch(AccountAction::CardsLoaded(cards.clone()));
        Ok(cards)
    }

    /// Save a new card. Expired cards are rejected before any request.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` for a bad expiry or blank name,
    /// `ClientError::Auth` when logged out, or the backend error.
    #[instrument(skip(self, card), fields(last_four = card.card_no.last_four()))]
    pub async fn add_card(&self, card: &CardInput) -> Result<Vec<StoredCard>> {
        if card.name_on_card.trim().is_empty() {
            return Err(ClientError::Validation(
                "Name on card is required".to_string(),
            ));
        }
        CardExpiry::new(card.expire_month, card.expire_year)?.check_on(Utc::now().date_naive())?;

        let token = require_token(self.state)?;
        settle(self.state, self.backend.add_card(&token, card).await)?;
        info!("Card added");
        self.load_cards().await
    }

    /// Replace a saved card.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Auth` when logged out, or the backend error.
    #[instrument(skip(self, card), fields(id = %card.id))]
    pub async fn update_card(&self, card: &StoredCard) -> Result<Vec<StoredCard>> {
        let token = require_token(self.state)?;
        settle(self.state, self.backend.update_card(&token, card).await)?;
        self.load_cards().await
    }

    /// Delete a saved card.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Auth` when logged out, or the backend error.
    #[instrument(skip(self))]
    pub async fn delete_card(&self, id: CardId) -> Result<Vec<StoredCard>> {
        let token = require_token(self.state)?;
        settle(self.state, self.backend.delete_card(&token, id).await)?;
        info!("Card deleted");
        self.load_cards().await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Fetch past orders into the account slice.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Auth` when logged out, or the backend error.
    #[instrument(skip(self))]
    pub async fn load_orders(&self) -> Result<Vec<OrderSummary>> {
        let token = require_token(self.state)?;
        let orders = settle(self.state, self.backend.orders(&token).await)?;
        self.state
            .dispatch(AccountAction::OrdersLoaded(orders.clone()));
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> AddressInput {
        AddressInput {
            title: "Home".to_string(),
            name: "Jane".to_string(),
            surname: "Doe".to_string(),
            phone: "05551234567".to_string(),
            city: "istanbul".to_string(),
            district: "Kadikoy".to_string(),
            neighborhood: "Moda".to_string(),
        }
    }

    #[test]
    fn test_validate_address_accepts_complete_input() {
        assert!(validate_address(&address()).is_ok());
    }

    #[test]
    fn test_validate_address_names_blank_field() {
        let input = AddressInput {
            city: "  ".to_string(),
            ..address()
        };
        match validate_address(&input) {
            Err(ClientError::Validation(message)) => assert!(message.contains("city")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
