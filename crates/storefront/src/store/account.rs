//! Account slice: saved addresses, saved cards and order history.

use crate::api::{Address, OrderSummary, StoredCard};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccountState {
    pub addresses: Vec<Address>,
    pub cards: Vec<StoredCard>,
    pub orders: Vec<OrderSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountAction {
    AddressesLoaded(Vec<Address>),
    CardsLoaded(Vec<StoredCard>),
    OrdersLoaded(Vec<OrderSummary>),
    Clear,
}

impl AccountState {
    #[must_use]
    pub fn reduce(&self, action: &AccountAction) -> Self {
        let mut next = self.clone();
        match action {
            AccountAction::AddressesLoaded(addresses) => next.addresses = addresses.clone(),
            AccountAction::CardsLoaded(cards) => next.cards = cards.clone(),
            AccountAction::OrdersLoaded(orders) => next.orders = orders.clone(),
            AccountAction::Clear => next = Self::default(),
        }
        next
    }

    #[must_use]
    pub fn address(&self, id: storekeep_core::AddressId) -> Option<&Address> {
        self.addresses.iter().find(|a| a.id == id)
    }

    #[must_use]
    pub fn card(&self, id: storekeep_core::CardId) -> Option<&StoredCard> {
        self.cards.iter().find(|c| c.id == id)
    }
}
