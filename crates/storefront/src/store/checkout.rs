//! Checkout slice: what the next order will use and how the last one went.

use chrono::{DateTime, Utc};
use storekeep_core::{AddressId, CardId, OrderId, Price};

/// Record of a successfully placed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedOrder {
    pub order_id: Option<OrderId>,
    pub total: Price,
    pub placed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CheckoutState {
    pub shipping_address: Option<AddressId>,
    pub card: Option<CardId>,
    /// Set while an order request is outstanding.
    pub submitting: bool,
    pub last_order: Option<SubmittedOrder>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutAction {
    SelectAddress(Option<AddressId>),
    SelectCard(Option<CardId>),
    SubmitStarted,
    SubmitSucceeded(SubmittedOrder),
    SubmitFailed(String),
}

impl CheckoutState {
    #[must_use]
    pub fn reduce(&self, action: &CheckoutAction) -> Self {
        let mut next = self.clone();
        match action {
            CheckoutAction::SelectAddress(id) => next.shipping_address = *id,
            CheckoutAction::SelectCard(id) => next.card = *id,
            CheckoutAction::SubmitStarted => {
                next.submitting = true;
                next.last_error = None;
            }
            CheckoutAction::SubmitSucceeded(order) => {
                next.submitting = false;
                next.last_order = Some(order.clone());
                next.last_error = None;
            }
            CheckoutAction::SubmitFailed(message) => {
                next.submitting = false;
                next.last_error = Some(message.clone());
            }
        }
        next
    }
}
