//! Checkout service: totals, selection and order submission.

use chrono::Utc;
use storekeep_core::{AddressId, CardId};
use tracing::{error, info, instrument};

use super::settle;
use crate::api::OrderBackend;
use crate::checkout::{CheckoutTotals, build_order, totals};
use crate::error::{ClientError, Result};
use crate::state::ClientState;
use crate::store::{CartAction, CheckoutAction, SubmittedOrder};

/// Marks the submission failed if the request future is dropped before it
/// completes, so `submitting` never stays set.
struct SubmitGuard<'a> {
    state: &'a ClientState,
    armed: bool,
}

impl SubmitGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.dispatch(CheckoutAction::SubmitFailed(
                "Order submission was interrupted".to_string(),
            ));
        }
    }
}

/// Turns the cart into an order over an [`OrderBackend`].
#[derive(Debug)]
pub struct CheckoutService<'a, B> {
    state: &'a ClientState,
    backend: &'a B,
}

impl<'a, B: OrderBackend> CheckoutService<'a, B> {
    #[must_use]
    pub const fn new(state: &'a ClientState, backend: &'a B) -> Self {
        Self { state, backend }
    }

    /// Totals for the current cart selection.
    #[must_use]
    pub fn totals(&self) -> CheckoutTotals {
        totals(&self.state.snapshot().cart)
    }

    pub fn select_address(&self, id: Option<AddressId>) {
        self.state.dispatch(CheckoutAction::SelectAddress(id));
    }

    pub fn select_card(&self, id: Option<CardId>) {
        self.state.dispatch(CheckoutAction::SelectCard(id));
    }

    /// Validate and submit an order for the selected cart lines.
    ///
    /// The payload is built and validated before any request is made. On
    /// success the ordered lines leave the cart; on failure the cart is left
    /// untouched and the payload is discarded.
    ///
    /// # Errors
    ///
    /// - `ClientError::SubmissionInFlight` while another submission is running
    /// - `ClientError::InvalidOrder` when validation fails
    /// - `ClientError::Auth` when nobody is logged in
    /// - any backend error
    #[instrument(skip(self, cvv))]
    pub async fn submit(&self, cvv: &str) -> Result<SubmittedOrder> {
        let now = Utc::now();
        let prepared = self.state.with_store(|store| -> Result<_> {
            let state = store.state();
            if state.checkout.submitting {
                return Err(ClientError::SubmissionInFlight);
            }

            let card = state.checkout.card.and_then(|id| state.account.card(id));
            let payload = build_order(
                &state.cart,
                state.checkout.shipping_address,
                card,
                cvv,
                now,
            )?;
            let (token, _) = store
                .persistence()
                .token()
                .ok_or_else(|| ClientError::Auth("Log in to place an order".to_string()))?;

            store.dispatch(CheckoutAction::SubmitStarted);
            Ok((payload, token))
        });

        let (payload, token) = match prepared {
            Ok(prepared) => prepared,
            Err(ClientError::SubmissionInFlight) => return Err(ClientError::SubmissionInFlight),
            Err(e) => {
                self.state
                    .dispatch(CheckoutAction::SubmitFailed(e.user_message()));
                return Err(e);
            }
        };

        let guard = SubmitGuard {
            state: self.state,
            armed: true,
        };
        let result = self.backend.create_order(&token, &payload).await;
        guard.disarm();

        match result {
            Ok(receipt) => {
                let order = SubmittedOrder {
                    order_id: receipt.id,
                    total: payload.price(),
                    placed_at: now,
                };
                self.state.with_store(|store| {
                    store.dispatch(CartAction::Ordered(payload.ordered_counts()));
                    store.dispatch(CheckoutAction::SubmitSucceeded(order.clone()));
                });
                info!(
                    order_id = ?order.order_id,
                    total = %order.total,
                    lines = payload.products().len(),
                    "Order placed"
                );
                Ok(order)
            }
            Err(e) => {
                error!(error = %e, total = %payload.price(), "Order submission failed");
                self.state
                    .dispatch(CheckoutAction::SubmitFailed(e.user_message()));
                settle(self.state, Err(e))
            }
        }
    }
}
