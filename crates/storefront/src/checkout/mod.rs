//! Checkout calculator.
//!
//! Pure functions over the cart; totals are recomputed on every call.

mod order;

use storekeep_core::{Price, ProductId};

pub use order::{OrderLine, OrderPayload, OrderValidationError, build_order};

use crate::store::CartState;

/// Subtotals at or above this ship for free.
pub const FREE_SHIPPING_THRESHOLD: Price = Price::from_cents(15_000);

/// Flat shipping fee below the threshold.
pub const SHIPPING_FEE: Price = Price::from_cents(2_999);

/// Derived order totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutTotals {
    pub subtotal: Price,
    pub shipping: Price,
    pub grand_total: Price,
}

/// Sum of `unit_price × quantity` over the lines whose ids are in `selected`,
/// rounded to cents. Ids not in the cart are ignored.
#[must_use]
pub fn subtotal<'a>(cart: &CartState, selected: impl IntoIterator<Item = &'a ProductId>) -> Price {
    selected
        .into_iter()
        .filter_map(|id| cart.get(*id))
        .map(crate::store::LineItem::line_total)
        .sum::<Price>()
        .round_cents()
}

/// Free at or above [`FREE_SHIPPING_THRESHOLD`], [`SHIPPING_FEE`] otherwise.
#[must_use]
pub fn shipping(subtotal: Price) -> Price {
    if subtotal >= FREE_SHIPPING_THRESHOLD {
        Price::ZERO
    } else {
        SHIPPING_FEE
    }
}

/// Totals for the cart's current selection.
#[must_use]
pub fn totals(cart: &CartState) -> CheckoutTotals {
    totals_for(cart, cart.selected())
}

/// Totals for an explicit selection.
#[must_use]
pub fn totals_for<'a>(
    cart: &CartState,
    selected: impl IntoIterator<Item = &'a ProductId>,
) -> CheckoutTotals {
    let subtotal = subtotal(cart, selected);
    let shipping = shipping(subtotal);
    CheckoutTotals {
        subtotal,
        shipping,
        grand_total: subtotal + shipping,
    }
}
