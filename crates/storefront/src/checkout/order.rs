//! Order payload builder.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use serde::{Serialize, Serializer};
use storekeep_core::{
    AddressId, CardExpiry, CardExpiryError, CardNumber, CardNumberError, Cvv, CvvError, Price,
    ProductId,
};
use thiserror::Error;

use super::totals;
use crate::api::StoredCard;
use crate::store::CartState;

/// Reasons an order cannot be built. Raised before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderValidationError {
    #[error("no items selected for checkout")]
    EmptyCart,
    #[error("order total must be greater than zero")]
    NonPositiveTotal,
    #[error("select a shipping address")]
    MissingAddress,
    #[error("select a payment card")]
    MissingCard,
    #[error(transparent)]
    CardNumber(#[from] CardNumberError),
    #[error(transparent)]
    CardExpiry(#[from] CardExpiryError),
    #[error(transparent)]
    Cvv(#[from] CvvError),
}

/// One ordered product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub count: u32,
    pub detail: String,
}

/// Body of `POST /order`. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct OrderPayload {
    address_id: AddressId,
    order_date: NaiveDateTime,
    card_no: CardNumber,
    card_name: String,
    card_expire_month: u32,
    card_expire_year: i32,
    #[serde(serialize_with = "serialize_cvv")]
    card_ccv: Cvv,
    #[serde(serialize_with = "serialize_price")]
    price: Price,
    products: Vec<OrderLine>,
}

impl OrderPayload {
    #[must_use]
    pub const fn address_id(&self) -> AddressId {
        self.address_id
    }

    #[must_use]
    pub const fn order_date(&self) -> NaiveDateTime {
        self.order_date
    }

    /// Grand total including shipping.
    #[must_use]
    pub const fn price(&self) -> Price {
        self.price
    }

    #[must_use]
    pub fn products(&self) -> &[OrderLine] {
        &self.products
    }

    /// Ordered units per product.
    #[must_use]
    pub fn ordered_counts(&self) -> Vec<(ProductId, u32)> {
        self.products
            .iter()
            .map(|line| (line.product_id, line.count))
            .collect()
    }

    #[must_use]
    pub fn card_last_four(&self) -> &str {
        self.card_no.last_four()
    }
}

/// Validate the checkout inputs and assemble the order for the cart's
/// selected lines.
///
/// `now` becomes the order date and is the reference for card expiry.
///
/// # Errors
///
/// Returns the first failed check, in order: empty selection, non-positive
/// total, missing address, missing card, card number, expiry, CVV.
pub fn build_order(
    cart: &CartState,
    address: Option<AddressId>,
    card: Option<&StoredCard>,
    cvv: &str,
    now: DateTime<Utc>,
) -> Result<OrderPayload, OrderValidationError> {
    let products: Vec<OrderLine> = cart
        .selected_lines()
        .map(|line| OrderLine {
            product_id: line.id,
            count: line.quantity.get(),
            detail: line.name.clone(),
        })
        .collect();
    if products.is_empty() {
        return Err(OrderValidationError::EmptyCart);
    }

    let totals = totals(cart);
    if !totals.grand_total.is_positive() {
        return Err(OrderValidationError::NonPositiveTotal);
    }

    let address_id = address.ok_or(OrderValidationError::MissingAddress)?;
    let card = card.ok_or(OrderValidationError::MissingCard)?;

    let card_no = CardNumber::parse(&card.card_no)?;
    CardExpiry::new(card.expire_month, card.expire_year)?.check_on(now.date_naive())?;
    let card_ccv = Cvv::parse(cvv)?;

    Ok(OrderPayload {
        address_id,
        order_date: now.naive_utc().trunc_subsecs(0),
        card_no,
        card_name: card.name_on_card.clone(),
        card_expire_month: card.expire_month,
        card_expire_year: card.expire_year,
        card_ccv,
        price: totals.grand_total,
        products,
    })
}

// Digits as a string: a leading zero is part of the code.
fn serialize_cvv<S: Serializer>(cvv: &Cvv, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(cvv.digits())
}

fn serialize_price<S: Serializer>(price: &Price, serializer: S) -> Result<S::Ok, S::Error> {
    rust_decimal::serde::float::serialize(&price.amount(), serializer)
}
