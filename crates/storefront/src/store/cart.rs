//! Cart aggregate.
//!
//! Lines are keyed by product id and kept in insertion order. Which lines are
//! checked out is tracked in a separate selection set so that selecting or
//! deselecting never touches the lines themselves.
//!
//! Invariants held by every transition:
//! - quantities are at least 1 (`NonZeroU32`); dropping to 0 removes the line
//! - product ids are unique
//! - the selection only contains ids of existing lines
//! - a cart that goes from empty to non-empty has every line selected

use std::collections::BTreeSet;
use std::num::NonZeroU32;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use storekeep_core::{Price, ProductId};

use crate::api::Product;

/// Product fields captured when it is added to the cart or wishlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub image: Option<String>,
}

impl From<&Product> for ProductSnapshot {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            unit_price: product.price,
            image: product.primary_image().map(str::to_owned),
        }
    }
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub image: Option<String>,
    pub quantity: NonZeroU32,
}

impl LineItem {
    fn from_snapshot(snapshot: &ProductSnapshot) -> Self {
        Self {
            id: snapshot.id,
            name: snapshot.name.clone(),
            unit_price: snapshot.unit_price,
            image: snapshot.image.clone(),
            quantity: NonZeroU32::MIN,
        }
    }

    /// `unit_price × quantity`, unrounded.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price * self.quantity.get()
    }
}

/// Cart transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    Add(ProductSnapshot),
    Remove(ProductId),
    /// Values of 0 or below remove the line.
    SetQuantity { id: ProductId, quantity: i64 },
    Clear,
    /// Take ordered units off their lines after an order is placed. A line
    /// whose quantity reaches zero is removed; units added since the order was
    /// built stay in the cart.
    Ordered(Vec<(ProductId, u32)>),
    ToggleSelected(ProductId),
    SelectAll,
    DeselectAll,
}

/// Cart lines plus the checkout selection.
///
/// Serializes as the bare line array without the selection, which then
/// defaults to all lines. The persisted snapshot stores the selection
/// separately and reapplies it with [`CartState::with_selection`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<LineItem>", into = "Vec<LineItem>")]
pub struct CartState {
    lines: IndexMap<ProductId, LineItem>,
    selected: BTreeSet<ProductId>,
}

impl From<Vec<LineItem>> for CartState {
    /// Duplicate ids from a hand-edited or corrupt snapshot are merged by
    /// keeping the first occurrence.
    fn from(lines: Vec<LineItem>) -> Self {
        let mut map = IndexMap::with_capacity(lines.len());
        for line in lines {
            map.entry(line.id).or_insert(line);
        }
        let selected = map.keys().copied().collect();
        Self {
            lines: map,
            selected,
        }
    }
}

impl From<CartState> for Vec<LineItem> {
    fn from(cart: CartState) -> Self {
        cart.lines.into_values().collect()
    }
}

impl CartState {
    /// Lines in insertion order.
    pub fn lines(&self) -> impl Iterator<Item = &LineItem> {
        self.lines.values()
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&LineItem> {
        self.lines.get(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.values().map(|l| u64::from(l.quantity.get())).sum()
    }

    #[must_use]
    pub const fn selected(&self) -> &BTreeSet<ProductId> {
        &self.selected
    }

    #[must_use]
    pub fn is_selected(&self, id: ProductId) -> bool {
        self.selected.contains(&id)
    }

    /// Selected lines in insertion order.
    pub fn selected_lines(&self) -> impl Iterator<Item = &LineItem> {
        self.lines
            .values()
            .filter(|line| self.selected.contains(&line.id))
    }

    /// Replace the selection, ignoring ids that have no line.
    #[must_use]
    pub fn with_selection(mut self, selection: impl IntoIterator<Item = ProductId>) -> Self {
        self.selected = selection
            .into_iter()
            .filter(|id| self.lines.contains_key(id))
            .collect();
        self
    }

    /// Whether every line is selected.
    #[must_use]
    pub fn all_selected(&self) -> bool {
        self.selected.len() == self.lines.len()
    }

    /// Apply a transition.
    #[must_use]
    pub fn reduce(&self, action: &CartAction) -> Self {
        let mut next = self.clone();
        next.apply(action);
        next
    }

    fn apply(&mut self, action: &CartAction) {
        match action {
            CartAction::Add(snapshot) => self.add_item(snapshot),
            CartAction::Remove(id) => self.remove_item(*id),
            CartAction::SetQuantity { id, quantity } => self.set_quantity(*id, *quantity),
            CartAction::Clear => {
                self.lines.clear();
                self.selected.clear();
            }
            CartAction::Ordered(counts) => {
                for (id, count) in counts {
                    if let Some(line) = self.lines.get(id) {
                        let left = i64::from(line.quantity.get()) - i64::from(*count);
                        self.set_quantity(*id, left);
                    }
                }
            }
            CartAction::ToggleSelected(id) => {
                if self.lines.contains_key(id) && !self.selected.remove(id) {
                    self.selected.insert(*id);
                }
            }
            CartAction::SelectAll => self.selected = self.lines.keys().copied().collect(),
            CartAction::DeselectAll => self.selected.clear(),
        }
    }

    fn add_item(&mut self, snapshot: &ProductSnapshot) {
        if let Some(line) = self.lines.get_mut(&snapshot.id) {
            line.quantity = line.quantity.saturating_add(1);
            return;
        }

        if self.lines.is_empty() {
            self.selected.clear();
        }
        self.lines
            .insert(snapshot.id, LineItem::from_snapshot(snapshot));
        self.selected.insert(snapshot.id);
    }

    fn remove_item(&mut self, id: ProductId) {
        self.lines.shift_remove(&id);
        self.selected.remove(&id);
    }

    fn set_quantity(&mut self, id: ProductId, quantity: i64) {
        let Some(line) = self.lines.get_mut(&id) else {
            return;
        };
        let clamped = u32::try_from(quantity.max(0)).unwrap_or(u32::MAX);
        match NonZeroU32::new(clamped) {
            Some(quantity) => line.quantity = quantity,
            None => self.remove_item(id),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn snapshot(id: i64, cents: i64) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            unit_price: Price::from_cents(cents),
            image: None,
        }
    }

    fn qty(cart: &CartState, id: i64) -> Option<u32> {
        cart.get(ProductId::new(id)).map(|l| l.quantity.get())
    }

    #[test]
    fn test_add_existing_increments_by_one() {
        let cart = CartState::default()
            .reduce(&CartAction::Add(snapshot(1, 5000)))
            .reduce(&CartAction::Add(snapshot(1, 5000)));
        assert_eq!(cart.len(), 1);
        assert_eq!(qty(&cart, 1), Some(2));
    }

    #[test]
    fn test_add_keeps_first_snapshot() {
        let mut repriced = snapshot(1, 9999);
        repriced.name = "Renamed".to_string();
        let cart = CartState::default()
            .reduce(&CartAction::Add(snapshot(1, 5000)))
            .reduce(&CartAction::Add(repriced));
        let line = cart.get(ProductId::new(1)).unwrap();
        assert_eq!(line.unit_price, Price::from_cents(5000));
        assert_eq!(line.name, "Product 1");
    }

    #[test]
    fn test_set_quantity_zero_equals_remove() {
        let cart = CartState::default()
            .reduce(&CartAction::Add(snapshot(1, 5000)))
            .reduce(&CartAction::Add(snapshot(2, 6000)));
        let via_zero = cart.reduce(&CartAction::SetQuantity {
            id: ProductId::new(1),
            quantity: 0,
        });
        let via_remove = cart.reduce(&CartAction::Remove(ProductId::new(1)));
        assert_eq!(via_zero, via_remove);

        let via_negative = cart.reduce(&CartAction::SetQuantity {
            id: ProductId::new(1),
            quantity: -3,
        });
        assert_eq!(via_negative, via_remove);
    }

    #[test]
    fn test_set_quantity_on_absent_id_is_noop() {
        let cart = CartState::default().reduce(&CartAction::Add(snapshot(1, 5000)));
        let next = cart.reduce(&CartAction::SetQuantity {
            id: ProductId::new(9),
            quantity: 4,
        });
        assert_eq!(next, cart);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let cart = CartState::default().reduce(&CartAction::Add(snapshot(1, 5000)));
        assert_eq!(cart.reduce(&CartAction::Remove(ProductId::new(2))), cart);
    }

    #[test]
    fn test_selection_defaults_to_all_when_cart_fills() {
        let cart = CartState::default()
            .reduce(&CartAction::Add(snapshot(1, 5000)))
            .reduce(&CartAction::Add(snapshot(2, 6000)));
        assert!(cart.all_selected());

        let emptied = cart
            .reduce(&CartAction::DeselectAll)
            .reduce(&CartAction::Clear)
            .reduce(&CartAction::Add(snapshot(3, 100)));
        assert!(emptied.is_selected(ProductId::new(3)));
        assert!(emptied.all_selected());
    }

    #[test]
    fn test_toggle_selection_leaves_lines_alone() {
        let cart = CartState::default()
            .reduce(&CartAction::Add(snapshot(1, 5000)))
            .reduce(&CartAction::Add(snapshot(2, 6000)));
        let toggled = cart.reduce(&CartAction::ToggleSelected(ProductId::new(1)));

        assert!(!toggled.is_selected(ProductId::new(1)));
        assert!(toggled.is_selected(ProductId::new(2)));
        assert!(toggled.lines().eq(cart.lines()));

        let back = toggled.reduce(&CartAction::ToggleSelected(ProductId::new(1)));
        assert_eq!(back, cart);
    }

    #[test]
    fn test_toggle_unknown_id_is_ignored() {
        let cart = CartState::default().reduce(&CartAction::Add(snapshot(1, 5000)));
        let next = cart.reduce(&CartAction::ToggleSelected(ProductId::new(7)));
        assert_eq!(next, cart);
    }

    #[test]
    fn test_ordered_units_leave_the_cart() {
        let cart = CartState::default()
            .reduce(&CartAction::Add(snapshot(1, 5000)))
            .reduce(&CartAction::Add(snapshot(2, 6000)))
            .reduce(&CartAction::Add(snapshot(3, 7000)));
        let next = cart.reduce(&CartAction::Ordered(vec![
            (ProductId::new(1), 1),
            (ProductId::new(3), 1),
        ]));
        assert_eq!(next.len(), 1);
        assert!(next.get(ProductId::new(2)).is_some());
        assert_eq!(next.selected().len(), 1);
    }

    #[test]
    fn test_units_added_after_ordering_are_kept() {
        let ordered_two = CartState::default()
            .reduce(&CartAction::Add(snapshot(1, 5000)))
            .reduce(&CartAction::Add(snapshot(1, 5000)));
        let grew = ordered_two.reduce(&CartAction::Add(snapshot(1, 5000)));

        let next = grew.reduce(&CartAction::Ordered(vec![(ProductId::new(1), 2)]));
        assert_eq!(qty(&next, 1), Some(1));
        assert!(next.is_selected(ProductId::new(1)));

        let gone = grew.reduce(&CartAction::Ordered(vec![(ProductId::new(1), 3)]));
        assert!(gone.is_empty());
        assert!(gone.selected().is_empty());
    }

    #[test]
    fn test_serializes_as_line_array_and_reselects_on_load() {
        let cart = CartState::default()
            .reduce(&CartAction::Add(snapshot(1, 5000)))
            .reduce(&CartAction::Add(snapshot(2, 6000)))
            .reduce(&CartAction::ToggleSelected(ProductId::new(2)));

        let json = serde_json::to_value(&cart).unwrap();
        assert!(json.is_array());
        assert_eq!(json.as_array().unwrap().len(), 2);

        let loaded: CartState = serde_json::from_value(json).unwrap();
        assert!(loaded.all_selected());
        assert!(loaded.lines().eq(cart.lines()));
    }

    #[test]
    fn test_load_merges_duplicate_ids() {
        let json = serde_json::json!([
            {"id": 1, "name": "A", "unit_price": "1.00", "image": null, "quantity": 2},
            {"id": 1, "name": "A", "unit_price": "1.00", "image": null, "quantity": 5},
        ]);
        let cart: CartState = serde_json::from_value(json).unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(qty(&cart, 1), Some(2));
    }

    #[test]
    fn test_load_rejects_zero_quantity() {
        let json = serde_json::json!([
            {"id": 1, "name": "A", "unit_price": "1.00", "image": null, "quantity": 0},
        ]);
        assert!(serde_json::from_value::<CartState>(json).is_err());
    }

    fn action_strategy() -> impl Strategy<Value = CartAction> {
        let id = 1_i64..6;
        prop_oneof![
            id.clone().prop_map(|id| CartAction::Add(snapshot(id, 1000 + id))),
            id.clone().prop_map(|id| CartAction::Remove(ProductId::new(id))),
            (id.clone(), -3_i64..6).prop_map(|(id, quantity)| CartAction::SetQuantity {
                id: ProductId::new(id),
                quantity,
            }),
            id.prop_map(|id| CartAction::ToggleSelected(ProductId::new(id))),
            Just(CartAction::Clear),
            Just(CartAction::SelectAll),
            Just(CartAction::DeselectAll),
        ]
    }

    proptest! {
        #[test]
        fn prop_invariants_hold(actions in prop::collection::vec(action_strategy(), 0..40)) {
            let mut cart = CartState::default();
            for action in &actions {
                let was_empty = cart.is_empty();
                cart = cart.reduce(action);

                let mut seen = BTreeSet::new();
                for line in cart.lines() {
                    prop_assert!(line.quantity.get() >= 1);
                    prop_assert!(seen.insert(line.id));
                }
                for id in cart.selected() {
                    prop_assert!(cart.get(*id).is_some());
                }
                if was_empty && !cart.is_empty() {
                    prop_assert!(cart.all_selected());
                }
            }
        }

        #[test]
        fn prop_add_increments_exactly_one(
            actions in prop::collection::vec(action_strategy(), 0..20),
            id in 1_i64..6,
        ) {
            let cart = actions.iter().fold(CartState::default(), |c, a| c.reduce(a));
            let before = qty(&cart, id).unwrap_or(0);
            let after = cart.reduce(&CartAction::Add(snapshot(id, 1000 + id)));
            prop_assert_eq!(qty(&after, id), Some(before + 1));
        }
    }
}
