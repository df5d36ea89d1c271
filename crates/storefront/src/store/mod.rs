//! The central state store.
//!
//! [`AppState`] composes every slice. [`reduce`] is a pure, total function
//! from the current state and an [`Action`] to the next state. [`Store`] owns
//! the current state, runs the reducer, persists the session/cart/wishlist
//! slices when they change and publishes snapshots to subscribers.

mod account;
mod cart;
mod catalog;
mod checkout;
mod session;
mod wishlist;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

pub use account::{AccountAction, AccountState};
pub use cart::{CartAction, CartState, LineItem, ProductSnapshot};
pub use catalog::{CatalogAction, CatalogState};
pub use checkout::{CheckoutAction, CheckoutState, SubmittedOrder};
pub use session::{SessionAction, SessionState, User};
pub use wishlist::{WishlistAction, WishlistEntry, WishlistState};

use crate::persistence::{PersistenceAdapter, Snapshot};

/// Everything the view layer can observe.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub session: SessionState,
    pub cart: CartState,
    pub wishlist: WishlistState,
    pub catalog: CatalogState,
    pub account: AccountState,
    pub checkout: CheckoutState,
}

/// An intent routed to one slice.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Session(SessionAction),
    Cart(CartAction),
    Wishlist(WishlistAction),
    Catalog(CatalogAction),
    Account(AccountAction),
    Checkout(CheckoutAction),
}

impl From<SessionAction> for Action {
    fn from(action: SessionAction) -> Self {
        Self::Session(action)
    }
}

impl From<CartAction> for Action {
    fn from(action: CartAction) -> Self {
        Self::Cart(action)
    }
}

impl From<WishlistAction> for Action {
    fn from(action: WishlistAction) -> Self {
        Self::Wishlist(action)
    }
}

impl From<CatalogAction> for Action {
    fn from(action: CatalogAction) -> Self {
        Self::Catalog(action)
    }
}

impl From<AccountAction> for Action {
    fn from(action: AccountAction) -> Self {
        Self::Account(action)
    }
}

impl From<CheckoutAction> for Action {
    fn from(action: CheckoutAction) -> Self {
        Self::Checkout(action)
    }
}

/// Compute the next state.
///
/// Besides routing to the owning slice this applies the cross-slice rules:
/// logging out empties the cart, account and checkout slices; an expired
/// session drops account data but keeps the cart; reloading addresses or
/// cards drops a checkout selection that no longer exists.
#[must_use]
pub fn reduce(state: &AppState, action: &Action) -> AppState {
    let mut next = state.clone();
    match action {
        Action::Session(action) => {
            next.session = state.session.reduce(action);
            match action {
                SessionAction::LoggedOut => {
                    next.cart = CartState::default();
                    next.account = AccountState::default();
                    next.checkout = CheckoutState::default();
                }
                SessionAction::Expired(_) => {
                    next.account = AccountState::default();
                    next.checkout = CheckoutState {
                        last_error: state.checkout.last_error.clone(),
                        ..CheckoutState::default()
                    };
                }
                _ => {}
            }
        }
        Action::Cart(action) => next.cart = state.cart.reduce(action),
        Action::Wishlist(action) => next.wishlist = state.wishlist.reduce(action),
        Action::Catalog(action) => next.catalog = state.catalog.reduce(action),
        Action::Account(action) => {
            next.account = state.account.reduce(action);
            if let Some(id) = next.checkout.shipping_address
                && next.account.address(id).is_none()
            {
                next.checkout.shipping_address = None;
            }
            if let Some(id) = next.checkout.card
                && next.account.card(id).is_none()
            {
                next.checkout.card = None;
            }
        }
        Action::Checkout(action) => next.checkout = state.checkout.reduce(action),
    }
    next
}

/// Owner of the current [`AppState`].
pub struct Store {
    state: Arc<AppState>,
    persistence: Arc<PersistenceAdapter>,
    tx: watch::Sender<Arc<AppState>>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state)
            .field("subscribers", &self.tx.receiver_count())
            .finish_non_exhaustive()
    }
}

impl Store {
    /// A store starting from `initial` that persists through `persistence`.
    #[must_use]
    pub fn new(initial: AppState, persistence: Arc<PersistenceAdapter>) -> Self {
        let state = Arc::new(initial);
        let (tx, _rx) = watch::channel(Arc::clone(&state));
        Self {
            state,
            persistence,
            tx,
        }
    }

    /// A store restored from the persisted snapshot, or empty on cold start.
    #[must_use]
    pub fn hydrate(persistence: Arc<PersistenceAdapter>) -> Self {
        let has_token = persistence.token().is_some();
        let initial = persistence
            .load()
            .map(|snapshot| AppState {
                session: snapshot.session.rehydrate(has_token),
                cart: match snapshot.selection {
                    Some(selection) => snapshot.cart.with_selection(selection),
                    None => snapshot.cart,
                },
                wishlist: snapshot.wishlist,
                ..AppState::default()
            })
            .unwrap_or_default();

        debug!(
            status = %initial.session.status,
            cart_lines = initial.cart.len(),
            wishlist_items = initial.wishlist.len(),
            "Hydrated store"
        );
        Self::new(initial, persistence)
    }

    /// The current snapshot.
    #[must_use]
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Receive every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<AppState>> {
        self.tx.subscribe()
    }

    #[must_use]
    pub fn persistence(&self) -> &PersistenceAdapter {
        &self.persistence
    }

    /// Reduce, persist if a persisted slice changed, then publish.
    ///
    /// Transitions that produce an identical state are not published.
    pub fn dispatch(&mut self, action: impl Into<Action>) -> Arc<AppState> {
        let action = action.into();
        let next = reduce(&self.state, &action);
        if next == *self.state {
            return self.state();
        }

        if next.session != self.state.session
            || next.cart != self.state.cart
            || next.wishlist != self.state.wishlist
        {
            self.persistence.save(&Snapshot::from(&next));
        }

        self.state = Arc::new(next);
        self.tx.send_replace(Arc::clone(&self.state));
        self.state()
    }
}
