//! Collaborator traits for the remote API.
//!
//! Services are generic over these so they can run against [`ApiClient`]
//! in production and against in-process fakes in tests.
//!
//! [`ApiClient`]: super::ApiClient

use std::future::Future;

use secrecy::SecretString;
use storekeep_core::{AddressId, CardId, ProductId};

use super::types::{
    Address, AddressInput, AuthPayload, CardInput, Category, Credentials, OrderReceipt,
    OrderSummary, Product, ProductPage, ProductQuery, Role, SignupForm, StoredCard,
};
use crate::checkout::OrderPayload;
use crate::error::Result;

/// Login, signup and token verification.
pub trait AuthBackend: Send + Sync {
    fn login(&self, credentials: &Credentials) -> impl Future<Output = Result<AuthPayload>> + Send;

    fn signup(&self, form: &SignupForm) -> impl Future<Output = Result<AuthPayload>> + Send;

    /// `Ok(None)` when the server answers with an empty body.
    fn verify(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<Option<AuthPayload>>> + Send;
}

/// Public catalog reads.
pub trait CatalogBackend: Send + Sync {
    fn products(&self, query: &ProductQuery) -> impl Future<Output = Result<ProductPage>> + Send;

    fn product(&self, id: ProductId) -> impl Future<Output = Result<Product>> + Send;

    fn categories(&self) -> impl Future<Output = Result<Vec<Category>>> + Send;

    fn roles(&self) -> impl Future<Output = Result<Vec<Role>>> + Send;
}

/// Authenticated address book, card wallet and order history.
pub trait AccountBackend: Send + Sync {
    fn addresses(&self, token: &SecretString) -> impl Future<Output = Result<Vec<Address>>> + Send;

    fn add_address(
        &self,
        token: &SecretString,
        address: &AddressInput,
    ) -> impl Future<Output = Result<()>> + Send;

    fn update_address(
        &self,
        token: &SecretString,
        address: &Address,
    ) -> impl Future<Output = Result<()>> + Send;

    fn delete_address(
        &self,
        token: &SecretString,
        id: AddressId,
    ) -> impl Future<Output = Result<()>> + Send;

    fn cards(&self, token: &SecretString) -> impl Future<Output = Result<Vec<StoredCard>>> + Send;

    fn add_card(
        &self,
        token: &SecretString,
        card: &CardInput,
    ) -> impl Future<Output = Result<()>> + Send;

    fn update_card(
        &self,
        token: &SecretString,
        card: &StoredCard,
    ) -> impl Future<Output = Result<()>> + Send;

    fn delete_card(&self, token: &SecretString, id: CardId)
    -> impl Future<Output = Result<()>> + Send;

    fn orders(&self, token: &SecretString)
    -> impl Future<Output = Result<Vec<OrderSummary>>> + Send;
}

/// Order placement.
pub trait OrderBackend: Send + Sync {
    fn create_order(
        &self,
        token: &SecretString,
        order: &OrderPayload,
    ) -> impl Future<Output = Result<OrderReceipt>> + Send;
}
