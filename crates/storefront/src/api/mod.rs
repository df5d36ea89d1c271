//! Client for the remote catalog/order REST API.
//!
//! [`ApiClient`] is a thin JSON-over-HTTPS wrapper around `reqwest`. It holds
//! no session state: authenticated calls take the bearer token as an argument
//! so the persistence layer stays the only owner of credentials.
//!
//! Every request carries a fresh `X-Request-Id`. Non-success statuses are
//! mapped through [`ClientError::from_status`].

mod backend;
mod cache;
mod types;

use std::sync::Arc;

use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use storekeep_core::{AddressId, CardId, ProductId};
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

pub use backend::{AccountBackend, AuthBackend, CatalogBackend, OrderBackend};
pub use cache::{CacheKey, CacheValue, CatalogCache};
pub use types::{
    Address, AddressInput, AuthPayload, CardInput, Category, Credentials, DEFAULT_PAGE_LIMIT,
    OrderReceipt, OrderSummary, OrderedProduct, Product, ProductImage, ProductPage, ProductQuery,
    Role, SignupForm, StoredCard, UserPayload,
};

use crate::checkout::OrderPayload;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// HTTP client for the storefront API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the configured base URL and timeout.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unknown` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("storekeep/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.clone(),
            }),
        })
    }

    /// The API base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| ClientError::Unknown(format!("Invalid API path '{path}': {e}")))
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, request: RequestBuilder) -> Result<String> {
        let request_id = Uuid::new_v4();
        let response = request
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                request_id = %request_id,
                body = %body.chars().take(500).collect::<String>(),
                "API returned non-success status"
            );
            return Err(ClientError::from_status(status, &body));
        }

        debug!(status = %status, request_id = %request_id, "API request succeeded");
        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let body = self.send(request).await?;
        parse_body(&body)
    }

    fn get(&self, url: Url) -> RequestBuilder {
        self.inner.client.get(url)
    }

    fn authed(request: RequestBuilder, token: &SecretString) -> RequestBuilder {
        request.bearer_auth(token.expose_secret())
    }
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %body.chars().take(500).collect::<String>(),
            "Failed to parse API response"
        );
        ClientError::from(e)
    })
}

// =============================================================================
// Auth
// =============================================================================

impl AuthBackend for ApiClient {
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn login(&self, credentials: &Credentials) -> Result<AuthPayload> {
        let body = serde_json::json!({
            "email": credentials.email.as_str(),
            "password": credentials.password.expose_secret(),
        });
        let request = self.inner.client.post(self.url("login")?).json(&body);
        self.send_json(request).await
    }

    #[instrument(skip(self, form), fields(email = %form.email))]
    async fn signup(&self, form: &SignupForm) -> Result<AuthPayload> {
        let body = serde_json::json!({
            "name": form.name,
            "email": form.email.as_str(),
            "password": form.password.expose_secret(),
            "role_id": form.role_id,
        });
        let request = self.inner.client.post(self.url("signup")?).json(&body);
        self.send_json(request).await
    }

    #[instrument(skip(self, token))]
    async fn verify(&self, token: &SecretString) -> Result<Option<AuthPayload>> {
        let request = Self::authed(self.get(self.url("verify")?), token);
        let body = self.send(request).await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        parse_body(&body).map(Some)
    }
}

// =============================================================================
// Catalog
// =============================================================================

impl CatalogBackend for ApiClient {
    #[instrument(skip(self))]
    async fn products(&self, query: &ProductQuery) -> Result<ProductPage> {
        let mut url = self.url("products")?;
        url.query_pairs_mut().extend_pairs(query.to_pairs());
        self.send_json(self.get(url)).await
    }

    #[instrument(skip(self))]
    async fn product(&self, id: ProductId) -> Result<Product> {
        let url = self.url(&format!("products/{id}"))?;
        self.send_json(self.get(url)).await
    }

    #[instrument(skip(self))]
    async fn categories(&self) -> Result<Vec<Category>> {
        self.send_json(self.get(self.url("categories")?)).await
    }

    #[instrument(skip(self))]
    async fn roles(&self) -> Result<Vec<Role>> {
        self.send_json(self.get(self.url("roles")?)).await
    }
}

// =============================================================================
// Account
// =============================================================================

impl AccountBackend for ApiClient {
    #[instrument(skip(self, token))]
    async fn addresses(&self, token: &SecretString) -> Result<Vec<Address>> {
        let request = Self::authed(self.get(self.url("user/address")?), token);
        self.send_json(request).await
    }

    #[instrument(skip(self, token, address), fields(title = %address.title))]
    async fn add_address(&self, token: &SecretString, address: &AddressInput) -> Result<()> {
        let request = self.inner.client.post(self.url("user/address")?).json(address);
        self.send(Self::authed(request, token)).await.map(drop)
    }

    #[instrument(skip(self, token, address), fields(id = %address.id))]
    async fn update_address(&self, token: &SecretString, address: &Address) -> Result<()> {
        let request = self.inner.client.put(self.url("user/address")?).json(address);
        self.send(Self::authed(request, token)).await.map(drop)
    }

    #[instrument(skip(self, token))]
    async fn delete_address(&self, token: &SecretString, id: AddressId) -> Result<()> {
        let request = self
            .inner
            .client
            .delete(self.url(&format!("user/address/{id}"))?);
        self.send(Self::authed(request, token)).await.map(drop)
    }

    #[instrument(skip(self, token))]
    async fn cards(&self, token: &SecretString) -> Result<Vec<StoredCard>> {
        let request = Self::authed(self.get(self.url("user/card")?), token);
        self.send_json(request).await
    }

    #[instrument(skip(self, token, card), fields(last_four = %card.card_no.last_four()))]
    async fn add_card(&self, token: &SecretString, card: &CardInput) -> Result<()> {
        let request = self.inner.client.post(self.url("user/card")?).json(card);
        self.send(Self::authed(request, token)).await.map(drop)
    }

    #[instrument(skip(self, token, card), fields(id = %card.id))]
    async fn update_card(&self, token: &SecretString, card: &StoredCard) -> Result<()> {
        let request = self.inner.client.put(self.url("user/card")?).json(card);
        self.send(Self::authed(request, token)).await.map(drop)
    }

    #[instrument(skip(self, token))]
    async fn delete_card(&self, token: &SecretString, id: CardId) -> Result<()> {
        let request = self
            .inner
            .client
            .delete(self.url(&format!("user/card/{id}"))?);
        self.send(Self::authed(request, token)).await.map(drop)
    }

    #[instrument(skip(self, token))]
    async fn orders(&self, token: &SecretString) -> Result<Vec<OrderSummary>> {
        let request = Self::authed(self.get(self.url("order")?), token);
        self.send_json(request).await
    }
}

// =============================================================================
// Orders
// =============================================================================

impl OrderBackend for ApiClient {
    #[instrument(skip(self, token, order), fields(total = %order.price(), lines = order.products().len()))]
    async fn create_order(&self, token: &SecretString, order: &OrderPayload) -> Result<OrderReceipt> {
        let request = self.inner.client.post(self.url("order")?).json(order);
        let body = self.send(Self::authed(request, token)).await?;
        // The receipt is informational; an unexpected body does not undo a placed order.
        Ok(serde_json::from_str(&body).unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn client(base: &str) -> ApiClient {
        let config = ClientConfig::new(
            Url::parse(base).unwrap(),
            PathBuf::from("/tmp/durable"),
            PathBuf::from("/tmp/session"),
        );
        ApiClient::new(&config).unwrap()
    }

    #[test]
    fn test_paths_join_onto_base() {
        let api = client("https://api.example.com/v1/");
        assert_eq!(
            api.url("user/address/4").unwrap().as_str(),
            "https://api.example.com/v1/user/address/4"
        );
    }

    #[test]
    fn test_parse_body_maps_to_unknown() {
        let result: Result<Vec<Category>> = parse_body("<html>");
        assert!(matches!(result, Err(ClientError::Unknown(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_server_unavailable() {
        let api = client("http://127.0.0.1:9/");
        let err = api.categories().await.unwrap_err();
        assert!(err.is_retryable(), "unexpected error: {err:?}");
    }
}
