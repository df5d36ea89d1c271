//! Integration tests for Storekeep.
//!
//! The tests in `tests/` drive the storefront client end to end against
//! [`FakeBackend`], an in-process stand-in for the REST API, with both
//! storage tiers held in memory.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storekeep-integration-tests
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use storekeep_core::{AddressId, CardId, CategoryId, Price, ProductId};
use storekeep_storefront::api::{
    AccountBackend, Address, AddressInput, AuthBackend, AuthPayload, CardInput, CatalogBackend,
    Category, Credentials, OrderBackend, OrderReceipt, OrderSummary, Product, ProductPage,
    ProductQuery, Role, SignupForm, StoredCard,
};
use storekeep_storefront::checkout::OrderPayload;
use storekeep_storefront::persistence::{MemoryStorage, PersistenceAdapter};
use storekeep_storefront::services::{
    AccountService, CatalogService, CheckoutService, SessionManager,
};
use storekeep_storefront::store::ProductSnapshot;
use storekeep_storefront::{ClientConfig, ClientError, ClientState, Result};
use url::Url;

/// Token handed out by a successful login.
pub const TOKEN: &str = "fake-token";

/// Password the fake accepts.
pub const PASSWORD: &str = "Secret-123";

/// How the fake answers a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reply {
    #[default]
    Ok,
    /// HTTP 401.
    Unauthorized,
    /// HTTP 5xx or unreachable.
    Unavailable,
    /// HTTP 400.
    BadRequest,
}

impl Reply {
    fn into_result<T>(self, ok: impl FnOnce() -> Result<T>) -> Result<T> {
        match self {
            Self::Ok => ok(),
            Self::Unauthorized => Err(ClientError::Auth("Token is not valid".to_string())),
            Self::Unavailable => Err(ClientError::ServerUnavailable(
                "503 Service Unavailable".to_string(),
            )),
            Self::BadRequest => Err(ClientError::BadRequest(
                "Request was rejected".to_string(),
            )),
        }
    }
}

/// Body of a successful `verify` answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerifyBody {
    #[default]
    User,
    /// 2xx with no body.
    Empty,
    /// 2xx body carrying no usable user.
    NoUser,
}

/// Number of calls received per endpoint.
#[derive(Debug, Default)]
pub struct Calls {
    pub login: AtomicUsize,
    pub signup: AtomicUsize,
    pub verify: AtomicUsize,
    pub products: AtomicUsize,
    pub categories: AtomicUsize,
    pub account: AtomicUsize,
    pub create_order: AtomicUsize,
}

/// Current value of a call counter.
#[must_use]
pub fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::SeqCst);
}

/// In-process implementation of every backend trait.
#[derive(Debug)]
pub struct FakeBackend {
    pub calls: Calls,
    pub login_reply: Mutex<Reply>,
    pub verify_reply: Mutex<Reply>,
    pub verify_body: Mutex<VerifyBody>,
    pub account_reply: Mutex<Reply>,
    pub order_reply: Mutex<Reply>,
    /// Whether signup returns a token.
    pub signup_token: Mutex<bool>,
    /// Token returned by `verify`, if any.
    pub refreshed_token: Mutex<Option<String>>,
    /// How long `verify` takes to answer.
    pub verify_delay: Duration,
    /// How long `create_order` takes to answer.
    pub order_delay: Duration,
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
    pub addresses: Mutex<Vec<Address>>,
    pub cards: Mutex<Vec<StoredCard>>,
    /// JSON bodies received by `create_order`.
    pub orders: Mutex<Vec<Value>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            calls: Calls::default(),
            login_reply: Mutex::new(Reply::Ok),
            verify_reply: Mutex::new(Reply::Ok),
            verify_body: Mutex::new(VerifyBody::User),
            account_reply: Mutex::new(Reply::Ok),
            order_reply: Mutex::new(Reply::Ok),
            signup_token: Mutex::new(true),
            refreshed_token: Mutex::new(None),
            verify_delay: Duration::from_millis(20),
            order_delay: Duration::ZERO,
            products: vec![product(1, "Linen Shirt", 5000), product(2, "Denim Jacket", 6000)],
            categories: vec![
                category(1, "Shirts", 4.2),
                category(2, "Jackets", 4.7),
                category(3, "Shirts", 3.9),
            ],
            addresses: Mutex::new(vec![address(4)]),
            cards: Mutex::new(vec![card(9, "4111 1111 1111 1111", 12, 2099)]),
            orders: Mutex::new(Vec::new()),
        }
    }
}

fn user_json(email: &str) -> Value {
    json!({ "name": "Jane Doe", "email": email, "role_id": 2 })
}

fn auth_payload(value: Value) -> Result<AuthPayload> {
    Ok(serde_json::from_value(value)?)
}

impl AuthBackend for FakeBackend {
    async fn login(&self, credentials: &Credentials) -> Result<AuthPayload> {
        bump(&self.calls.login);
        let reply = *self.login_reply.lock();
        reply.into_result(|| {
            if credentials.password.expose_secret() != PASSWORD {
                return Err(ClientError::Auth("Invalid email or password".to_string()));
            }
            let mut body = user_json(credentials.email.as_str());
            body["token"] = json!(TOKEN);
            auth_payload(body)
        })
    }

    async fn signup(&self, form: &SignupForm) -> Result<AuthPayload> {
        bump(&self.calls.signup);
        let user = json!({ "name": form.name, "email": form.email.as_str(), "role_id": form.role_id });
        if *self.signup_token.lock() {
            auth_payload(json!({ "token": TOKEN, "user": user }))
        } else {
            auth_payload(json!({ "message": "Check your email", "user": user }))
        }
    }

    async fn verify(&self, token: &SecretString) -> Result<Option<AuthPayload>> {
        bump(&self.calls.verify);
        tokio::time::sleep(self.verify_delay).await;

        let reply = *self.verify_reply.lock();
        let shape = *self.verify_body.lock();
        let refreshed = self.refreshed_token.lock().clone();
        reply.into_result(|| {
            if token.expose_secret().is_empty() {
                return Err(ClientError::Auth("Missing token".to_string()));
            }
            let mut body = match shape {
                VerifyBody::User => user_json("jane@example.com"),
                VerifyBody::Empty => return Ok(None),
                VerifyBody::NoUser => json!({ "message": "ok" }),
            };
            if let Some(refreshed) = refreshed {
                body["token"] = json!(refreshed);
            }
            auth_payload(body).map(Some)
        })
    }
}

impl CatalogBackend for FakeBackend {
    async fn products(&self, query: &ProductQuery) -> Result<ProductPage> {
        bump(&self.calls.products);
        let products: Vec<Product> = self
            .products
            .iter()
            .filter(|p| query.category.is_none() || p.category_id == query.category)
            .cloned()
            .collect();
        Ok(ProductPage {
            total: products.len() as u64,
            products,
        })
    }

    async fn product(&self, id: ProductId) -> Result<Product> {
        self.products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| ClientError::Unknown(format!("HTTP 404 Not Found: product {id}")))
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        bump(&self.calls.categories);
        Ok(self.categories.clone())
    }

    async fn roles(&self) -> Result<Vec<Role>> {
        Ok(vec![Role {
            id: storekeep_core::RoleId::new(2),
            name: "Customer".to_string(),
            code: "customer".to_string(),
        }])
    }
}

impl FakeBackend {
    fn account_call<T>(&self, token: &SecretString, ok: impl FnOnce() -> T) -> Result<T> {
        bump(&self.calls.account);
        let reply = *self.account_reply.lock();
        reply.into_result(|| {
            if token.expose_secret() != TOKEN {
                return Err(ClientError::Auth("Unknown token".to_string()));
            }
            Ok(ok())
        })
    }
}

impl AccountBackend for FakeBackend {
    async fn addresses(&self, token: &SecretString) -> Result<Vec<Address>> {
        self.account_call(token, || self.addresses.lock().clone())
    }

    async fn add_address(&self, token: &SecretString, address: &AddressInput) -> Result<()> {
        self.account_call(token, || {
            let mut addresses = self.addresses.lock();
            let next_id = addresses.iter().map(|a| a.id.as_i64()).max().unwrap_or(0) + 1;
            addresses.push(Address {
                id: AddressId::new(next_id),
                fields: address.clone(),
            });
        })
    }

    async fn update_address(&self, token: &SecretString, address: &Address) -> Result<()> {
        self.account_call(token, || {
            for existing in self.addresses.lock().iter_mut() {
                if existing.id == address.id {
                    *existing = address.clone();
                }
            }
        })
    }

    async fn delete_address(&self, token: &SecretString, id: AddressId) -> Result<()> {
        self.account_call(token, || self.addresses.lock().retain(|a| a.id != id))
    }

    async fn cards(&self, token: &SecretString) -> Result<Vec<StoredCard>> {
        self.account_call(token, || self.cards.lock().clone())
    }

    async fn add_card(&self, token: &SecretString, card: &CardInput) -> Result<()> {
        self.account_call(token, || {
            let mut cards = self.cards.lock();
            let next_id = cards.iter().map(|c| c.id.as_i64()).max().unwrap_or(0) + 1;
            cards.push(StoredCard {
                id: CardId::new(next_id),
                card_no: card.card_no.digits().to_string(),
                expire_month: card.expire_month,
                expire_year: card.expire_year,
                name_on_card: card.name_on_card.clone(),
            });
        })
    }

    async fn update_card(&self, token: &SecretString, card: &StoredCard) -> Result<()> {
        self.account_call(token, || {
            for existing in self.cards.lock().iter_mut() {
                if existing.id == card.id {
                    *existing = card.clone();
                }
            }
        })
    }

    async fn delete_card(&self, token: &SecretString, id: CardId) -> Result<()> {
        self.account_call(token, || self.cards.lock().retain(|c| c.id != id))
    }

    async fn orders(&self, token: &SecretString) -> Result<Vec<OrderSummary>> {
        self.account_call(token, Vec::new)
    }
}

impl OrderBackend for FakeBackend {
    async fn create_order(&self, token: &SecretString, order: &OrderPayload) -> Result<OrderReceipt> {
        bump(&self.calls.create_order);
        if !self.order_delay.is_zero() {
            tokio::time::sleep(self.order_delay).await;
        }
        let reply = *self.order_reply.lock();
        reply.into_result(|| {
            if token.expose_secret() != TOKEN {
                return Err(ClientError::Auth("Unknown token".to_string()));
            }
            let body = serde_json::to_value(order)?;
            let mut orders = self.orders.lock();
            orders.push(body);
            Ok(OrderReceipt {
                id: Some(storekeep_core::OrderId::new(
                    i64::try_from(orders.len()).unwrap_or(i64::MAX) + 1000,
                )),
                message: Some("Order created".to_string()),
            })
        })
    }
}

// =============================================================================
// Fixtures
// =============================================================================

#[must_use]
pub fn product(id: i64, name: &str, cents: i64) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        description: String::new(),
        price: Price::from_cents(cents),
        stock: 10,
        category_id: Some(CategoryId::new(1)),
        rating: 4.5,
        sell_count: 0,
        images: Vec::new(),
    }
}

#[must_use]
pub fn category(id: i64, title: &str, rating: f64) -> Category {
    Category {
        id: CategoryId::new(id),
        title: title.to_string(),
        code: format!("k:{}", title.to_lowercase()),
        gender: "k".to_string(),
        rating,
        img: String::new(),
    }
}

#[must_use]
pub fn address(id: i64) -> Address {
    Address {
        id: AddressId::new(id),
        fields: AddressInput {
            title: "Home".to_string(),
            name: "Jane".to_string(),
            surname: "Doe".to_string(),
            phone: "05551234567".to_string(),
            city: "istanbul".to_string(),
            district: "Kadikoy".to_string(),
            neighborhood: "Moda".to_string(),
        },
    }
}

#[must_use]
pub fn card(id: i64, number: &str, month: u32, year: i32) -> StoredCard {
    StoredCard {
        id: CardId::new(id),
        card_no: number.to_string(),
        expire_month: month,
        expire_year: year,
        name_on_card: "Jane Doe".to_string(),
    }
}

#[must_use]
pub fn snapshot(product: &Product) -> ProductSnapshot {
    ProductSnapshot::from(product)
}

// =============================================================================
// Test context
// =============================================================================

/// A client wired to a [`FakeBackend`] with in-memory storage tiers.
///
/// The tiers are shared handles, so [`TestContext::restart`] and
/// [`TestContext::restart_without_session`] can simulate a process restart
/// with and without the session tier surviving.
pub struct TestContext {
    pub state: ClientState,
    pub backend: FakeBackend,
    pub durable: MemoryStorage,
    pub session: MemoryStorage,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    #[must_use]
    pub fn new() -> Self {
        Self::with_backend(FakeBackend::default())
    }

    #[must_use]
    pub fn with_backend(backend: FakeBackend) -> Self {
        let durable = MemoryStorage::new();
        let session = MemoryStorage::new();
        let state = client_over(&durable, &session);
        Self {
            state,
            backend,
            durable,
            session,
        }
    }

    /// A second client over the same tiers, as a restarted process sees them.
    #[must_use]
    pub fn restart(&self) -> ClientState {
        client_over(&self.durable, &self.session)
    }

    /// A client over the same durable tier and a fresh session tier.
    #[must_use]
    pub fn restart_without_session(&self) -> ClientState {
        client_over(&self.durable, &MemoryStorage::new())
    }

    #[must_use]
    pub fn session_manager(&self) -> SessionManager<'_, FakeBackend> {
        SessionManager::new(&self.state, &self.backend)
    }

    #[must_use]
    pub fn catalog(&self) -> CatalogService<'_, FakeBackend> {
        CatalogService::new(&self.state, &self.backend)
    }

    #[must_use]
    pub fn account(&self) -> AccountService<'_, FakeBackend> {
        AccountService::new(&self.state, &self.backend)
    }

    #[must_use]
    pub fn checkout(&self) -> CheckoutService<'_, FakeBackend> {
        CheckoutService::new(&self.state, &self.backend)
    }

    /// Log in as the default user.
    ///
    /// # Errors
    ///
    /// Returns whatever the session manager returns.
    pub async fn login(&self, remember_me: bool) -> Result<()> {
        let credentials = Credentials {
            email: storekeep_core::Email::parse("jane@example.com")?,
            password: SecretString::from(PASSWORD),
        };
        self.session_manager()
            .login(credentials, remember_me)
            .await
            .map(|_| ())
    }
}

/// A client over the given tiers with a placeholder API URL.
#[must_use]
pub fn client_over(durable: &MemoryStorage, session: &MemoryStorage) -> ClientState {
    let config = ClientConfig::new(
        Url::parse("http://127.0.0.1:9/").expect("static URL parses"),
        "unused-data".into(),
        "unused-session".into(),
    );
    let persistence = PersistenceAdapter::new(Arc::new(durable.clone()), Arc::new(session.clone()));
    ClientState::new(config, persistence)
}
