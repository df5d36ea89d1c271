//! Request and response shapes of the remote REST API.

use core::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use storekeep_core::{
    AddressId, CardId, CardNumber, CategoryId, Email, OrderId, Price, ProductId, ProductSort,
    RoleId,
};

use crate::store::User;

/// Number of products requested per page when no limit is given.
pub const DEFAULT_PAGE_LIMIT: u32 = 25;

// =============================================================================
// Auth
// =============================================================================

/// Login form input.
#[derive(Debug)]
pub struct Credentials {
    pub email: Email,
    pub password: SecretString,
}

/// Signup form input.
#[derive(Debug)]
pub struct SignupForm {
    pub name: String,
    pub email: Email,
    pub password: SecretString,
    pub role_id: RoleId,
}

/// User fields as they appear in auth responses, either at the top level
/// (`/login`, `/verify`) or nested under `user` (`/signup`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role_id: Option<RoleId>,
}

/// Response of `/login`, `/signup` and `/verify`.
#[derive(Debug, Default, Deserialize)]
pub struct AuthPayload {
    #[serde(default, deserialize_with = "deserialize_token")]
    pub token: Option<SecretString>,
    #[serde(flatten)]
    pub fields: UserPayload,
    #[serde(default)]
    pub user: Option<UserPayload>,
}

impl AuthPayload {
    /// Normalize the payload into a user record.
    ///
    /// A nested `user` object wins over top-level fields. A missing name
    /// becomes `"User"`. Returns `None` when no valid email is present, which
    /// callers treat as an unusable payload.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        let fields = self.user.as_ref().unwrap_or(&self.fields);
        let email = Email::parse(fields.email.as_deref()?).ok()?;
        let name = fields
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("User")
            .to_string();

        Some(User {
            name,
            email,
            role_id: fields.role_id,
        })
    }
}

fn deserialize_token<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .filter(|t| !t.trim().is_empty())
        .map(SecretString::from))
}

/// Role a user can sign up with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    #[serde(default)]
    pub code: String,
}

// =============================================================================
// Catalog
// =============================================================================

/// Product image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub url: String,
    #[serde(default)]
    pub index: u32,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub sell_count: i64,
    #[serde(default)]
    pub images: Vec<ProductImage>,
}

impl Product {
    /// URL of the lowest-indexed image, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images
            .iter()
            .min_by_key(|img| img.index)
            .map(|img| img.url.as_str())
    }
}

/// One page of the product listing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductPage {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub total: u64,
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub title: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub img: String,
}

/// Listing parameters for `GET /products`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub category: Option<CategoryId>,
    pub filter: Option<String>,
    pub sort: Option<ProductSort>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            category: None,
            filter: None,
            sort: None,
            limit: DEFAULT_PAGE_LIMIT,
            offset: 0,
        }
    }
}

impl ProductQuery {
    /// Query-string pairs, omitting unset parameters.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(5);
        if let Some(category) = self.category {
            pairs.push(("category", category.to_string()));
        }
        if let Some(filter) = self.filter.as_deref().map(str::trim).filter(|f| !f.is_empty()) {
            pairs.push(("filter", filter.to_string()));
        }
        if let Some(sort) = self.sort {
            pairs.push(("sort", sort.as_str().to_string()));
        }
        pairs.push(("limit", self.limit.to_string()));
        pairs.push(("offset", self.offset.to_string()));
        pairs
    }
}

// =============================================================================
// Account
// =============================================================================

/// A saved shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    #[serde(flatten)]
    pub fields: AddressInput,
}

/// Address fields sent when creating or updating an address.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AddressInput {
    pub title: String,
    pub name: String,
    pub surname: String,
    pub phone: String,
    pub city: String,
    pub district: String,
    pub neighborhood: String,
}

/// A saved payment card as returned by `GET /user/card`.
///
/// `card_no` is kept raw; it is validated when an order is built.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCard {
    pub id: CardId,
    pub card_no: String,
    pub expire_month: u32,
    pub expire_year: i32,
    pub name_on_card: String,
}

impl StoredCard {
    /// Last four characters of the stored number.
    #[must_use]
    pub fn last_four(&self) -> &str {
        let start = self.card_no.len().saturating_sub(4);
        self.card_no.get(start..).unwrap_or_default()
    }
}

impl fmt::Debug for StoredCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCard")
            .field("id", &self.id)
            .field("card_no", &format_args!("****{}", self.last_four()))
            .field("expire_month", &self.expire_month)
            .field("expire_year", &self.expire_year)
            .field("name_on_card", &self.name_on_card)
            .finish()
    }
}

/// Card fields sent when creating a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardInput {
    pub card_no: CardNumber,
    pub expire_month: u32,
    pub expire_year: i32,
    pub name_on_card: String,
}

/// One product line of a past order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedProduct {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub detail: String,
}

/// A past order from `GET /order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: OrderId,
    #[serde(default)]
    pub order_date: String,
    pub price: Price,
    #[serde(default)]
    pub products: Vec<OrderedProduct>,
}

/// Response of `POST /order`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct OrderReceipt {
    #[serde(default)]
    pub id: Option<OrderId>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_login_payload_top_level_fields() {
        let payload: AuthPayload = serde_json::from_str(
            r#"{"token":"abc","name":"Jane","email":"jane@example.com","role_id":3}"#,
        )
        .unwrap();

        assert_eq!(payload.token.as_ref().unwrap().expose_secret(), "abc");
        let user = payload.user().unwrap();
        assert_eq!(user.name, "Jane");
        assert_eq!(user.email.as_str(), "jane@example.com");
        assert_eq!(user.role_id, Some(RoleId::new(3)));
    }

    #[test]
    fn test_signup_payload_nested_user() {
        let payload: AuthPayload = serde_json::from_str(
            r#"{"token":"t","user":{"email":"new@example.com","role_id":1}}"#,
        )
        .unwrap();

        let user = payload.user().unwrap();
        assert_eq!(user.name, "User");
        assert_eq!(user.email.as_str(), "new@example.com");
    }

    #[test]
    fn test_payload_without_email_is_unusable() {
        let payload: AuthPayload = serde_json::from_str(r#"{"name":"Ghost"}"#).unwrap();
        assert!(payload.user().is_none());
        assert!(payload.token.is_none());
    }

    #[test]
    fn test_blank_token_is_dropped() {
        let payload: AuthPayload =
            serde_json::from_str(r#"{"token":"  ","email":"a@b.c"}"#).unwrap();
        assert!(payload.token.is_none());
    }

    #[test]
    fn test_product_primary_image() {
        let product: Product = serde_json::from_str(
            r#"{"id":1,"name":"Shirt","price":49.9,
                "images":[{"url":"b.jpg","index":1},{"url":"a.jpg","index":0}]}"#,
        )
        .unwrap();
        assert_eq!(product.primary_image(), Some("a.jpg"));
        assert_eq!(product.price, Price::from_cents(4990));
    }

    #[test]
    fn test_query_pairs_skip_unset() {
        let query = ProductQuery {
            category: Some(CategoryId::new(2)),
            filter: Some("  ".to_string()),
            sort: Some(ProductSort::PriceDesc),
            ..ProductQuery::default()
        };
        let pairs = query.to_pairs();
        assert_eq!(
            pairs,
            vec![
                ("category", "2".to_string()),
                ("sort", "price:desc".to_string()),
                ("limit", "25".to_string()),
                ("offset", "0".to_string()),
            ]
        );
    }

    #[test]
    fn test_stored_card_debug_is_masked() {
        let card = StoredCard {
            id: CardId::new(1),
            card_no: "4111111111114242".to_string(),
            expire_month: 12,
            expire_year: 2030,
            name_on_card: "Jane Doe".to_string(),
        };
        let debug = format!("{card:?}");
        assert!(debug.contains("****4242"));
        assert!(!debug.contains("41111111"));
    }

    #[test]
    fn test_address_flattens_fields() {
        let address: Address = serde_json::from_str(
            r#"{"id":4,"title":"Home","name":"Jane","surname":"Doe","phone":"555",
                "city":"Izmir","district":"Konak","neighborhood":"Alsancak"}"#,
        )
        .unwrap();
        assert_eq!(address.id, AddressId::new(4));
        assert_eq!(address.fields.city, "Izmir");
    }
}
