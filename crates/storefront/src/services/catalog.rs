//! Catalog service: product listing, product detail, categories and roles.
//!
//! Categories and roles are served from the [`CatalogCache`] when fresh.
//!
//! [`CatalogCache`]: crate::api::CatalogCache

use std::collections::HashMap;
use std::sync::Arc;

use storekeep_core::ProductId;
use tracing::{debug, instrument};

use crate::api::{CatalogBackend, Category, Product, ProductPage, ProductQuery, Role};
use crate::error::{ClientError, Result};
use crate::state::ClientState;
use crate::store::CatalogAction;

/// The `n` best-rated categories, one per title.
///
/// Duplicate titles keep their highest rating. Ties keep the order in which
/// titles first appeared.
#[must_use]
pub fn top_categories(categories: &[Category], n: usize) -> Vec<Category> {
    let mut best: Vec<Category> = Vec::new();
    let mut by_title: HashMap<&str, usize> = HashMap::new();

    for category in categories {
        match by_title.get(category.title.as_str()) {
            Some(&idx) => {
                if let Some(existing) = best.get_mut(idx).filter(|e| category.rating > e.rating) {
                    *existing = category.clone();
                }
            }
            None => {
                by_title.insert(category.title.as_str(), best.len());
                best.push(category.clone());
            }
        }
    }

    best.sort_by(|a, b| b.rating.total_cmp(&a.rating));
    best.truncate(n);
    best
}

/// Catalog reads over a [`CatalogBackend`].
#[derive(Debug)]
pub struct CatalogService<'a, B> {
    state: &'a ClientState,
    backend: &'a B,
}

impl<'a, B: CatalogBackend> CatalogService<'a, B> {
    #[must_use]
    pub const fn new(state: &'a ClientState, backend: &'a B) -> Self {
        Self { state, backend }
    }

    /// Fetch one page of products and publish it to the catalog slice.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the slice records it as `error`.
    #[instrument(skip(self))]
    pub async fn fetch_products(&self, query: ProductQuery) -> Result<ProductPage> {
        self.state.with_store(|store| {
            store.dispatch(CatalogAction::QueryChanged(query.clone()));
            store.dispatch(CatalogAction::FetchStarted);
        });

        match self.backend.products(&query).await {
            Ok(page) => {
                debug!(count = page.products.len(), total = page.total, "Products loaded");
                self.state
                    .dispatch(CatalogAction::ProductsLoaded(page.clone()));
                Ok(page)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Fetch a single product and make it the current product.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self))]
    pub async fn fetch_product(&self, id: ProductId) -> Result<Product> {
        self.state.dispatch(CatalogAction::FetchStarted);

        match self.backend.product(id).await {
            Ok(product) => {
                self.state
                    .dispatch(CatalogAction::ProductLoaded(product.clone()));
                Ok(product)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// All categories, cached for the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns the backend error on a cache miss.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>> {
        if let Some(cached) = self.state.cache().categories().await {
            debug!("Categories served from cache");
            return Ok(cached);
        }

        let categories = self.backend.categories().await.inspect_err(ClientError::report)?;
        let categories = self.state.cache().insert_categories(categories).await;
        self.state
            .dispatch(CatalogAction::CategoriesLoaded(categories.to_vec()));
        Ok(categories)
    }

    /// The `n` best-rated categories.
    ///
    /// # Errors
    ///
    /// Returns the backend error on a cache miss.
    pub async fn top_categories(&self, n: usize) -> Result<Vec<Category>> {
        let categories = self.categories().await?;
        Ok(top_categories(&categories, n))
    }

    /// Signup roles, cached for the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns the backend error on a cache miss.
    #[instrument(skip(self))]
    pub async fn roles(&self) -> Result<Arc<Vec<Role>>> {
        if let Some(cached) = self.state.cache().roles().await {
            return Ok(cached);
        }

        let roles = self.backend.roles().await.inspect_err(ClientError::report)?;
        Ok(self.state.cache().insert_roles(roles).await)
    }

    /// Drop cached categories and roles.
    pub fn invalidate(&self) {
        self.state.cache().invalidate();
    }

    fn fail(&self, error: ClientError) -> ClientError {
        error.report();
        self.state
            .dispatch(CatalogAction::FetchFailed(error.user_message()));
        error
    }
}

#[cfg(test)]
mod tests {
    use storekeep_core::CategoryId;

    use super::*;

    fn category(id: i64, title: &str, rating: f64) -> Category {
        Category {
            id: CategoryId::new(id),
            title: title.to_string(),
            code: String::new(),
            gender: String::new(),
            rating,
            img: String::new(),
        }
    }

    fn titles(categories: &[Category]) -> Vec<&str> {
        categories.iter().map(|c| c.title.as_str()).collect()
    }

    #[test]
    fn test_top_categories_sorted_by_rating() {
        let categories = vec![
            category(1, "Shoes", 3.5),
            category(2, "Hats", 4.8),
            category(3, "Bags", 4.1),
        ];
        let top = top_categories(&categories, 2);
        assert_eq!(titles(&top), vec!["Hats", "Bags"]);
    }

    #[test]
    fn test_top_categories_dedupes_titles_keeping_best() {
        let categories = vec![
            category(1, "Shirts", 3.0),
            category(2, "Dresses", 4.0),
            category(3, "Shirts", 4.5),
        ];
        let top = top_categories(&categories, 5);
        assert_eq!(titles(&top), vec!["Shirts", "Dresses"]);
        assert_eq!(top.first().map(|c| c.id), Some(CategoryId::new(3)));
    }

    #[test]
    fn test_top_categories_handles_short_and_empty_input() {
        assert!(top_categories(&[], 5).is_empty());
        let one = vec![category(1, "Shoes", 1.0)];
        assert_eq!(top_categories(&one, 5).len(), 1);
        assert!(top_categories(&one, 0).is_empty());
    }
}
