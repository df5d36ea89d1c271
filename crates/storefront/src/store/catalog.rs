//! Catalog slice: the current product listing and the category list.

use storekeep_core::FetchState;

use crate::api::{Category, Product, ProductPage, ProductQuery};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CatalogState {
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub total: u64,
    pub fetch_state: FetchState,
    pub query: ProductQuery,
    pub current_product: Option<Product>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogAction {
    QueryChanged(ProductQuery),
    FetchStarted,
    ProductsLoaded(ProductPage),
    ProductLoaded(Product),
    FetchFailed(String),
    CategoriesLoaded(Vec<Category>),
}

impl CatalogState {
    #[must_use]
    pub fn reduce(&self, action: &CatalogAction) -> Self {
        let mut next = self.clone();
        match action {
            CatalogAction::QueryChanged(query) => next.query = query.clone(),
            CatalogAction::FetchStarted => {
                next.fetch_state = FetchState::Loading;
                next.last_error = None;
            }
            CatalogAction::ProductsLoaded(page) => {
                next.products = page.products.clone();
                next.total = page.total;
                next.fetch_state = FetchState::Success;
            }
            CatalogAction::ProductLoaded(product) => {
                next.current_product = Some(product.clone());
                next.fetch_state = FetchState::Success;
            }
            CatalogAction::FetchFailed(message) => {
                next.fetch_state = FetchState::Error;
                next.last_error = Some(message.clone());
            }
            CatalogAction::CategoriesLoaded(categories) => next.categories = categories.clone(),
        }
        next
    }
}
