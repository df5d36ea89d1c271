//! Time-limited cache for reference data (categories, roles).

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use super::types::{Category, Role};

/// Cache key for reference data.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Categories,
    Roles,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Categories(Arc<Vec<Category>>),
    Roles(Arc<Vec<Role>>),
}

/// Categories and roles change rarely; they are fetched once per TTL.
#[derive(Clone)]
pub struct CatalogCache {
    inner: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for CatalogCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogCache")
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}

impl CatalogCache {
    /// Create a cache whose entries expire `ttl` after insertion.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder().max_capacity(16).time_to_live(ttl).build(),
        }
    }

    pub async fn categories(&self) -> Option<Arc<Vec<Category>>> {
        match self.inner.get(&CacheKey::Categories).await {
            Some(CacheValue::Categories(categories)) => {
                debug!("Cache hit for categories");
                Some(categories)
            }
            _ => None,
        }
    }

    pub async fn insert_categories(&self, categories: Vec<Category>) -> Arc<Vec<Category>> {
        let categories = Arc::new(categories);
        self.inner
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(Arc::clone(&categories)),
            )
            .await;
        categories
    }

    pub async fn roles(&self) -> Option<Arc<Vec<Role>>> {
        match self.inner.get(&CacheKey::Roles).await {
            Some(CacheValue::Roles(roles)) => {
                debug!("Cache hit for roles");
                Some(roles)
            }
            _ => None,
        }
    }

    pub async fn insert_roles(&self, roles: Vec<Role>) -> Arc<Vec<Role>> {
        let roles = Arc::new(roles);
        self.inner
            .insert(CacheKey::Roles, CacheValue::Roles(Arc::clone(&roles)))
            .await;
        roles
    }

    /// Drop every cached entry.
    pub fn invalidate(&self) {
        self.inner.invalidate_all();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use storekeep_core::{CategoryId, RoleId};

    use super::*;

    fn category(id: i64) -> Category {
        Category {
            id: CategoryId::new(id),
            title: format!("Category {id}"),
            code: String::new(),
            gender: "k".to_string(),
            rating: 4.2,
            img: String::new(),
        }
    }

    #[tokio::test]
    async fn test_round_trip_and_invalidate() {
        let cache = CatalogCache::new(Duration::from_secs(300));
        assert!(cache.categories().await.is_none());

        cache.insert_categories(vec![category(1), category(2)]).await;
        cache
            .insert_roles(vec![Role {
                id: RoleId::new(1),
                name: "Customer".to_string(),
                code: "customer".to_string(),
            }])
            .await;

        assert_eq!(cache.categories().await.unwrap().len(), 2);
        assert_eq!(cache.roles().await.unwrap().len(), 1);

        cache.invalidate();
        assert!(cache.categories().await.is_none());
        assert!(cache.roles().await.is_none());
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let cache = CatalogCache::new(Duration::from_millis(50));
        cache.insert_categories(vec![category(1)]).await;
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(cache.categories().await.is_none());
    }
}
