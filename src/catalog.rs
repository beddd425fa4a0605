use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::api::CatalogApiClient;
use crate::config::CatalogConfig;
use crate::error::CatalogError;
use crate::models::{ProductDetails, ProductPage, ProductSummary};

/// Filters for the product listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductQuery {
    pub availability: String,
    pub price: String,
    pub category: String,
    pub ratings: String,
    pub search: String,
    pub page: u32,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            availability: String::new(),
            price: "0-10000".to_string(),
            category: String::new(),
            ratings: String::new(),
            search: String::new(),
            page: 1,
        }
    }
}

impl ProductQuery {
    /// Query-string pairs, skipping empty filters
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        for (key, value) in [
            ("category", &self.category),
            ("price", &self.price),
            ("search", &self.search),
            ("ratings", &self.ratings),
            ("availability", &self.availability),
        ] {
            if !value.is_empty() {
                params.push((key, value.clone()));
            }
        }
        if self.page > 0 {
            params.push(("page", self.page.to_string()));
        }
        params
    }
}

/// Listing state shown on the product browsing pages
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CatalogSnapshot {
    pub products: Vec<ProductSummary>,
    pub new_products: Vec<ProductSummary>,
    pub top_rated_products: Vec<ProductSummary>,
    pub total_products: u64,
    pub loading: bool,
    pub ai_searching: bool,
}

/// Product listing state backed by a [`CatalogApiClient`]
pub struct CatalogStore<C> {
    client: C,
    config: CatalogConfig,
    state: Mutex<CatalogSnapshot>,
}

impl<C: CatalogApiClient> CatalogStore<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            config: CatalogConfig::default(),
            state: Mutex::new(CatalogSnapshot::default()),
        }
    }

    pub fn with_config(mut self, config: &CatalogConfig) -> Self {
        self.config = config.clone();
        self
    }

    /// Load one page of the listing, replacing the current one
    #[instrument(skip(self))]
    pub async fn fetch_products(&self, query: &ProductQuery) -> Result<ProductPage, CatalogError> {
        self.state().loading = true;
        let result = self.client.fetch_products(query).await;

        let mut state = self.state();
        state.loading = false;
        match result {
            Ok(page) => {
                state.products = page.products.clone();
                state.new_products = page.new_products.clone();
                state.top_rated_products = page.top_rated_products.clone();
                state.total_products = page.total_products;
                info!(
                    count = page.products.len(),
                    total = page.total_products,
                    "Fetched products"
                );
                Ok(page)
            }
            Err(err) => {
                warn!(error = %err, "Fetching products failed");
                Err(CatalogError {
                    message: err.message_or(&self.config.fetch_products_failed_message),
                })
            }
        }
    }

    /// Load a product with its reviews. Use the result to hydrate a
    /// [`crate::ReviewSyncStore`].
    #[instrument(skip(self))]
    pub async fn fetch_product_details(
        &self,
        product_id: &str,
    ) -> Result<ProductDetails, CatalogError> {
        self.state().loading = true;
        let result = self.client.fetch_product_details(product_id).await;
        self.state().loading = false;

        result.map_err(|err| {
            warn!(error = %err, "Fetching product details failed");
            CatalogError {
                message: err.message_or(&self.config.fetch_details_failed_message),
            }
        })
    }

    /// Replace the listing with the products matching a natural-language prompt
    #[instrument(skip(self, prompt))]
    pub async fn ai_search(&self, prompt: &str) -> Result<Vec<ProductSummary>, CatalogError> {
        self.state().ai_searching = true;
        let result = self.client.ai_search(prompt).await;

        let mut state = self.state();
        state.ai_searching = false;
        match result {
            Ok(products) => {
                state.products = products.clone();
                state.total_products = products.len() as u64;
                info!(count = products.len(), "AI search complete");
                Ok(products)
            }
            Err(err) => {
                warn!(error = %err, "AI search failed");
                Err(CatalogError {
                    message: err.message_or(&self.config.ai_search_failed_message),
                })
            }
        }
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        self.state().clone()
    }

    fn state(&self) -> MutexGuard<'_, CatalogSnapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use async_trait::async_trait;
    use tokio_test::{assert_err, assert_ok};

    struct FakeCatalog {
        page: Option<ProductPage>,
        search: Option<Vec<ProductSummary>>,
    }

    #[async_trait]
    impl CatalogApiClient for FakeCatalog {
        async fn fetch_products(&self, _query: &ProductQuery) -> Result<ProductPage, ApiError> {
            self.page
                .clone()
                .ok_or_else(|| ApiError::Rejected("Catalog offline".to_string()))
        }

        async fn fetch_product_details(&self, _product_id: &str) -> Result<ProductDetails, ApiError> {
            Err(ApiError::Decode("empty body".to_string()))
        }

        async fn ai_search(&self, _prompt: &str) -> Result<Vec<ProductSummary>, ApiError> {
            self.search
                .clone()
                .ok_or_else(|| ApiError::Decode("empty body".to_string()))
        }
    }

    fn summary(id: &str) -> ProductSummary {
        ProductSummary {
            id: id.to_string(),
            name: format!("Product {id}"),
            price: 10.0,
            category: "Home".to_string(),
            stock: 1,
            ratings: None,
        }
    }

    #[test]
    fn test_default_query_params() {
        let params = ProductQuery::default().to_params();
        assert_eq!(
            params,
            vec![("price", "0-10000".to_string()), ("page", "1".to_string())]
        );
    }

    #[test]
    fn test_query_params_skip_empty_filters() {
        let query = ProductQuery {
            search: "lamp".to_string(),
            ratings: "4".to_string(),
            price: String::new(),
            page: 3,
            ..Default::default()
        };
        let params = query.to_params();
        assert_eq!(
            params,
            vec![
                ("search", "lamp".to_string()),
                ("ratings", "4".to_string()),
                ("page", "3".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_products_updates_listing() {
        let store = CatalogStore::new(FakeCatalog {
            page: Some(ProductPage {
                products: vec![summary("p1"), summary("p2")],
                top_rated_products: vec![summary("p2")],
                total_products: 40,
                ..Default::default()
            }),
            search: None,
        });

        assert_ok!(store.fetch_products(&ProductQuery::default()).await);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.products.len(), 2);
        assert_eq!(snapshot.top_rated_products.len(), 1);
        assert_eq!(snapshot.total_products, 40);
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn test_fetch_products_failure_keeps_listing() {
        let store = CatalogStore::new(FakeCatalog {
            page: None,
            search: None,
        });

        let err = assert_err!(store.fetch_products(&ProductQuery::default()).await);

        assert_eq!(err.message, "Catalog offline");
        assert_eq!(store.snapshot(), CatalogSnapshot::default());
    }

    #[tokio::test]
    async fn test_fetch_details_failure_uses_fallback() {
        let store = CatalogStore::new(FakeCatalog {
            page: None,
            search: None,
        });

        let err = assert_err!(store.fetch_product_details("p1").await);

        assert_eq!(err.message, "Failed to fetch product details.");
        assert!(!store.snapshot().loading);
    }

    #[tokio::test]
    async fn test_ai_search_replaces_listing() {
        let store = CatalogStore::new(FakeCatalog {
            page: Some(ProductPage {
                products: vec![summary("p1"), summary("p2"), summary("p3")],
                total_products: 3,
                ..Default::default()
            }),
            search: Some(vec![summary("p9")]),
        });
        assert_ok!(store.fetch_products(&ProductQuery::default()).await);

        let products = assert_ok!(store.ai_search("something cozy").await);

        assert_eq!(products.len(), 1);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.products, vec![summary("p9")]);
        assert_eq!(snapshot.total_products, 1);
        assert!(!snapshot.ai_searching);
    }

    #[tokio::test]
    async fn test_ai_search_failure_message() {
        let store = CatalogStore::new(FakeCatalog {
            page: None,
            search: None,
        });

        let err = assert_err!(store.ai_search("anything").await);

        assert_eq!(err.message, "Failed to fetch AI filtered products.");
        assert!(!store.snapshot().ai_searching);
    }
}
