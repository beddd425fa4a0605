pub mod http;

pub use http::HttpApiClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::catalog::ProductQuery;
use crate::error::ApiError;
use crate::models::{ProductDetails, ProductPage, ProductRating, ProductSummary, Review, ReviewInput};

/// Response to a post-review request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostReviewResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub review: Review,
    #[serde(default)]
    pub product: Option<ProductRating>,
}

/// Response to a delete-review request
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeleteReviewResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub product: Option<ProductRating>,
}

/// Remote review endpoints the review store delegates to.
///
/// Both calls act on the authenticated caller's review of a product; the
/// credential is supplied by the implementation, not passed per call.
#[async_trait]
pub trait ReviewApiClient: Send + Sync {
    /// Create or replace the caller's review of a product (upsert).
    async fn post_review(
        &self,
        product_id: &str,
        review: &ReviewInput,
    ) -> Result<PostReviewResponse, ApiError>;

    /// Delete the caller's review of a product.
    ///
    /// No review id is sent: the server resolves the review from the caller
    /// and the product.
    async fn delete_review(&self, product_id: &str) -> Result<DeleteReviewResponse, ApiError>;
}

/// Remote product endpoints used for browsing and detail hydration
#[async_trait]
pub trait CatalogApiClient: Send + Sync {
    async fn fetch_products(&self, query: &ProductQuery) -> Result<ProductPage, ApiError>;

    async fn fetch_product_details(&self, product_id: &str) -> Result<ProductDetails, ApiError>;

    /// Natural-language product search. A response without products is empty.
    async fn ai_search(&self, prompt: &str) -> Result<Vec<ProductSummary>, ApiError>;
}

#[async_trait]
impl<T: ReviewApiClient + ?Sized> ReviewApiClient for std::sync::Arc<T> {
    async fn post_review(
        &self,
        product_id: &str,
        review: &ReviewInput,
    ) -> Result<PostReviewResponse, ApiError> {
        (**self).post_review(product_id, review).await
    }

    async fn delete_review(&self, product_id: &str) -> Result<DeleteReviewResponse, ApiError> {
        (**self).delete_review(product_id).await
    }
}

#[async_trait]
impl<T: CatalogApiClient + ?Sized> CatalogApiClient for std::sync::Arc<T> {
    async fn fetch_products(&self, query: &ProductQuery) -> Result<ProductPage, ApiError> {
        (**self).fetch_products(query).await
    }

    async fn fetch_product_details(&self, product_id: &str) -> Result<ProductDetails, ApiError> {
        (**self).fetch_product_details(product_id).await
    }

    async fn ai_search(&self, prompt: &str) -> Result<Vec<ProductSummary>, ApiError> {
        (**self).ai_search(prompt).await
    }
}
