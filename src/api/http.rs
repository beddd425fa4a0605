use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{CatalogApiClient, DeleteReviewResponse, PostReviewResponse, ReviewApiClient};
use crate::catalog::ProductQuery;
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::models::{ProductDetails, ProductPage, ProductSummary, ReviewInput};

/// Storefront REST API client
pub struct HttpApiClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProductEnvelope {
    product: ProductDetails,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AiSearchRequest<'a> {
    user_prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct AiSearchResponse {
    #[serde(default)]
    products: Option<Vec<ProductSummary>>,
}

impl HttpApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.session_token {
            let cookie = HeaderValue::from_str(&format!("token={token}"))
                .map_err(|e| ApiError::InvalidConfig(format!("session token: {e}")))?;
            headers.insert(COOKIE, cookie);
        }

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let response = check_status(response).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Turn a non-2xx response into `ApiError::Server`, keeping the body's message
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message);

    debug!(status = %status, message = ?message, "API request rejected");

    Err(ApiError::Server { status, message })
}

#[async_trait]
impl ReviewApiClient for HttpApiClient {
    #[instrument(skip(self, review), fields(rating = review.rating))]
    async fn post_review(
        &self,
        product_id: &str,
        review: &ReviewInput,
    ) -> Result<PostReviewResponse, ApiError> {
        let url = self.url(&format!("/product/post-new/review/{product_id}"));
        debug!(%url, "Posting review");
        self.send(self.client.put(url).json(review)).await
    }

    #[instrument(skip(self))]
    async fn delete_review(&self, product_id: &str) -> Result<DeleteReviewResponse, ApiError> {
        let url = self.url(&format!("/product/delete/review/{product_id}"));
        debug!(%url, "Deleting review");
        self.send(self.client.delete(url)).await
    }
}

#[async_trait]
impl CatalogApiClient for HttpApiClient {
    #[instrument(skip(self))]
    async fn fetch_products(&self, query: &ProductQuery) -> Result<ProductPage, ApiError> {
        let request = self.client.get(self.url("/product")).query(&query.to_params());
        self.send(request).await
    }

    #[instrument(skip(self))]
    async fn fetch_product_details(&self, product_id: &str) -> Result<ProductDetails, ApiError> {
        let url = self.url(&format!("/product/singleProduct/{product_id}"));
        let envelope: ProductEnvelope = self.send(self.client.get(url)).await?;
        Ok(envelope.product)
    }

    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    async fn ai_search(&self, prompt: &str) -> Result<Vec<ProductSummary>, ApiError> {
        let request = self
            .client
            .post(self.url("/product/ai-search"))
            .json(&AiSearchRequest { user_prompt: prompt });

        let response = check_status(request.send().await?).await?;
        let body = response.text().await?;
        if body.trim().is_empty() || body.trim() == "null" {
            return Ok(Vec::new());
        }

        let parsed: AiSearchResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(parsed.products.unwrap_or_default())
    }
}
