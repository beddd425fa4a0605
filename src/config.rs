use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub reviews: ReviewsConfig,
    pub catalog: CatalogConfig,
}

/// Remote API connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Session token sent as the `token` cookie. Usually supplied through
    /// `STOREFRONT_SESSION_TOKEN` rather than the file.
    pub session_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000/api/v1".to_string(),
            timeout_secs: 30,
            user_agent: concat!("storefront-reviews/", env!("CARGO_PKG_VERSION")).to_string(),
            session_token: None,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Review feature settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewsConfig {
    pub post_failed_message: String,
    pub delete_failed_message: String,
    /// Rating pre-selected in an empty review form
    pub default_rating: u8,
}

impl Default for ReviewsConfig {
    fn default() -> Self {
        Self {
            post_failed_message: "Failed to post review.".to_string(),
            delete_failed_message: "Failed to delete review.".to_string(),
            default_rating: 1,
        }
    }
}

/// Product browsing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub fetch_products_failed_message: String,
    pub fetch_details_failed_message: String,
    pub ai_search_failed_message: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            fetch_products_failed_message: "Failed to fetch products.".to_string(),
            fetch_details_failed_message: "Failed to fetch product details.".to_string(),
            ai_search_failed_message: "Failed to fetch AI filtered products.".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;

        info!(path = %path.display(), "Loaded configuration");

        Ok(config)
    }

    /// Load configuration from the default location (.storefront/config.yml)
    pub fn load_default() -> Result<Self> {
        Self::load(".storefront/config.yml")
    }

    fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            anyhow::bail!("api.base_url must not be empty");
        }
        if !(crate::models::MIN_RATING..=crate::models::MAX_RATING)
            .contains(&self.reviews.default_rating)
        {
            anyhow::bail!(
                "reviews.default_rating must be between 1 and 5, got {}",
                self.reviews.default_rating
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.reviews.default_rating, 1);
        assert_eq!(config.reviews.post_failed_message, "Failed to post review.");
        assert!(config.api.session_token.is_none());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
api:
  base_url: "https://shop.example.com/api/v1"
  timeout_secs: 5

reviews:
  default_rating: 3
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.api.base_url, "https://shop.example.com/api/v1");
        assert_eq!(config.api.timeout(), Duration::from_secs(5));
        assert_eq!(config.reviews.default_rating, 3);
        assert_eq!(config.reviews.delete_failed_message, "Failed to delete review.");
        assert_eq!(
            config.catalog.ai_search_failed_message,
            "Failed to fetch AI filtered products."
        );
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("absent.yml")).unwrap();
        assert_eq!(config.api.base_url, ApiConfig::default().base_url);
    }

    #[test]
    fn test_load_rejects_out_of_range_rating() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "reviews:\n  default_rating: 9").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("default_rating"));
    }
}
