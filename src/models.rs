use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowest rating a reviewer can give
pub const MIN_RATING: u8 = 1;

/// Highest rating a reviewer can give
pub const MAX_RATING: u8 = 5;

/// Display data for the author of a review
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReviewerDisplay {
    pub name: String,
    pub avatar_url: Option<String>,
}

/// A single product review
///
/// The server sends two shapes for the same record: listed reviews nest the
/// author under `reviewer`, while the post-review response carries a bare
/// `user_id`. Both decode into this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ReviewRecord", into = "ReviewRecord")]
pub struct Review {
    pub review_id: String,
    pub reviewer_id: String,
    pub rating: u8,
    pub comment: String,
    pub reviewer: Option<ReviewerDisplay>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Review {
    pub fn new(
        review_id: impl Into<String>,
        reviewer_id: impl Into<String>,
        rating: u8,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            review_id: review_id.into(),
            reviewer_id: reviewer_id.into(),
            rating,
            comment: comment.into(),
            reviewer: None,
            created_at: None,
        }
    }

    pub fn with_reviewer(mut self, reviewer: ReviewerDisplay) -> Self {
        self.reviewer = Some(reviewer);
        self
    }

    /// Name to show for the author, if the server sent one
    pub fn reviewer_name(&self) -> Option<&str> {
        self.reviewer.as_ref().map(|r| r.name.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ReviewRecord {
    review_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reviewer: Option<ReviewerRecord>,
    rating: u8,
    #[serde(default)]
    comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ReviewerRecord {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    avatar: Option<AvatarRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AvatarRecord {
    url: String,
}

impl TryFrom<ReviewRecord> for Review {
    type Error = String;

    fn try_from(record: ReviewRecord) -> Result<Self, Self::Error> {
        let reviewer_id = record
            .user_id
            .or_else(|| record.reviewer.as_ref().map(|r| r.id.clone()))
            .ok_or_else(|| format!("review {} has no reviewer id", record.review_id))?;

        Ok(Self {
            review_id: record.review_id,
            reviewer_id,
            rating: record.rating,
            comment: record.comment,
            reviewer: record.reviewer.map(|r| ReviewerDisplay {
                name: r.name,
                avatar_url: r.avatar.map(|a| a.url),
            }),
            created_at: record.created_at,
        })
    }
}

impl From<Review> for ReviewRecord {
    fn from(review: Review) -> Self {
        let reviewer = review.reviewer.map(|r| ReviewerRecord {
            id: review.reviewer_id.clone(),
            name: r.name,
            avatar: r.avatar_url.map(|url| AvatarRecord { url }),
        });

        Self {
            review_id: review.review_id,
            user_id: Some(review.reviewer_id),
            reviewer,
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at,
        }
    }
}

/// Body of a post-review request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewInput {
    pub rating: u8,
    pub comment: String,
}

/// Aggregate rating fragment returned alongside review mutations
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductRating {
    #[serde(default)]
    pub ratings: Option<f64>,
}

/// Full product record as served by the detail endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetails {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub ratings: Option<f64>,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

/// Product entry as it appears in listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub ratings: Option<f64>,
}

/// One page of the product listing
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductPage {
    pub products: Vec<ProductSummary>,
    pub new_products: Vec<ProductSummary>,
    pub top_rated_products: Vec<ProductSummary>,
    pub total_products: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_listed_review() {
        let json = r#"{
            "review_id": "r1",
            "rating": 4,
            "comment": "solid",
            "reviewer": {"id": "u1", "name": "Ada", "avatar": {"url": "https://cdn/a.png"}}
        }"#;

        let review: Review = serde_json::from_str(json).unwrap();
        assert_eq!(review.review_id, "r1");
        assert_eq!(review.reviewer_id, "u1");
        assert_eq!(review.reviewer_name(), Some("Ada"));
        assert_eq!(
            review.reviewer.unwrap().avatar_url.as_deref(),
            Some("https://cdn/a.png")
        );
    }

    #[test]
    fn test_decode_posted_review() {
        let json = r#"{"review_id": "r2", "user_id": "u9", "rating": 2, "comment": "meh"}"#;

        let review: Review = serde_json::from_str(json).unwrap();
        assert_eq!(review.reviewer_id, "u9");
        assert!(review.reviewer.is_none());
    }

    #[test]
    fn test_decode_review_without_author_fails() {
        let json = r#"{"review_id": "r3", "rating": 5, "comment": ""}"#;
        assert!(serde_json::from_str::<Review>(json).is_err());
    }

    #[test]
    fn test_decode_product_details() {
        let json = r#"{
            "id": "p1",
            "name": "Lamp",
            "price": 19.5,
            "ratings": 3.5,
            "reviews": [{"review_id": "r1", "rating": 3, "comment": "", "reviewer": {"id": "u1", "name": "Ada"}}]
        }"#;

        let product: ProductDetails = serde_json::from_str(json).unwrap();
        assert_eq!(product.ratings, Some(3.5));
        assert_eq!(product.reviews.len(), 1);
        assert_eq!(product.stock, 0);
    }

    #[test]
    fn test_decode_product_page() {
        let json = r#"{"products": [{"id": "p1"}], "totalProducts": 12}"#;

        let page: ProductPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.products.len(), 1);
        assert_eq!(page.total_products, 12);
        assert!(page.top_rated_products.is_empty());
    }
}
