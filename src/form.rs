use crate::api::ReviewApiClient;
use crate::error::ReviewSyncError;
use crate::models::{MAX_RATING, MIN_RATING};
use crate::store::{ReviewPostOutcome, ReviewSnapshot, ReviewSyncStore};

/// Whether the viewer is writing a first review or editing their existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Update,
}

/// Editable review form for the signed-in viewer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewForm {
    pub reviewer_id: String,
    pub mode: FormMode,
    rating: u8,
    pub comment: String,
}

impl ReviewForm {
    /// Derive the form from the current list, pre-filled with the viewer's
    /// review when there is one. Rebuild it after every store change so an
    /// edited review never leaves stale values in the inputs.
    pub fn for_viewer(snapshot: &ReviewSnapshot, reviewer_id: &str) -> Self {
        Self::with_default_rating(snapshot, reviewer_id, MIN_RATING)
    }

    pub fn with_default_rating(
        snapshot: &ReviewSnapshot,
        reviewer_id: &str,
        default_rating: u8,
    ) -> Self {
        match snapshot.review_by(reviewer_id) {
            Some(review) => Self {
                reviewer_id: reviewer_id.to_string(),
                mode: FormMode::Update,
                rating: review.rating.clamp(MIN_RATING, MAX_RATING),
                comment: review.comment.clone(),
            },
            None => Self {
                reviewer_id: reviewer_id.to_string(),
                mode: FormMode::Create,
                rating: default_rating.clamp(MIN_RATING, MAX_RATING),
                comment: String::new(),
            },
        }
    }

    pub fn rating(&self) -> u8 {
        self.rating
    }

    pub fn set_rating(&mut self, rating: u8) {
        self.rating = rating.clamp(MIN_RATING, MAX_RATING);
    }

    pub fn heading(&self) -> &'static str {
        match self.mode {
            FormMode::Create => "Leave a Review",
            FormMode::Update => "Update Your Review",
        }
    }

    pub fn submit_label(&self, is_posting: bool) -> &'static str {
        match (is_posting, self.mode) {
            (true, _) => "Submitting...",
            (false, FormMode::Create) => "Submit Review",
            (false, FormMode::Update) => "Update Review",
        }
    }

    /// Submit the form through the store
    pub async fn submit<C: ReviewApiClient>(
        &self,
        store: &ReviewSyncStore<C>,
        product_id: &str,
    ) -> Result<ReviewPostOutcome, ReviewSyncError> {
        store
            .submit_review(product_id, &self.reviewer_id, self.rating, &self.comment)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{DeleteReviewResponse, PostReviewResponse};
    use crate::error::ApiError;
    use crate::models::{Review, ReviewInput};
    use async_trait::async_trait;

    struct EchoApi;

    #[async_trait]
    impl ReviewApiClient for EchoApi {
        async fn post_review(
            &self,
            _product_id: &str,
            review: &ReviewInput,
        ) -> Result<PostReviewResponse, ApiError> {
            Ok(PostReviewResponse {
                message: None,
                review: Review::new("r1", "u1", review.rating, review.comment.clone()),
                product: None,
            })
        }

        async fn delete_review(&self, _product_id: &str) -> Result<DeleteReviewResponse, ApiError> {
            Ok(DeleteReviewResponse::default())
        }
    }

    fn snapshot(reviews: Vec<Review>) -> ReviewSnapshot {
        ReviewSnapshot {
            product_id: "p1".to_string(),
            reviews,
            ..Default::default()
        }
    }

    #[test]
    fn test_create_mode_defaults() {
        let form = ReviewForm::for_viewer(&snapshot(vec![]), "u1");

        assert_eq!(form.mode, FormMode::Create);
        assert_eq!(form.rating(), 1);
        assert!(form.comment.is_empty());
        assert_eq!(form.heading(), "Leave a Review");
        assert_eq!(form.submit_label(false), "Submit Review");
    }

    #[test]
    fn test_update_mode_prefills() {
        let form = ReviewForm::for_viewer(
            &snapshot(vec![
                Review::new("r2", "u2", 2, "other"),
                Review::new("r1", "u1", 4, "mine"),
            ]),
            "u1",
        );

        assert_eq!(form.mode, FormMode::Update);
        assert_eq!(form.rating(), 4);
        assert_eq!(form.comment, "mine");
        assert_eq!(form.heading(), "Update Your Review");
        assert_eq!(form.submit_label(false), "Update Review");
        assert_eq!(form.submit_label(true), "Submitting...");
    }

    #[test]
    fn test_set_rating_clamps() {
        let mut form = ReviewForm::with_default_rating(&snapshot(vec![]), "u1", 3);
        assert_eq!(form.rating(), 3);

        form.set_rating(0);
        assert_eq!(form.rating(), 1);
        form.set_rating(9);
        assert_eq!(form.rating(), 5);
    }

    #[tokio::test]
    async fn test_submit_switches_form_to_update() {
        let store = ReviewSyncStore::new(EchoApi, "p1");
        let mut form = ReviewForm::for_viewer(&store.snapshot(), "u1");
        form.set_rating(5);
        form.comment = "great".to_string();

        form.submit(&store, "p1").await.unwrap();

        let refreshed = ReviewForm::for_viewer(&store.snapshot(), "u1");
        assert_eq!(refreshed.mode, FormMode::Update);
        assert_eq!(refreshed.rating(), 5);
        assert_eq!(refreshed.comment, "great");
    }
}
