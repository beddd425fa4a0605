//! Review state for a single product view.
//!
//! [`ReviewSyncStore`] owns the product's review list, the locally mirrored
//! aggregate rating and the two pending flags. Network calls go through a
//! [`ReviewApiClient`]; the store only decides how server responses are
//! folded into local state.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, instrument, warn};

use crate::api::ReviewApiClient;
use crate::config::ReviewsConfig;
use crate::error::{PendingOperation, ReviewSyncError};
use crate::models::{ProductDetails, Review, ReviewInput, MAX_RATING, MIN_RATING};

/// Whether a post created a new review or replaced the caller's existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewChange {
    Created,
    Updated,
}

/// Result of a successful `submit_review`
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewPostOutcome {
    pub change: ReviewChange,
    /// The review as stored locally after the merge
    pub review: Review,
    pub aggregate_rating: Option<f64>,
    /// Confirmation text from the server, if any
    pub message: Option<String>,
    /// Set when the server attributed the review to a reviewer other than
    /// the one that submitted it
    pub reassigned_reviewer: Option<String>,
}

/// Result of a successful `remove_review`
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewDeleteOutcome {
    /// The removed entry; `None` if it had already left the list
    pub removed: Option<Review>,
    pub aggregate_rating: Option<f64>,
    pub message: Option<String>,
}

/// Pending operation flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingFlags {
    pub is_posting: bool,
    pub is_deleting: bool,
}

impl PendingFlags {
    fn get(&self, op: PendingOperation) -> bool {
        match op {
            PendingOperation::Posting => self.is_posting,
            PendingOperation::Deleting => self.is_deleting,
        }
    }

    fn set(&mut self, op: PendingOperation, value: bool) {
        match op {
            PendingOperation::Posting => self.is_posting = value,
            PendingOperation::Deleting => self.is_deleting = value,
        }
    }
}

/// Point-in-time copy of the store, for rendering
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReviewSnapshot {
    pub product_id: String,
    pub reviews: Vec<Review>,
    pub aggregate_rating: Option<f64>,
    pub flags: PendingFlags,
}

impl ReviewSnapshot {
    /// First review written by `reviewer_id`, if any
    pub fn review_by(&self, reviewer_id: &str) -> Option<&Review> {
        self.reviews.iter().find(|r| r.reviewer_id == reviewer_id)
    }
}

/// In-memory review state for one product
pub struct ReviewSyncStore<C> {
    client: C,
    post_failed_message: String,
    delete_failed_message: String,
    state: Mutex<ReviewSnapshot>,
}

impl<C: ReviewApiClient> ReviewSyncStore<C> {
    /// Create an empty store for `product_id`
    pub fn new(client: C, product_id: impl Into<String>) -> Self {
        let defaults = ReviewsConfig::default();
        Self {
            client,
            post_failed_message: defaults.post_failed_message,
            delete_failed_message: defaults.delete_failed_message,
            state: Mutex::new(ReviewSnapshot {
                product_id: product_id.into(),
                ..Default::default()
            }),
        }
    }

    /// Create a store populated from the server's product snapshot
    pub fn from_product(client: C, product: &ProductDetails) -> Self {
        let store = Self::new(client, product.id.clone());
        store.hydrate(product);
        store
    }

    /// Use fallback error messages from configuration
    pub fn with_config(mut self, config: &ReviewsConfig) -> Self {
        self.post_failed_message = config.post_failed_message.clone();
        self.delete_failed_message = config.delete_failed_message.clone();
        self
    }

    /// Replace the review list and rating with a fresh server snapshot.
    ///
    /// Pending flags are left alone so an in-flight operation still resets
    /// its own flag when it settles.
    pub fn hydrate(&self, product: &ProductDetails) {
        let mut reviews: Vec<Review> = Vec::with_capacity(product.reviews.len());
        for review in &product.reviews {
            if reviews.iter().any(|r| r.reviewer_id == review.reviewer_id) {
                warn!(
                    product_id = %product.id,
                    reviewer_id = %review.reviewer_id,
                    "Dropping duplicate review from snapshot"
                );
                continue;
            }
            reviews.push(review.clone());
        }

        let mut state = self.state();
        state.product_id = product.id.clone();
        state.reviews = reviews;
        state.aggregate_rating = product.ratings;

        debug!(
            product_id = %state.product_id,
            reviews = state.reviews.len(),
            "Hydrated review store"
        );
    }

    /// Post the caller's review, creating it or replacing their existing one.
    #[instrument(skip(self, comment), fields(comment_len = comment.len()))]
    pub async fn submit_review(
        &self,
        product_id: &str,
        reviewer_id: &str,
        rating: u8,
        comment: &str,
    ) -> Result<ReviewPostOutcome, ReviewSyncError> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(ReviewSyncError::InvalidRating(rating));
        }

        self.check_product(product_id)?;
        let _pending = self.begin(PendingOperation::Posting)?;

        let input = ReviewInput {
            rating,
            comment: comment.to_string(),
        };

        let response = match self.client.post_review(product_id, &input).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "Posting review failed");
                return Err(ReviewSyncError::ReviewPostFailed(
                    err.message_or(&self.post_failed_message),
                ));
            }
        };

        let reassigned_reviewer = (response.review.reviewer_id != reviewer_id).then(|| {
            warn!(
                expected = %reviewer_id,
                returned = %response.review.reviewer_id,
                "Server returned a review for a different reviewer"
            );
            response.review.reviewer_id.clone()
        });

        let mut state = self.state();
        let (change, review) = merge_review(&mut state.reviews, response.review);
        if let Some(rating) = response.product.and_then(|p| p.ratings) {
            state.aggregate_rating = Some(rating);
        }

        info!(
            review_id = %review.review_id,
            change = ?change,
            aggregate_rating = ?state.aggregate_rating,
            "Review posted"
        );

        Ok(ReviewPostOutcome {
            change,
            review,
            aggregate_rating: state.aggregate_rating,
            message: response.message,
            reassigned_reviewer,
        })
    }

    /// Delete the caller's review of `product_id`.
    ///
    /// The server identifies the review by product and authenticated caller;
    /// `review_id` never leaves this process and only selects which local
    /// entry to drop. This relies on each user having at most one review per
    /// product, so callers must only pass the id of the viewer's own review.
    #[instrument(skip(self))]
    pub async fn remove_review(
        &self,
        product_id: &str,
        review_id: &str,
    ) -> Result<ReviewDeleteOutcome, ReviewSyncError> {
        self.check_product(product_id)?;
        if !self.state().reviews.iter().any(|r| r.review_id == review_id) {
            return Err(ReviewSyncError::ReviewNotFound(review_id.to_string()));
        }

        let _pending = self.begin(PendingOperation::Deleting)?;

        let response = match self.client.delete_review(product_id).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "Deleting review failed");
                return Err(ReviewSyncError::ReviewDeleteFailed(
                    err.message_or(&self.delete_failed_message),
                ));
            }
        };

        let mut state = self.state();
        let removed = remove_review_by_id(&mut state.reviews, review_id);
        if let Some(rating) = response.product.and_then(|p| p.ratings) {
            state.aggregate_rating = Some(rating);
        }

        info!(
            removed = removed.is_some(),
            aggregate_rating = ?state.aggregate_rating,
            "Review deleted"
        );

        Ok(ReviewDeleteOutcome {
            removed,
            aggregate_rating: state.aggregate_rating,
            message: response.message,
        })
    }

    /// The review written by `reviewer_id`, looked up in the current list
    pub fn current_user_review(&self, reviewer_id: &str) -> Option<Review> {
        self.state().review_by(reviewer_id).cloned()
    }

    pub fn snapshot(&self) -> ReviewSnapshot {
        self.state().clone()
    }

    pub fn reviews(&self) -> Vec<Review> {
        self.state().reviews.clone()
    }

    pub fn aggregate_rating(&self) -> Option<f64> {
        self.state().aggregate_rating
    }

    pub fn flags(&self) -> PendingFlags {
        self.state().flags
    }

    pub fn product_id(&self) -> String {
        self.state().product_id.clone()
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn state(&self) -> MutexGuard<'_, ReviewSnapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, op: PendingOperation) -> Result<PendingGuard<'_>, ReviewSyncError> {
        let mut state = self.state();
        if state.flags.get(op) {
            debug!(operation = %op, "Rejecting overlapping review operation");
            return Err(ReviewSyncError::OperationAlreadyInProgress(op));
        }
        state.flags.set(op, true);
        Ok(PendingGuard { state: &self.state, op })
    }

    fn check_product(&self, product_id: &str) -> Result<(), ReviewSyncError> {
        let state = self.state();
        if state.product_id != product_id {
            debug!(
                store_product = %state.product_id,
                requested_product = %product_id,
                "Rejecting review operation for another product"
            );
            return Err(ReviewSyncError::ProductMismatch {
                expected: state.product_id.clone(),
                requested: product_id.to_string(),
            });
        }
        Ok(())
    }
}

/// Clears a pending flag when the operation settles or its future is dropped
struct PendingGuard<'a> {
    state: &'a Mutex<ReviewSnapshot>,
    op: PendingOperation,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.flags.set(self.op, false);
    }
}

/// Fold a server-confirmed review into `reviews`.
///
/// The entry written by the review's reviewer is replaced in place, keeping
/// display data the response left out. Otherwise the review is prepended.
/// Any other entry carrying the same review id is dropped so ids stay unique.
pub fn merge_review(reviews: &mut Vec<Review>, mut review: Review) -> (ReviewChange, Review) {
    let before = reviews.len();
    reviews.retain(|r| r.reviewer_id == review.reviewer_id || r.review_id != review.review_id);
    if reviews.len() != before {
        warn!(
            review_id = %review.review_id,
            "Dropped entry from another reviewer sharing the returned review id"
        );
    }

    let existing = reviews
        .iter()
        .position(|r| r.reviewer_id == review.reviewer_id);

    match existing {
        Some(index) => {
            let previous = &reviews[index];
            if review.reviewer.is_none() {
                review.reviewer = previous.reviewer.clone();
            }
            if review.created_at.is_none() {
                review.created_at = previous.created_at;
            }
            reviews[index] = review.clone();
            (ReviewChange::Updated, review)
        }
        None => {
            reviews.insert(0, review.clone());
            (ReviewChange::Created, review)
        }
    }
}

/// Remove the entry with `review_id`, keeping the others in order
pub fn remove_review_by_id(reviews: &mut Vec<Review>, review_id: &str) -> Option<Review> {
    let index = reviews.iter().position(|r| r.review_id == review_id)?;
    Some(reviews.remove(index))
}
