//! Moderation board state: a live feed of every review and a filter pane.
//! Every delete is confirmed first; the feed is re-fetched after any change.

use crate::client::{ClientError, ReviewsClient};
use crate::models::{DeleteReviewsResponse, ReviewResponse, MAX_RATING};

pub const CONFIRM_DELETE_ONE: &str = "Are you sure you want to delete this review?";
pub const CONFIRM_DELETE_ALL: &str = "Are you sure you want to delete all reviews?";
pub const NO_REVIEWS_MESSAGE: &str = "No reviews found";

/// Blocking yes/no prompt shown before destructive actions
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewFilter {
    Username(String),
    DateRange { start: String, end: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterStatus {
    Idle,
    Results,
    NoReviews,
    Error(String),
}

impl FilterStatus {
    /// Text shown in the filter pane, if any
    pub fn message(&self) -> Option<&str> {
        match self {
            FilterStatus::NoReviews => Some(NO_REVIEWS_MESSAGE),
            FilterStatus::Error(msg) => Some(msg),
            FilterStatus::Idle | FilterStatus::Results => None,
        }
    }
}

pub struct AdminBoard<C: Confirm> {
    client: ReviewsClient,
    confirm: C,
    feed: Vec<ReviewResponse>,
    filtered: Vec<ReviewResponse>,
    status: FilterStatus,
}

impl<C: Confirm> AdminBoard<C> {
    pub fn new(client: ReviewsClient, confirm: C) -> Self {
        Self {
            client,
            confirm,
            feed: Vec::new(),
            filtered: Vec::new(),
            status: FilterStatus::Idle,
        }
    }

    /// All reviews, newest first
    pub fn feed(&self) -> &[ReviewResponse] {
        &self.feed
    }

    /// Current filter results, newest first
    pub fn filtered(&self) -> &[ReviewResponse] {
        &self.filtered
    }

    pub fn status(&self) -> &FilterStatus {
        &self.status
    }

    pub async fn refresh_feed(&mut self) -> Result<(), ClientError> {
        let mut reviews = self.client.list_reviews().await?;
        sort_newest_first(&mut reviews);
        self.feed = reviews;
        Ok(())
    }

    /// Returns `Ok(false)` when the moderator declined the prompt
    pub async fn delete_from_feed(&mut self, id: &str) -> Result<bool, ClientError> {
        if !self.confirm.confirm(CONFIRM_DELETE_ONE) {
            log::info!("Deletion canceled");
            return Ok(false);
        }

        self.client.delete_review(id).await?;
        self.feed.retain(|r| r.id != id);
        self.remove_filtered(id);
        self.refresh_after_delete().await;
        Ok(true)
    }

    pub async fn search(&mut self, filter: ReviewFilter) -> &FilterStatus {
        let result = match &filter {
            ReviewFilter::Username(name) => self.client.filter_by_username(name).await,
            ReviewFilter::DateRange { start, end } => {
                self.client.filter_by_date_range(start, end).await
            }
        };

        match result {
            Ok(mut reviews) if !reviews.is_empty() => {
                sort_newest_first(&mut reviews);
                self.filtered = reviews;
                self.status = FilterStatus::Results;
            }
            Ok(_) | Err(ClientError::NotFound(_)) => {
                self.filtered.clear();
                self.status = FilterStatus::NoReviews;
            }
            Err(e) => {
                log::warn!("Filter {:?} failed: {}", filter, e);
                self.status = FilterStatus::Error(e.to_string());
            }
        }

        &self.status
    }

    pub async fn delete_filtered(&mut self, id: &str) -> Result<bool, ClientError> {
        if !self.confirm.confirm(CONFIRM_DELETE_ONE) {
            log::info!("Deletion canceled");
            return Ok(false);
        }

        self.client.delete_review(id).await?;
        self.feed.retain(|r| r.id != id);
        self.remove_filtered(id);
        self.refresh_after_delete().await;
        Ok(true)
    }

    pub fn clear_search(&mut self) {
        self.filtered.clear();
        self.status = FilterStatus::Idle;
    }

    /// Deletes every review in the filter pane with one bulk request.
    /// `Ok(None)` when there was nothing to delete or the prompt was declined.
    pub async fn delete_all_filtered(
        &mut self,
    ) -> Result<Option<DeleteReviewsResponse>, ClientError> {
        if self.filtered.is_empty() {
            return Ok(None);
        }
        if !self.confirm.confirm(CONFIRM_DELETE_ALL) {
            log::info!("Deletion of all reviews canceled");
            return Ok(None);
        }

        let ids: Vec<String> = self.filtered.iter().map(|r| r.id.clone()).collect();
        let result = self.client.delete_reviews(&ids).await?;

        self.feed.retain(|r| !ids.contains(&r.id));
        self.filtered.clear();
        self.status = FilterStatus::NoReviews;
        self.refresh_after_delete().await;
        Ok(Some(result))
    }

    /// The delete already went through; a failed reload only leaves the
    /// locally pruned feed in place.
    async fn refresh_after_delete(&mut self) {
        if let Err(e) = self.refresh_feed().await {
            log::warn!("Feed refresh after delete failed: {}", e);
        }
    }

    fn remove_filtered(&mut self, id: &str) {
        let before = self.filtered.len();
        self.filtered.retain(|r| r.id != id);
        if before > 0 && self.filtered.is_empty() {
            self.status = FilterStatus::NoReviews;
        }
    }
}

fn sort_newest_first(reviews: &mut [ReviewResponse]) {
    reviews.sort_by(|a, b| b.published_date.cmp(&a.published_date));
}

/// Five star glyphs with the first `rating` filled. Out-of-range or missing
/// ratings are clamped to 0..=5.
pub fn render_stars(rating: Option<i32>) -> String {
    let filled = rating.unwrap_or(0).clamp(0, MAX_RATING) as usize;
    let empty = MAX_RATING as usize - filled;
    format!("{}{}", "★".repeat(filled), "☆".repeat(empty))
}

/// Plain-text card used by the CLI listing
pub fn format_review_card(review: &ReviewResponse) -> String {
    let mut card = format!(
        "{}  {}  {}\n  id: {}",
        review.published_date.format("%Y-%m-%d"),
        render_stars(review.rating),
        review.username,
        review.id
    );
    if let Some(text) = review.review_text.as_deref().filter(|t| !t.is_empty()) {
        card.push_str("\n  ");
        card.push_str(text);
    }
    card
}
