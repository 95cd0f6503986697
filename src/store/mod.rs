//! Data access for reviews and their authors.
//!
//! Handlers never talk to a driver directly: they go through [`ReviewStore`]
//! and [`UserStore`], implemented for MongoDB and for an in-memory map used by
//! tests and local demo runs.

pub mod in_memory;
pub mod mongo;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

use crate::models::{NewReview, NewUser, RatingCount, Review, User};

pub use in_memory::InMemoryStore;
pub use mongo::MongoStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Database(String),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Every review, unordered
    async fn find_all(&self) -> Result<Vec<Review>, StoreError>;

    /// Reviews authored by any of `user_ids`
    async fn find_by_user_ids(&self, user_ids: &[ObjectId]) -> Result<Vec<Review>, StoreError>;

    /// Reviews with `start <= publishedDate <= end`
    async fn find_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Review>, StoreError>;

    /// Reviews with a non-null rating `<= threshold`
    async fn find_low_ratings(&self, threshold: i32) -> Result<Vec<Review>, StoreError>;

    /// Review counts grouped by rating, ascending, null bucket first
    async fn aggregate_by_rating(&self) -> Result<Vec<RatingCount>, StoreError>;

    /// Returns `false` when no review had this id
    async fn delete_by_id(&self, id: &ObjectId) -> Result<bool, StoreError>;

    /// Single multi-delete; returns the number of documents removed
    async fn delete_many(&self, ids: &[ObjectId]) -> Result<u64, StoreError>;

    async fn insert_review(&self, review: NewReview) -> Result<Review, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<User>, StoreError>;

    /// Case-insensitive literal substring match on "first last" or "last first"
    async fn search_by_name(&self, pattern: &str) -> Result<Vec<User>, StoreError>;

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;
}

/// Sorts rating buckets ascending with the null bucket first, matching
/// MongoDB's `$sort: { _id: 1 }` ordering.
pub(crate) fn sort_rating_counts(counts: &mut [RatingCount]) {
    counts.sort_by_key(|c| c.star_rating);
}
