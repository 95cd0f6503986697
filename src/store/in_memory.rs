use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use super::{sort_rating_counts, ReviewStore, StoreError, UserStore};
use crate::models::{from_chrono, NewReview, NewUser, RatingCount, Review, User};

/// Map-backed store. Reviews keep insertion order so listings are stable.
#[derive(Default)]
pub struct InMemoryStore {
    reviews: RwLock<Vec<Review>>,
    users: RwLock<HashMap<ObjectId, User>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a review without validation, for fixtures that need legacy
    /// data such as out-of-range ratings or dangling user references.
    pub async fn insert_raw_review(&self, review: Review) {
        self.reviews.write().await.push(review);
    }

    pub async fn review_count(&self) -> usize {
        self.reviews.read().await.len()
    }
}

#[async_trait]
impl ReviewStore for InMemoryStore {
    async fn find_all(&self) -> Result<Vec<Review>, StoreError> {
        Ok(self.reviews.read().await.clone())
    }

    async fn find_by_user_ids(&self, user_ids: &[ObjectId]) -> Result<Vec<Review>, StoreError> {
        Ok(self
            .reviews
            .read()
            .await
            .iter()
            .filter(|r| user_ids.contains(&r.user_id))
            .cloned()
            .collect())
    }

    async fn find_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Review>, StoreError> {
        let (start, end) = (from_chrono(start), from_chrono(end));
        Ok(self
            .reviews
            .read()
            .await
            .iter()
            .filter(|r| r.published_date >= start && r.published_date <= end)
            .cloned()
            .collect())
    }

    async fn find_low_ratings(&self, threshold: i32) -> Result<Vec<Review>, StoreError> {
        Ok(self
            .reviews
            .read()
            .await
            .iter()
            .filter(|r| matches!(r.rating, Some(rating) if rating <= threshold))
            .cloned()
            .collect())
    }

    async fn aggregate_by_rating(&self) -> Result<Vec<RatingCount>, StoreError> {
        let mut buckets: BTreeMap<Option<i32>, u64> = BTreeMap::new();
        for review in self.reviews.read().await.iter() {
            *buckets.entry(review.rating).or_insert(0) += 1;
        }

        let mut counts: Vec<RatingCount> = buckets
            .into_iter()
            .map(|(star_rating, count)| RatingCount { star_rating, count })
            .collect();
        sort_rating_counts(&mut counts);
        Ok(counts)
    }

    async fn delete_by_id(&self, id: &ObjectId) -> Result<bool, StoreError> {
        let mut reviews = self.reviews.write().await;
        let before = reviews.len();
        reviews.retain(|r| &r.id != id);
        Ok(reviews.len() < before)
    }

    async fn delete_many(&self, ids: &[ObjectId]) -> Result<u64, StoreError> {
        let mut reviews = self.reviews.write().await;
        let before = reviews.len();
        reviews.retain(|r| !ids.contains(&r.id));
        Ok((before - reviews.len()) as u64)
    }

    async fn insert_review(&self, review: NewReview) -> Result<Review, StoreError> {
        review.validate().map_err(StoreError::Validation)?;
        let review = review.into_review();
        self.reviews.write().await.push(review.clone());
        Ok(review)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn search_by_name(&self, pattern: &str) -> Result<Vec<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .filter(|u| u.matches_name(pattern))
            .cloned()
            .collect())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let user = user.into_user();
        self.users.write().await.insert(user.id, user.clone());
        Ok(user)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.users.read().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    async fn seed_user(store: &InMemoryStore, first: &str, last: &str) -> User {
        store
            .insert_user(NewUser {
                firstname: first.to_string(),
                lastname: last.to_string(),
                profile_picture: format!("/img/{}.png", first.to_lowercase()),
            })
            .await
            .unwrap()
    }

    async fn seed_review(
        store: &InMemoryStore,
        user: &User,
        rating: Option<i32>,
        at: DateTime<Utc>,
    ) -> Review {
        store
            .insert_review(NewReview {
                review_text: Some("text".to_string()),
                rating,
                published_date: Some(at),
                user_id: user.id,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_aggregate_sorted_with_null_first() {
        let store = InMemoryStore::new();
        let user = seed_user(&store, "Alan", "Turing").await;
        let now = Utc::now();
        for rating in [Some(5), Some(2), None, Some(5), Some(1)] {
            seed_review(&store, &user, rating, now).await;
        }

        let counts = store.aggregate_by_rating().await.unwrap();
        let ratings: Vec<_> = counts.iter().map(|c| c.star_rating).collect();
        assert_eq!(ratings, vec![None, Some(1), Some(2), Some(5)]);
        assert_eq!(counts.iter().map(|c| c.count).sum::<u64>(), 5);
        assert_eq!(counts[3].count, 2);
    }

    #[tokio::test]
    async fn test_low_ratings_skip_null() {
        let store = InMemoryStore::new();
        let user = seed_user(&store, "Alan", "Turing").await;
        let now = Utc::now();
        for rating in [Some(3), Some(4), None, Some(1)] {
            seed_review(&store, &user, rating, now).await;
        }

        let low = store.find_low_ratings(3).await.unwrap();
        assert_eq!(low.len(), 2);
        assert!(low.iter().all(|r| r.rating.unwrap() <= 3));
    }

    #[tokio::test]
    async fn test_date_range_is_inclusive() {
        let store = InMemoryStore::new();
        let user = seed_user(&store, "Alan", "Turing").await;
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        seed_review(&store, &user, Some(4), start).await;
        seed_review(&store, &user, Some(4), end).await;
        seed_review(&store, &user, Some(4), end + chrono::Duration::milliseconds(1)).await;

        let found = store.find_by_date_range(start, end).await.unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_many_counts_only_removed() {
        let store = InMemoryStore::new();
        let user = seed_user(&store, "Alan", "Turing").await;
        let a = seed_review(&store, &user, Some(1), Utc::now()).await;
        let b = seed_review(&store, &user, Some(2), Utc::now()).await;

        assert!(store.delete_by_id(&a.id).await.unwrap());
        assert!(!store.delete_by_id(&a.id).await.unwrap());

        let removed = store.delete_many(&[a.id, b.id]).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.review_count().await, 0);
    }

    #[tokio::test]
    async fn test_search_by_name_and_insert_validation() {
        let store = InMemoryStore::new();
        let user = seed_user(&store, "Barbara", "Liskov").await;
        seed_user(&store, "Edsger", "Dijkstra").await;

        let found = store.search_by_name("liskov bar").await.unwrap();
        assert_eq!(found, vec![user.clone()]);
        assert_eq!(store.count().await.unwrap(), 2);

        let err = store
            .insert_review(NewReview {
                review_text: None,
                rating: Some(9),
                published_date: None,
                user_id: user.id,
            })
            .await;
        assert!(matches!(err, Err(StoreError::Validation(_))));
    }
}
