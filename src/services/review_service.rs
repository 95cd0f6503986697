// ==================== REVIEW MODERATION ====================
// Queries the stores, joins reviews with their authors and validates
// request parameters. Handlers in `api::reviews` only shape HTTP responses.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::oid::ObjectId;

use crate::{
    api::metrics,
    models::{DeleteReviewsResponse, LowRating, RatingCount, Review, ReviewResponse, User},
    store::{ReviewStore, StoreError, UserStore},
    utils::AppError,
};

pub const DEFAULT_LOW_RATING_THRESHOLD: i32 = 3;

#[derive(Clone)]
pub struct ReviewService {
    reviews: Arc<dyn ReviewStore>,
    users: Arc<dyn UserStore>,
    low_rating_threshold: i32,
}

impl ReviewService {
    pub fn new(reviews: Arc<dyn ReviewStore>, users: Arc<dyn UserStore>) -> Self {
        Self {
            reviews,
            users,
            low_rating_threshold: DEFAULT_LOW_RATING_THRESHOLD,
        }
    }

    /// Builds a service over a backend that stores both collections
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: ReviewStore + UserStore + 'static,
    {
        Self::new(store.clone(), store)
    }

    pub fn with_low_rating_threshold(mut self, threshold: i32) -> Self {
        self.low_rating_threshold = threshold;
        self
    }

    pub fn reviews(&self) -> &dyn ReviewStore {
        self.reviews.as_ref()
    }

    pub fn users(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    pub async fn list_reviews(&self) -> Result<Vec<ReviewResponse>, AppError> {
        let reviews = self
            .reviews
            .find_all()
            .await
            .map_err(db_fault("Error fetching reviews"))?;

        self.join_all(reviews)
            .await
            .map_err(db_fault("Error fetching reviews"))
    }

    pub async fn delete_review(&self, id: &str) -> Result<(), AppError> {
        let object_id =
            ObjectId::parse_str(id).map_err(|_| AppError::invalid("Invalid review ID"))?;

        let removed = self
            .reviews
            .delete_by_id(&object_id)
            .await
            .map_err(db_fault("Error deleting review"))?;

        if !removed {
            return Err(AppError::not_found("Review not found"));
        }

        metrics::add_reviews_deleted(1);
        log::info!("🗑️  Review {} deleted", id);
        Ok(())
    }

    /// Bulk delete through the store's native multi-delete. Ids that are not
    /// valid ObjectIds are reported back and never abort the batch.
    pub async fn delete_reviews(
        &self,
        ids: Option<Vec<String>>,
    ) -> Result<DeleteReviewsResponse, AppError> {
        let ids = match ids {
            Some(ids) if !ids.is_empty() => ids,
            _ => return Err(AppError::invalid("No review IDs provided")),
        };

        let mut object_ids = Vec::with_capacity(ids.len());
        let mut invalid_ids = Vec::new();
        for id in ids {
            match ObjectId::parse_str(&id) {
                Ok(object_id) => object_ids.push(object_id),
                Err(_) => invalid_ids.push(id),
            }
        }

        let deleted_count = self
            .reviews
            .delete_many(&object_ids)
            .await
            .map_err(db_fault("Error deleting reviews"))?;

        metrics::add_reviews_deleted(deleted_count);
        log::info!(
            "🗑️  Bulk delete: {} of {} reviews removed ({} invalid ids)",
            deleted_count,
            object_ids.len() + invalid_ids.len(),
            invalid_ids.len()
        );

        Ok(DeleteReviewsResponse {
            message: format!("{} reviews deleted successfully", deleted_count),
            deleted_count,
            invalid_ids,
        })
    }

    pub async fn filter_by_username(
        &self,
        username: Option<&str>,
    ) -> Result<Vec<ReviewResponse>, AppError> {
        let pattern = username.map(str::trim).unwrap_or_default();
        if pattern.is_empty() {
            return Err(AppError::invalid("Username query cannot be empty"));
        }

        let users = self
            .users
            .search_by_name(pattern)
            .await
            .map_err(db_fault("Error fetching reviews"))?;
        if users.is_empty() {
            return Err(AppError::not_found("No users found with the provided name"));
        }

        let user_ids: Vec<ObjectId> = users.iter().map(|u| u.id).collect();
        let reviews = self
            .reviews
            .find_by_user_ids(&user_ids)
            .await
            .map_err(db_fault("Error fetching reviews"))?;
        if reviews.is_empty() {
            return Err(AppError::not_found("No reviews found for the provided users"));
        }

        let authors: HashMap<ObjectId, User> = users.into_iter().map(|u| (u.id, u)).collect();
        Ok(join_with(reviews, &authors))
    }

    pub async fn filter_by_date_range(
        &self,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Vec<ReviewResponse>, AppError> {
        let range = DateRange::parse(start, end)?;

        let reviews = self
            .reviews
            .find_by_date_range(range.start, range.end)
            .await
            .map_err(db_fault("Error fetching filtered reviews"))?;

        self.join_all(reviews)
            .await
            .map_err(db_fault("Error fetching filtered reviews"))
    }

    pub async fn rating_aggregates(&self) -> Result<Vec<RatingCount>, AppError> {
        self.reviews
            .aggregate_by_rating()
            .await
            .map_err(db_fault("Error aggregating reviews"))
    }

    pub async fn low_ratings(&self) -> Result<Vec<LowRating>, AppError> {
        let reviews = self
            .reviews
            .find_low_ratings(self.low_rating_threshold)
            .await
            .map_err(db_fault("Error fetching low ratings"))?;

        let authors = self
            .load_authors(&reviews)
            .await
            .map_err(db_fault("Error fetching low ratings"))?;

        Ok(reviews
            .into_iter()
            .filter_map(|review| {
                let rating = review.rating?;
                match authors.get(&review.user_id) {
                    Some(author) => Some(LowRating {
                        username: author.display_name(),
                        rating,
                    }),
                    None => {
                        log::warn!("⚠️  Skipping low rating {}: author missing", review.id);
                        None
                    }
                }
            })
            .collect())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.reviews
            .health_check()
            .await
            .map_err(db_fault("Store unavailable"))
    }

    async fn load_authors(
        &self,
        reviews: &[Review],
    ) -> Result<HashMap<ObjectId, User>, StoreError> {
        let mut ids: Vec<ObjectId> = reviews.iter().map(|r| r.user_id).collect();
        ids.sort();
        ids.dedup();

        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let users = self.users.find_by_ids(&ids).await?;
        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }

    async fn join_all(&self, reviews: Vec<Review>) -> Result<Vec<ReviewResponse>, StoreError> {
        let authors = self.load_authors(&reviews).await?;
        Ok(join_with(reviews, &authors))
    }
}

/// Joins one review with its author, or NotFound when the reference dangles
pub fn join_review(
    review: Review,
    authors: &HashMap<ObjectId, User>,
) -> Result<ReviewResponse, StoreError> {
    match authors.get(&review.user_id) {
        Some(author) => Ok(ReviewResponse::join(review, author)),
        None => Err(StoreError::NotFound(format!(
            "Author {} of review {} not found",
            review.user_id, review.id
        ))),
    }
}

/// Orphaned reviews are logged and left out of listings
fn join_with(reviews: Vec<Review>, authors: &HashMap<ObjectId, User>) -> Vec<ReviewResponse> {
    reviews
        .into_iter()
        .filter_map(|review| match join_review(review, authors) {
            Ok(joined) => Some(joined),
            Err(e) => {
                log::warn!("⚠️  {}", e);
                None
            }
        })
        .collect()
}

/// Keeps the context message for the client and logs the driver detail
fn db_fault(context: &'static str) -> impl FnOnce(StoreError) -> AppError {
    move |err| match err {
        StoreError::Database(detail) => {
            log::error!("❌ {}: {}", context, detail);
            AppError::DatabaseError(context.to_string())
        }
        other => other.into(),
    }
}

// ==================== DATE RANGE ====================

/// Inclusive publish-date window. `end` always sits on 23:59:59.999 UTC so a
/// range ending on a given day covers that whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Accepts `YYYY-MM-DD` or RFC 3339 for either bound
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, AppError> {
        let start = match start.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => parse_instant(s)
                .ok_or_else(|| AppError::invalid(format!("Invalid startDate: {}", s)))?,
            None => return Err(AppError::invalid("startDate is required")),
        };
        let end = match end.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => parse_instant(s)
                .ok_or_else(|| AppError::invalid(format!("Invalid endDate: {}", s)))?,
            None => return Err(AppError::invalid("endDate is required")),
        };

        let end = end_of_day(end.date_naive())
            .ok_or_else(|| AppError::invalid("Invalid endDate"))?;
        if start > end {
            return Err(AppError::invalid("startDate must not be after endDate"));
        }

        Ok(Self { start, end })
    }
}

fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn end_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_milli_opt(23, 59, 59, 999).map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewReview, NewUser};
    use crate::store::InMemoryStore;
    use chrono::TimeZone;

    async fn service_with_data() -> (ReviewService, Arc<InMemoryStore>, User) {
        let store = Arc::new(InMemoryStore::new());
        let user = store
            .insert_user(NewUser {
                firstname: "Katherine".to_string(),
                lastname: "Johnson".to_string(),
                profile_picture: "/img/kj.png".to_string(),
            })
            .await
            .unwrap();
        for rating in [Some(1), Some(3), Some(5), None] {
            store
                .insert_review(NewReview {
                    review_text: Some("text".to_string()),
                    rating,
                    published_date: None,
                    user_id: user.id,
                })
                .await
                .unwrap();
        }
        (ReviewService::from_store(store.clone()), store, user)
    }

    #[test]
    fn test_date_range_widens_end_to_end_of_day() {
        let range = DateRange::parse(Some("2024-01-01"), Some("2024-01-01")).unwrap();
        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(
            range.end,
            Utc.with_ymd_and_hms(2024, 1, 1, 23, 59, 59).unwrap()
                + chrono::Duration::milliseconds(999)
        );
    }

    #[test]
    fn test_date_range_accepts_rfc3339() {
        let range = DateRange::parse(
            Some("2024-03-01T10:30:00Z"),
            Some("2024-03-02T01:00:00+00:00"),
        )
        .unwrap();
        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap());
        assert_eq!(range.end.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
    }

    #[test]
    fn test_date_range_rejects_bad_input() {
        assert!(DateRange::parse(None, Some("2024-01-01")).is_err());
        assert!(DateRange::parse(Some("2024-01-01"), Some("  ")).is_err());
        assert!(DateRange::parse(Some("yesterday"), Some("2024-01-01")).is_err());
        assert!(DateRange::parse(Some("2024-02-01"), Some("2024-01-01")).is_err());
    }

    #[tokio::test]
    async fn test_list_skips_orphaned_reviews() {
        let (service, store, _) = service_with_data().await;
        let orphan = NewReview {
            review_text: None,
            rating: Some(2),
            published_date: None,
            user_id: ObjectId::new(),
        }
        .into_review();
        store.insert_raw_review(orphan).await;

        let reviews = service.list_reviews().await.unwrap();
        assert_eq!(reviews.len(), 4);
        assert!(reviews.iter().all(|r| r.username == "Katherine Johnson"));
    }

    #[tokio::test]
    async fn test_join_review_reports_missing_author() {
        let review = NewReview {
            review_text: None,
            rating: None,
            published_date: None,
            user_id: ObjectId::new(),
        }
        .into_review();
        let result = join_review(review, &HashMap::new());
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_filter_by_username_stages() {
        let (service, _, _) = service_with_data().await;

        assert!(matches!(
            service.filter_by_username(Some("   ")).await,
            Err(AppError::InvalidRequest(_))
        ));
        assert!(matches!(
            service.filter_by_username(None).await,
            Err(AppError::InvalidRequest(_))
        ));
        assert!(matches!(
            service.filter_by_username(Some("nobody")).await,
            Err(AppError::NotFound(_))
        ));

        let found = service.filter_by_username(Some(" johnson kath ")).await.unwrap();
        assert_eq!(found.len(), 4);
    }

    #[tokio::test]
    async fn test_filter_by_username_user_without_reviews() {
        let (service, store, _) = service_with_data().await;
        store
            .insert_user(NewUser {
                firstname: "Quiet".to_string(),
                lastname: "Reader".to_string(),
                profile_picture: String::new(),
            })
            .await
            .unwrap();

        match service.filter_by_username(Some("quiet")).await {
            Err(AppError::NotFound(msg)) => assert!(msg.contains("No reviews")),
            other => panic!("unexpected result: {:?}", other.map(|r| r.len())),
        }
    }

    #[tokio::test]
    async fn test_low_ratings_respects_threshold() {
        let (service, _, _) = service_with_data().await;

        let low = service.low_ratings().await.unwrap();
        let mut ratings: Vec<i32> = low.iter().map(|l| l.rating).collect();
        ratings.sort();
        assert_eq!(ratings, vec![1, 3]);

        let strict = service.with_low_rating_threshold(1).low_ratings().await.unwrap();
        assert_eq!(strict.len(), 1);
        assert_eq!(strict[0].username, "Katherine Johnson");
    }

    #[tokio::test]
    async fn test_delete_reviews_reports_invalid_ids() {
        let (service, store, _) = service_with_data().await;
        let ids: Vec<String> = service
            .list_reviews()
            .await
            .unwrap()
            .into_iter()
            .take(2)
            .map(|r| r.id)
            .collect();

        let mut request = ids.clone();
        request.push("not-an-id".to_string());
        let result = service.delete_reviews(Some(request)).await.unwrap();
        assert_eq!(result.deleted_count, 2);
        assert_eq!(result.invalid_ids, vec!["not-an-id".to_string()]);
        assert_eq!(store.review_count().await, 2);

        assert!(matches!(
            service.delete_reviews(Some(vec![])).await,
            Err(AppError::InvalidRequest(_))
        ));
        assert!(matches!(
            service.delete_reviews(None).await,
            Err(AppError::InvalidRequest(_))
        ));
    }
}
