use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use mongodb::Collection;

use super::{sort_rating_counts, ReviewStore, StoreError, UserStore};
use crate::database::{MongoDB, REVIEWS_COLLECTION, USERS_COLLECTION};
use crate::models::{
    from_chrono, rating_from_f64, rating_from_i64, NewReview, NewUser, RatingCount, Review, User,
};

/// MongoDB-backed review and user store
#[derive(Clone)]
pub struct MongoStore {
    db: MongoDB,
}

impl MongoStore {
    pub fn new(db: MongoDB) -> Self {
        Self { db }
    }

    fn reviews(&self) -> Collection<Review> {
        self.db.collection(REVIEWS_COLLECTION)
    }

    fn users(&self) -> Collection<User> {
        self.db.collection(USERS_COLLECTION)
    }

    async fn find_reviews(&self, filter: Document) -> Result<Vec<Review>, StoreError> {
        let cursor = self.reviews().find(filter).await?;
        Ok(cursor.try_collect().await?)
    }
}

#[async_trait]
impl ReviewStore for MongoStore {
    async fn find_all(&self) -> Result<Vec<Review>, StoreError> {
        self.find_reviews(doc! {}).await
    }

    async fn find_by_user_ids(&self, user_ids: &[ObjectId]) -> Result<Vec<Review>, StoreError> {
        self.find_reviews(doc! { "userId": { "$in": user_ids.to_vec() } })
            .await
    }

    async fn find_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Review>, StoreError> {
        self.find_reviews(doc! {
            "publishedDate": { "$gte": from_chrono(start), "$lte": from_chrono(end) }
        })
        .await
    }

    async fn find_low_ratings(&self, threshold: i32) -> Result<Vec<Review>, StoreError> {
        // `$lte` never matches null or missing ratings
        self.find_reviews(doc! { "rating": { "$lte": threshold } })
            .await
    }

    async fn aggregate_by_rating(&self) -> Result<Vec<RatingCount>, StoreError> {
        let pipeline = vec![
            doc! { "$group": { "_id": "$rating", "count": { "$sum": 1 } } },
            doc! { "$sort": { "_id": 1 } },
        ];

        let mut cursor = self
            .db
            .collection::<Document>(REVIEWS_COLLECTION)
            .aggregate(pipeline)
            .await?;

        // int and double ratings group separately in MongoDB; merge them here
        let mut buckets: BTreeMap<Option<i32>, u64> = BTreeMap::new();
        while let Some(group) = cursor.try_next().await? {
            let rating = rating_from_bson(group.get("_id"));
            let count = match group.get("count") {
                Some(Bson::Int32(n)) => *n as u64,
                Some(Bson::Int64(n)) => *n as u64,
                other => {
                    return Err(StoreError::Database(format!(
                        "Unexpected count in rating aggregation: {:?}",
                        other
                    )))
                }
            };
            *buckets.entry(rating).or_insert(0) += count;
        }

        let mut counts: Vec<RatingCount> = buckets
            .into_iter()
            .map(|(star_rating, count)| RatingCount { star_rating, count })
            .collect();
        sort_rating_counts(&mut counts);
        Ok(counts)
    }

    async fn delete_by_id(&self, id: &ObjectId) -> Result<bool, StoreError> {
        let result = self.reviews().delete_one(doc! { "_id": *id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_many(&self, ids: &[ObjectId]) -> Result<u64, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = self
            .reviews()
            .delete_many(doc! { "_id": { "$in": ids.to_vec() } })
            .await?;
        Ok(result.deleted_count)
    }

    async fn insert_review(&self, review: NewReview) -> Result<Review, StoreError> {
        review.validate().map_err(StoreError::Validation)?;
        let review = review.into_review();
        self.reviews().insert_one(&review).await?;
        Ok(review)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(self.db.health_check().await?)
    }
}

#[async_trait]
impl UserStore for MongoStore {
    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<User>, StoreError> {
        let cursor = self
            .users()
            .find(doc! { "_id": { "$in": ids.to_vec() } })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn search_by_name(&self, pattern: &str) -> Result<Vec<User>, StoreError> {
        let regex = escape_regex(pattern);
        let filter = doc! {
            "$or": [
                { "$expr": { "$regexMatch": {
                    "input": { "$concat": ["$firstname", " ", "$lastname"] },
                    "regex": regex.as_str(),
                    "options": "i"
                } } },
                { "$expr": { "$regexMatch": {
                    "input": { "$concat": ["$lastname", " ", "$firstname"] },
                    "regex": regex.as_str(),
                    "options": "i"
                } } }
            ]
        };

        let cursor = self.users().find(filter).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let user = user.into_user();
        self.users().insert_one(&user).await?;
        Ok(user)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.users().count_documents(doc! {}).await?)
    }
}

fn rating_from_bson(value: Option<&Bson>) -> Option<i32> {
    match value {
        Some(Bson::Int32(n)) => Some(*n),
        Some(Bson::Int64(n)) => rating_from_i64(*n),
        Some(Bson::Double(f)) => rating_from_f64(*f),
        _ => None,
    }
}

/// Escapes PCRE metacharacters so a name query matches literally
fn escape_regex(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(
            c,
            '\\' | '^' | '$' | '.' | '|' | '?' | '*' | '+' | '(' | ')' | '[' | ']' | '{' | '}'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
