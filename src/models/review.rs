use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Deserializer, Serialize};

use super::user::User;

/// Maximum length of `reviewText`, enforced on every write path
pub const MAX_REVIEW_TEXT_LEN: usize = 500;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// Review record (stored in MongoDB collection `reviews`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    #[serde(rename = "reviewText", default)]
    pub review_text: Option<String>,

    /// Not range-checked on read: legacy documents may hold anything
    #[serde(default, deserialize_with = "deserialize_rating")]
    pub rating: Option<i32>,

    #[serde(rename = "publishedDate")]
    pub published_date: bson::DateTime,

    /// Author reference (`users._id`)
    #[serde(rename = "userId")]
    pub user_id: ObjectId,
}

impl Review {
    pub fn published_at(&self) -> DateTime<Utc> {
        to_chrono(self.published_date)
    }
}

/// Input for creating a review. Only the demo seeder and tests write reviews;
/// the real submission path lives outside this service.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub review_text: Option<String>,
    pub rating: Option<i32>,
    /// Defaults to the insertion time
    pub published_date: Option<DateTime<Utc>>,
    pub user_id: ObjectId,
}

impl NewReview {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(text) = &self.review_text {
            if text.chars().count() > MAX_REVIEW_TEXT_LEN {
                return Err(format!(
                    "Review text cannot exceed {} characters",
                    MAX_REVIEW_TEXT_LEN
                ));
            }
        }

        if let Some(rating) = self.rating {
            if !(MIN_RATING..=MAX_RATING).contains(&rating) {
                return Err(format!(
                    "Rating must be between {} and {}, got {}",
                    MIN_RATING, MAX_RATING, rating
                ));
            }
        }

        Ok(())
    }

    /// Assigns a fresh id and resolves the default publish date
    pub fn into_review(self) -> Review {
        let published = self.published_date.unwrap_or_else(Utc::now);
        Review {
            id: ObjectId::new(),
            review_text: self.review_text,
            rating: self.rating,
            published_date: from_chrono(published),
            user_id: self.user_id,
        }
    }
}

// ==================== RESPONSE MODELS ====================

/// Review joined with its author's display fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: String,
    pub review_text: Option<String>,
    pub rating: Option<i32>,
    #[schema(value_type = String, format = DateTime)]
    pub published_date: DateTime<Utc>,
    /// "{firstname} {lastname}"
    pub username: String,
    pub profile_picture: String,
}

impl ReviewResponse {
    pub fn join(review: Review, author: &User) -> Self {
        let published_date = review.published_at();
        Self {
            id: review.id.to_hex(),
            review_text: review.review_text,
            rating: review.rating,
            published_date,
            username: author.display_name(),
            profile_picture: author.profile_picture.clone(),
        }
    }
}

/// One bucket of the rating histogram. `starRating` is null for reviews without a rating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingCount {
    pub star_rating: Option<i32>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LowRating {
    pub username: String,
    pub rating: i32,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct DeleteReviewsRequest {
    pub ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReviewsResponse {
    pub message: String,
    pub deleted_count: u64,
    /// Ids that were not valid ObjectIds and were skipped
    #[serde(default)]
    pub invalid_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

// ==================== HELPERS ====================

pub fn to_chrono(date: bson::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(date.timestamp_millis()).unwrap_or_default()
}

pub fn from_chrono(date: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(date.timestamp_millis())
}

/// Ratings written by other clients may arrive as int32, int64 or double
fn deserialize_rating<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Number>::deserialize(deserializer)? {
        Some(Number::Int(n)) => rating_from_i64(n),
        Some(Number::Float(f)) => rating_from_f64(f),
        None => None,
    })
}

/// Stored int64 rating as i32; values outside i32 are treated as unrated
pub fn rating_from_i64(n: i64) -> Option<i32> {
    match i32::try_from(n) {
        Ok(rating) => Some(rating),
        Err(_) => {
            log::warn!("⚠️  Rating {} does not fit in i32, treating as unrated", n);
            None
        }
    }
}

/// Stored double rating rounded to the nearest integer (2.6 and 3.4 both read as 3).
/// NaN, infinities and values outside i32 are treated as unrated.
pub fn rating_from_f64(f: f64) -> Option<i32> {
    let rounded = f.round();
    if rounded.is_finite() && rounded >= i32::MIN as f64 && rounded <= i32::MAX as f64 {
        Some(rounded as i32)
    } else {
        log::warn!("⚠️  Rating {} is not a representable integer, treating as unrated", f);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_review(text: Option<&str>, rating: Option<i32>) -> NewReview {
        NewReview {
            review_text: text.map(str::to_string),
            rating,
            published_date: None,
            user_id: ObjectId::new(),
        }
    }

    #[test]
    fn test_validate_accepts_limits() {
        let text = "a".repeat(MAX_REVIEW_TEXT_LEN);
        assert!(new_review(Some(&text), Some(5)).validate().is_ok());
        assert!(new_review(None, None).validate().is_ok());
        assert!(new_review(None, Some(1)).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_long_text_and_bad_rating() {
        let text = "a".repeat(MAX_REVIEW_TEXT_LEN + 1);
        assert!(new_review(Some(&text), Some(3)).validate().is_err());
        assert!(new_review(None, Some(0)).validate().is_err());
        assert!(new_review(None, Some(6)).validate().is_err());
    }

    #[test]
    fn test_join_builds_username() {
        let user = User {
            id: ObjectId::new(),
            firstname: "Ada".to_string(),
            lastname: "Lovelace".to_string(),
            profile_picture: "/img/ada.png".to_string(),
        };
        let review = NewReview {
            review_text: Some("Great course".to_string()),
            rating: Some(4),
            published_date: None,
            user_id: user.id,
        }
        .into_review();
        let id = review.id.to_hex();

        let joined = ReviewResponse::join(review, &user);
        assert_eq!(joined.id, id);
        assert_eq!(joined.username, "Ada Lovelace");
        assert_eq!(joined.profile_picture, "/img/ada.png");

        let json = serde_json::to_value(&joined).unwrap();
        assert!(json.get("reviewText").is_some());
        assert!(json.get("publishedDate").is_some());
        assert!(json.get("profilePicture").is_some());
    }

    #[test]
    fn test_rating_tolerates_double() {
        let doc = bson::doc! {
            "_id": ObjectId::new(),
            "rating": 4.0,
            "publishedDate": bson::DateTime::now(),
            "userId": ObjectId::new(),
        };
        let review: Review = bson::from_document(doc).unwrap();
        assert_eq!(review.rating, Some(4));
        assert_eq!(review.review_text, None);
    }

    #[test]
    fn test_rating_outside_i32_is_unrated() {
        let doc = bson::doc! {
            "_id": ObjectId::new(),
            "rating": 5_000_000_000_i64,
            "publishedDate": bson::DateTime::now(),
            "userId": ObjectId::new(),
        };
        let review: Review = bson::from_document(doc).unwrap();
        assert_eq!(review.rating, None);

        assert_eq!(rating_from_i64(7), Some(7));
        assert_eq!(rating_from_f64(2.6), Some(3));
        assert_eq!(rating_from_f64(3.4), Some(3));
        assert_eq!(rating_from_f64(f64::NAN), None);
        assert_eq!(rating_from_f64(1e12), None);
    }
}
