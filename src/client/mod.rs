//! HTTP client for the moderation API, used by the admin board and the
//! `review-admin` binary.

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;

use crate::models::{
    DeleteReviewsResponse, ErrorResponse, LowRating, MessageResponse, RatingCount, ReviewResponse,
};

pub const DEFAULT_API_URL: &str = "http://localhost:3001";

#[derive(Debug, Error)]
pub enum ClientError {
    /// 404 from the API; the message is the server's
    #[error("No reviews found")]
    NotFound(String),

    #[error("Error: {message}")]
    Api { status: u16, message: String },

    /// No response was received
    #[error("Network error. Please try again later.")]
    Network(#[source] reqwest::Error),

    #[error("Error: unexpected response ({0})")]
    Decode(String),
}

#[derive(Clone)]
pub struct ReviewsClient {
    http: reqwest::Client,
    base_url: String,
}

impl ReviewsClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// Uses `REVIEWS_API_URL`, falling back to the local default
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("REVIEWS_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn list_reviews(&self) -> Result<Vec<ReviewResponse>, ClientError> {
        let resp = self
            .http
            .get(self.url("/reviews"))
            .send()
            .await
            .map_err(ClientError::Network)?;
        handle(resp).await
    }

    pub async fn delete_review(&self, id: &str) -> Result<MessageResponse, ClientError> {
        let url = self.url(&format!("/reviews/{}", urlencoding::encode(id)));
        let resp = self.http.delete(url).send().await.map_err(ClientError::Network)?;
        handle(resp).await
    }

    pub async fn delete_reviews(
        &self,
        ids: &[String],
    ) -> Result<DeleteReviewsResponse, ClientError> {
        let resp = self
            .http
            .delete(self.url("/reviews/deleteAll"))
            .json(&json!({ "ids": ids }))
            .send()
            .await
            .map_err(ClientError::Network)?;
        handle(resp).await
    }

    pub async fn filter_by_username(
        &self,
        username: &str,
    ) -> Result<Vec<ReviewResponse>, ClientError> {
        let resp = self
            .http
            .get(self.url("/reviews/filter/username"))
            .query(&[("username", username)])
            .send()
            .await
            .map_err(ClientError::Network)?;
        handle(resp).await
    }

    pub async fn filter_by_date_range(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<ReviewResponse>, ClientError> {
        let resp = self
            .http
            .get(self.url("/reviews/filter/dateRange"))
            .query(&[("startDate", start_date), ("endDate", end_date)])
            .send()
            .await
            .map_err(ClientError::Network)?;
        handle(resp).await
    }

    pub async fn rating_aggregates(&self) -> Result<Vec<RatingCount>, ClientError> {
        let resp = self
            .http
            .get(self.url("/review-aggregates"))
            .send()
            .await
            .map_err(ClientError::Network)?;
        handle(resp).await
    }

    pub async fn low_ratings(&self) -> Result<Vec<LowRating>, ClientError> {
        let resp = self
            .http
            .get(self.url("/low-ratings"))
            .send()
            .await
            .map_err(ClientError::Network)?;
        handle(resp).await
    }
}

async fn handle<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return resp
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()));
    }

    let message = match resp.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Unknown error occurred")
            .to_string(),
    };

    if status == StatusCode::NOT_FOUND {
        Err(ClientError::NotFound(message))
    } else {
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}
