use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::models::{
    DeleteReviewsRequest, DeleteReviewsResponse, ErrorResponse, MessageResponse, ReviewResponse,
};
use crate::services::ReviewService;
use crate::utils::AppError;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UsernameQuery {
    /// Case-insensitive fragment of "first last" or "last first"
    pub username: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DateRangeQuery {
    /// `YYYY-MM-DD` or RFC 3339
    pub start_date: Option<String>,
    /// `YYYY-MM-DD` or RFC 3339; widened to the end of that day
    pub end_date: Option<String>,
}

/// GET /reviews - All reviews joined with author name and picture
#[utoipa::path(
    get,
    path = "/reviews",
    tag = "Reviews",
    responses(
        (status = 200, description = "All reviews", body = Vec<ReviewResponse>),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn get_reviews(service: web::Data<ReviewService>) -> Result<HttpResponse, AppError> {
    let reviews = service.list_reviews().await?;
    log::debug!("📋 GET /reviews - {} reviews", reviews.len());
    Ok(HttpResponse::Ok().json(reviews))
}

/// DELETE /reviews/{id} - Hard delete of one review
#[utoipa::path(
    delete,
    path = "/reviews/{id}",
    tag = "Reviews",
    params(("id" = String, Path, description = "Review ObjectId (hex)")),
    responses(
        (status = 200, description = "Review deleted", body = MessageResponse),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "Review not found", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn delete_review(
    path: web::Path<String>,
    service: web::Data<ReviewService>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("🗑️  DELETE /reviews/{}", id);

    service.delete_review(&id).await?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Review deleted successfully".to_string(),
    }))
}

/// DELETE /reviews/deleteAll - Bulk delete by id list
#[utoipa::path(
    delete,
    path = "/reviews/deleteAll",
    tag = "Reviews",
    request_body = DeleteReviewsRequest,
    responses(
        (status = 200, description = "Reviews deleted", body = DeleteReviewsResponse),
        (status = 400, description = "Missing or empty id list", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn delete_reviews(
    body: web::Json<DeleteReviewsRequest>,
    service: web::Data<ReviewService>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    log::info!(
        "🗑️  DELETE /reviews/deleteAll - {} ids",
        request.ids.as_ref().map(Vec::len).unwrap_or(0)
    );

    let result = service.delete_reviews(request.ids).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// GET /reviews/filter/username?username= - Reviews by author name
#[utoipa::path(
    get,
    path = "/reviews/filter/username",
    tag = "Reviews",
    params(UsernameQuery),
    responses(
        (status = 200, description = "Matching reviews", body = Vec<ReviewResponse>),
        (status = 400, description = "Empty query", body = ErrorResponse),
        (status = 404, description = "No matching user or no reviews", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn filter_by_username(
    query: web::Query<UsernameQuery>,
    service: web::Data<ReviewService>,
) -> Result<HttpResponse, AppError> {
    log::info!("🔍 GET /reviews/filter/username - {:?}", query.username);

    let reviews = service.filter_by_username(query.username.as_deref()).await?;
    Ok(HttpResponse::Ok().json(reviews))
}

/// GET /reviews/filter/dateRange?startDate=&endDate= - Reviews published in an inclusive window
#[utoipa::path(
    get,
    path = "/reviews/filter/dateRange",
    tag = "Reviews",
    params(DateRangeQuery),
    responses(
        (status = 200, description = "Reviews in range", body = Vec<ReviewResponse>),
        (status = 400, description = "Missing, malformed or inverted range", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn filter_by_date_range(
    query: web::Query<DateRangeQuery>,
    service: web::Data<ReviewService>,
) -> Result<HttpResponse, AppError> {
    log::info!(
        "🔍 GET /reviews/filter/dateRange - {:?} .. {:?}",
        query.start_date,
        query.end_date
    );

    let reviews = service
        .filter_by_date_range(query.start_date.as_deref(), query.end_date.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(reviews))
}
