use actix_web::{web, HttpResponse};

use crate::models::{ErrorResponse, LowRating, RatingCount};
use crate::report::{render_html, ExportOptions, ReviewReport};
use crate::services::ReviewService;
use crate::utils::AppError;

/// GET /review-aggregates - Review count per star rating, ascending
#[utoipa::path(
    get,
    path = "/review-aggregates",
    tag = "Reports",
    responses(
        (status = 200, description = "Rating histogram", body = Vec<RatingCount>),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn get_review_aggregates(
    service: web::Data<ReviewService>,
) -> Result<HttpResponse, AppError> {
    let aggregates = service.rating_aggregates().await?;
    Ok(HttpResponse::Ok().json(aggregates))
}

/// GET /low-ratings - Author and rating of every review rated 3 or below
#[utoipa::path(
    get,
    path = "/low-ratings",
    tag = "Reports",
    responses(
        (status = 200, description = "Low ratings", body = Vec<LowRating>),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn get_low_ratings(service: web::Data<ReviewService>) -> Result<HttpResponse, AppError> {
    let low_ratings = service.low_ratings().await?;
    Ok(HttpResponse::Ok().json(low_ratings))
}

/// GET /report - Printable HTML report
#[utoipa::path(
    get,
    path = "/report",
    tag = "Reports",
    responses(
        (status = 200, description = "Paginated HTML report", body = String, content_type = "text/html"),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn get_report(service: web::Data<ReviewService>) -> Result<HttpResponse, AppError> {
    let (aggregates, low_ratings) =
        futures::try_join!(service.rating_aggregates(), service.low_ratings())?;

    let report = ReviewReport::build(aggregates, &low_ratings);
    log::info!(
        "📊 GET /report - {} reviews, {} low ratings",
        report.total,
        low_ratings.len()
    );

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(render_html(&report, &ExportOptions::default())))
}
