pub mod health;
pub mod metrics;
pub mod reports;
pub mod reviews;
pub mod swagger;

use actix_web::{error, web, HttpResponse};

use crate::models::ErrorResponse;

/// Registers every route. `/reviews/deleteAll` must be registered before
/// `/reviews/{id}` so the literal segment wins.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        // Health check
        .route("/health", web::get().to(health::health_check))
        // Metrics
        .route("/metrics", web::get().to(metrics::get_metrics))
        // Reviews
        .route("/reviews", web::get().to(reviews::get_reviews))
        .route("/reviews/deleteAll", web::delete().to(reviews::delete_reviews))
        .route("/reviews/filter/username", web::get().to(reviews::filter_by_username))
        .route("/reviews/filter/dateRange", web::get().to(reviews::filter_by_date_range))
        .route("/reviews/{id}", web::delete().to(reviews::delete_review))
        // Reports
        .route("/review-aggregates", web::get().to(reports::get_review_aggregates))
        .route("/low-ratings", web::get().to(reports::get_low_ratings))
        .route("/report", web::get().to(reports::get_report));
}

/// Malformed JSON bodies become 400 `{error}` like every other client error
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = format!("Invalid request body: {}", err);
        error::InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(ErrorResponse { error: message }),
        )
        .into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let message = format!("Invalid query string: {}", err);
        error::InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(ErrorResponse { error: message }),
        )
        .into()
    })
}
