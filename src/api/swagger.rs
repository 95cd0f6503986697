use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Review Moderation Service API",
        version = "1.0.0",
        description = "Administrative API for moderating user-submitted reviews.\n\n**Features:**\n- List reviews joined with author name and picture\n- Filter by author name or publish date range\n- Single and bulk hard delete\n- Rating histogram, low-rating insights and a printable report",
        contact(
            name = "Review Moderation Team"
        )
    ),
    paths(
        // Reviews
        crate::api::reviews::get_reviews,
        crate::api::reviews::delete_review,
        crate::api::reviews::delete_reviews,
        crate::api::reviews::filter_by_username,
        crate::api::reviews::filter_by_date_range,

        // Reports
        crate::api::reports::get_review_aggregates,
        crate::api::reports::get_low_ratings,
        crate::api::reports::get_report,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,
    ),
    components(
        schemas(
            crate::models::ReviewResponse,
            crate::models::RatingCount,
            crate::models::LowRating,
            crate::models::DeleteReviewsRequest,
            crate::models::DeleteReviewsResponse,
            crate::models::MessageResponse,
            crate::models::ErrorResponse,
            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,
        )
    ),
    tags(
        (name = "Reviews", description = "Review listing, filtering and deletion."),
        (name = "Reports", description = "Rating aggregates, low-rating insights and the printable report."),
        (name = "Health", description = "Health check and Prometheus counters."),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_review_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/reviews",
            "/reviews/{id}",
            "/reviews/deleteAll",
            "/reviews/filter/username",
            "/reviews/filter/dateRange",
            "/review-aggregates",
            "/low-ratings",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
