use std::sync::Arc;

use actix_web::{dev::ServerHandle, web, App, HttpResponse, HttpServer};
use chrono::{TimeZone, Utc};
use serde_json::json;

use review_moderation::admin::{AdminBoard, FilterStatus, ReviewFilter, CONFIRM_DELETE_ALL};
use review_moderation::api;
use review_moderation::client::{ClientError, ReviewsClient};
use review_moderation::models::{NewReview, NewUser, User};
use review_moderation::services::ReviewService;
use review_moderation::store::{InMemoryStore, ReviewStore, UserStore};

async fn author(store: &InMemoryStore, first: &str, last: &str) -> User {
    store
        .insert_user(NewUser {
            firstname: first.to_string(),
            lastname: last.to_string(),
            profile_picture: format!("https://img.example/{}.png", first.to_lowercase()),
        })
        .await
        .unwrap()
}

async fn review(store: &InMemoryStore, user: &User, rating: i32, day: u32) {
    store
        .insert_review(NewReview {
            review_text: Some(format!("{} stars from {}", rating, user.firstname)),
            rating: Some(rating),
            published_date: Some(Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()),
            user_id: user.id,
        })
        .await
        .unwrap();
}

/// Seeds two authors and starts the API on an ephemeral port
async fn start_server() -> (ReviewsClient, Arc<InMemoryStore>, ServerHandle) {
    let store = Arc::new(InMemoryStore::new());
    let ada = author(&store, "Ada", "Lovelace").await;
    let grace = author(&store, "Grace", "Hopper").await;
    review(&store, &ada, 5, 1).await;
    review(&store, &ada, 2, 10).await;
    review(&store, &grace, 1, 20).await;

    let service = web::Data::new(ReviewService::from_store(store.clone()));
    let server = HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .configure(api::configure)
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    actix_rt::spawn(server);

    (ReviewsClient::new(format!("http://{}", addr)), store, handle)
}

#[actix_web::test]
async fn test_feed_is_newest_first() {
    let (client, _store, handle) = start_server().await;
    let mut board = AdminBoard::new(client, |_: &str| true);

    board.refresh_feed().await.unwrap();
    let days: Vec<_> = board
        .feed()
        .iter()
        .map(|r| r.published_date.format("%d").to_string())
        .collect();
    assert_eq!(days, vec!["20", "10", "01"]);

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_declined_delete_keeps_review() {
    let (client, store, handle) = start_server().await;
    let mut board = AdminBoard::new(client, |_: &str| false);
    board.refresh_feed().await.unwrap();
    let id = board.feed()[0].id.clone();

    assert!(!board.delete_from_feed(&id).await.unwrap());
    assert_eq!(store.review_count().await, 3);

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_search_and_delete_all_filtered() {
    let (client, store, handle) = start_server().await;
    let mut prompts = Vec::new();
    let mut board = AdminBoard::new(client, |prompt: &str| {
        prompts.push(prompt.to_string());
        true
    });

    let status = board.search(ReviewFilter::Username("lovelace".to_string())).await;
    assert_eq!(status, &FilterStatus::Results);
    assert_eq!(board.filtered().len(), 2);

    let result = board.delete_all_filtered().await.unwrap().unwrap();
    assert_eq!(result.deleted_count, 2);
    assert_eq!(result.message, "2 reviews deleted successfully");
    assert!(board.filtered().is_empty());
    assert_eq!(board.status(), &FilterStatus::NoReviews);
    assert_eq!(board.feed().len(), 1);
    assert_eq!(store.review_count().await, 1);

    drop(board);
    assert_eq!(prompts, vec![CONFIRM_DELETE_ALL.to_string()]);

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_search_messages() {
    let (client, _store, handle) = start_server().await;
    let mut board = AdminBoard::new(client.clone(), |_: &str| true);

    let status = board.search(ReviewFilter::Username("nobody".to_string())).await;
    assert_eq!(status.message(), Some("No reviews found"));

    let status = board
        .search(ReviewFilter::DateRange {
            start: "2024-03-15".to_string(),
            end: "2024-03-01".to_string(),
        })
        .await
        .clone();
    assert!(matches!(status, FilterStatus::Error(ref msg) if msg.starts_with("Error: ")));

    let status = board
        .search(ReviewFilter::DateRange {
            start: "2024-03-10".to_string(),
            end: "2024-03-10".to_string(),
        })
        .await;
    assert_eq!(status, &FilterStatus::Results);
    assert_eq!(board.filtered().len(), 1);

    let err = client.delete_review("000000000000000000000000").await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(ref msg) if msg == "Review not found"));

    handle.stop(true).await;
}

#[actix_web::test]
async fn test_report_inputs() {
    let (client, _store, handle) = start_server().await;

    let counts = client.rating_aggregates().await.unwrap();
    let stars: Vec<_> = counts.iter().map(|c| c.star_rating).collect();
    assert_eq!(stars, vec![Some(1), Some(2), Some(5)]);

    let low = client.low_ratings().await.unwrap();
    assert_eq!(low.len(), 2);
    assert!(low.iter().all(|l| l.rating <= 3));

    handle.stop(true).await;
}

/// Deletes succeed but every listing fails with a 500
async fn start_flaky_listing_server() -> (ReviewsClient, ServerHandle) {
    let server = HttpServer::new(|| {
        App::new()
            .route(
                "/reviews",
                web::get().to(|| async {
                    HttpResponse::InternalServerError()
                        .json(json!({ "error": "Error fetching reviews" }))
                }),
            )
            .route(
                "/reviews/{id}",
                web::delete().to(|| async {
                    HttpResponse::Ok().json(json!({ "message": "Review deleted successfully" }))
                }),
            )
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    actix_rt::spawn(server);

    (ReviewsClient::new(format!("http://{}", addr)), handle)
}

#[actix_web::test]
async fn test_delete_succeeds_when_refresh_fails() {
    let (client, handle) = start_flaky_listing_server().await;
    let mut board = AdminBoard::new(client, |_: &str| true);

    assert!(board.refresh_feed().await.is_err());
    assert!(board.delete_from_feed("65f000000000000000000001").await.unwrap());
    assert!(board.delete_filtered("65f000000000000000000002").await.unwrap());

    handle.stop(true).await;
}
