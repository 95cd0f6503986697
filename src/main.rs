use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use review_moderation::api;
use review_moderation::config::{AppConfig, StoreBackend};
use review_moderation::database::MongoDB;
use review_moderation::middleware::RequestMetrics;
use review_moderation::seeds::demo_reviews_seed::seed_demo_reviews;
use review_moderation::services::ReviewService;
use review_moderation::store::{InMemoryStore, MongoStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

    log::info!("🚀 Starting Review Moderation Service...");

    let service = match config.store_backend {
        StoreBackend::Mongo => {
            log::info!("📊 Database: {}", config.database_url);
            let db = MongoDB::new(&config.database_url, config.database_name.as_deref())
                .await
                .map_err(|e| {
                    log::error!("❌ Failed to connect to MongoDB: {}", e);
                    std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
                })?;
            log::info!("✅ MongoDB connected successfully");
            ReviewService::from_store(Arc::new(MongoStore::new(db)))
        }
        StoreBackend::Memory => {
            log::warn!("⚠️  Using in-memory store, data is lost on restart");
            ReviewService::from_store(Arc::new(InMemoryStore::new()))
        }
    }
    .with_low_rating_threshold(config.low_rating_threshold);

    // 🌱 Seed demo reviews into an empty store
    if config.seed_demo_data {
        match seed_demo_reviews(service.users(), service.reviews()).await {
            Ok(0) => log::info!("🌱 Store already has users, skipping demo seed"),
            Ok(n) => log::info!("🌱 Seeded {} demo reviews", n),
            Err(e) => log::warn!("⚠️  Demo seed failed: {}", e),
        }
    }

    let service_data = web::Data::new(service);
    let bind_address = config.bind_address();
    let cors_origins = config.cors_origins.clone();

    log::info!("🌐 Server starting on {}", bind_address);
    log::info!("📚 Swagger UI available at: http://{}/swagger-ui/", bind_address);
    log::info!("📄 OpenAPI spec at: http://{}/api-docs/openapi.json", bind_address);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = cors_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(service_data.clone())
            .wrap(cors)
            .wrap(RequestMetrics)
            .wrap(Logger::default())
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi))
            .configure(api::configure)
    })
    .bind(bind_address)?
    .run()
    .await
}
