use mongodb::bson::{doc, Document};
use mongodb::{Client, Collection, Database, IndexModel};
use std::error::Error;
use std::time::Duration;

pub const REVIEWS_COLLECTION: &str = "reviews";
pub const USERS_COLLECTION: &str = "users";

const DEFAULT_DATABASE: &str = "LMS";

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    /// Connects, verifies the connection and ensures indexes.
    /// `db_name` overrides the database named in the URI path.
    pub async fn new(uri: &str, db_name: Option<&str>) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        // Connection pool
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(Duration::from_secs(300));

        client_options.connect_timeout = Some(Duration::from_secs(5));
        client_options.server_selection_timeout = Some(Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        let db_name = db_name
            .map(str::to_string)
            .unwrap_or_else(|| database_name_from_uri(uri));
        let db = client.database(&db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates the indexes backing the filter endpoints
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        log::info!("🔧 Creating database indexes...");

        let reviews = self.collection::<Document>(REVIEWS_COLLECTION);

        for (field, model) in [
            ("userId", IndexModel::builder().keys(doc! { "userId": 1 }).build()),
            ("publishedDate", IndexModel::builder().keys(doc! { "publishedDate": -1 }).build()),
            ("rating", IndexModel::builder().keys(doc! { "rating": 1 }).build()),
        ] {
            match reviews.create_index(model).await {
                Ok(_) => log::info!("   ✅ Index created: reviews({})", field),
                Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
            }
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    /// Check if the connection is healthy
    pub async fn health_check(&self) -> Result<(), mongodb::error::Error> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

/// "mongodb://host:27017/LMS?retryWrites=true" -> "LMS"
pub fn database_name_from_uri(uri: &str) -> String {
    uri.split("://")
        .nth(1)
        .and_then(|rest| rest.split_once('/'))
        .map(|(_, path)| path.split('?').next().unwrap_or(""))
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_DATABASE)
        .to_string()
}
