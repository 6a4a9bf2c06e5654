//! Database operations for the imagegen service.
//!
//! Stores one metadata record per generated image in MongoDB.

use crate::error::AppError;
use crate::models::GeneratedImage;
use async_trait::async_trait;
use mongodb::{
    bson::doc, options::IndexOptions, Client as MongoClient, Collection, Database, IndexModel,
};

/// Seam over the document store. The insert assigns the record's timestamp;
/// callers only supply the prompt and the stored image's URL.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn insert(&self, prompt: &str, url: &str) -> Result<GeneratedImage, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct ImageDb {
    client: MongoClient,
    db: Database,
    collection: String,
}

impl ImageDb {
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self, AppError> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self {
            client,
            db,
            collection: collection.to_string(),
        })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        let images = self.images();

        // Index on created_at for gallery-style listings, newest first
        let created_at_index = IndexModel::builder()
            .keys(doc! { "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("created_at_idx".to_string())
                    .build(),
            )
            .build();

        images
            .create_index(created_at_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create created_at index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        Ok(())
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }

    pub fn images(&self) -> Collection<GeneratedImage> {
        self.db.collection(&self.collection)
    }
}

#[async_trait]
impl MetadataStore for ImageDb {
    async fn insert(&self, prompt: &str, url: &str) -> Result<GeneratedImage, AppError> {
        // Timestamp is assigned here, at write time, never by the caller.
        let record = GeneratedImage::new(prompt.to_string(), url.to_string());

        self.images().insert_one(&record, None).await.map_err(|e| {
            tracing::error!("Failed to insert image record: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;

        Ok(record)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }
}
