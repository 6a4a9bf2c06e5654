use async_trait::async_trait;
use imagegen_service::config::{
    CommonConfig, GoogleConfig, ImagegenConfig, ModelConfig, MongoConfig, StorageBackend,
    StorageConfig,
};
use imagegen_service::error::AppError;
use imagegen_service::models::GeneratedImage;
use imagegen_service::services::providers::{GenerationParams, ImageProvider, ProviderError};
use imagegen_service::services::{MetadataStore, Storage, StorageError};
use imagegen_service::startup::{app_router, AppState};
use std::sync::{Arc, Mutex};

/// Twelve bytes of mock image data.
pub const STUB_IMAGE: &[u8] = b"\x89PNG\r\n\x1a\nIEND";

pub const TEST_BUCKET: &str = "bucket";

#[derive(Clone)]
pub enum GenerationOutcome {
    Bytes(Vec<u8>),
    Fail,
}

/// What each stubbed collaborator should do for this test app.
pub struct StubBehavior {
    pub generation: GenerationOutcome,
    pub upload_fails: bool,
    pub insert_fails: bool,
    pub store_healthy: bool,
}

impl Default for StubBehavior {
    fn default() -> Self {
        Self {
            generation: GenerationOutcome::Bytes(STUB_IMAGE.to_vec()),
            upload_fails: false,
            insert_fails: false,
            store_healthy: true,
        }
    }
}

struct StubProvider {
    outcome: GenerationOutcome,
    prompts: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ImageProvider for StubProvider {
    async fn generate(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<Vec<u8>, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.outcome {
            GenerationOutcome::Bytes(bytes) => Ok(bytes.clone()),
            GenerationOutcome::Fail => Err(ProviderError::ApiError(
                "stub generation failure".to_string(),
            )),
        }
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

struct StubStorage {
    fail: bool,
    uploads: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

#[async_trait]
impl Storage for StubStorage {
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        if self.fail {
            return Err(StorageError::Api("stub upload failure".to_string()));
        }
        self.uploads.lock().unwrap().push((key.to_string(), data));
        Ok(format!(
            "https://storage.googleapis.com/{}/{}",
            TEST_BUCKET, key
        ))
    }
}

struct StubStore {
    fail: bool,
    healthy: bool,
    records: Arc<Mutex<Vec<GeneratedImage>>>,
}

#[async_trait]
impl MetadataStore for StubStore {
    async fn insert(&self, prompt: &str, url: &str) -> Result<GeneratedImage, AppError> {
        if self.fail {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "stub insert failure"
            )));
        }
        let record = GeneratedImage::new(prompt.to_string(), url.to_string());
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        if self.healthy {
            Ok(())
        } else {
            Err(AppError::DatabaseError(anyhow::anyhow!(
                "stub store unavailable"
            )))
        }
    }
}

fn test_config() -> ImagegenConfig {
    ImagegenConfig {
        common: CommonConfig { port: 0 },
        google: GoogleConfig {
            api_key: "test-key".to_string(),
        },
        models: ModelConfig {
            image_model: "imagen-3.0-generate-002".to_string(),
        },
        storage: StorageConfig {
            backend: StorageBackend::Local,
            bucket: TEST_BUCKET.to_string(),
            images_path: "generated-images".to_string(),
            gcs_token: None,
            local_path: "target/test-storage".to_string(),
        },
        mongodb: MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "imagegen_test".to_string(),
            collection: "generated-images".to_string(),
        },
    }
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub prompts: Arc<Mutex<Vec<String>>>,
    pub uploads: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    pub records: Arc<Mutex<Vec<GeneratedImage>>>,
}

impl TestApp {
    /// Spawn the real router on a random port with stubbed collaborators.
    pub async fn spawn(behavior: StubBehavior) -> Self {
        let prompts = Arc::new(Mutex::new(Vec::new()));
        let uploads = Arc::new(Mutex::new(Vec::new()));
        let records = Arc::new(Mutex::new(Vec::new()));

        let state = AppState {
            config: test_config(),
            provider: Arc::new(StubProvider {
                outcome: behavior.generation,
                prompts: prompts.clone(),
            }),
            storage: Arc::new(StubStorage {
                fail: behavior.upload_fails,
                uploads: uploads.clone(),
            }),
            store: Arc::new(StubStore {
                fail: behavior.insert_fails,
                healthy: behavior.store_healthy,
                records: records.clone(),
            }),
        };

        let router = app_router(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        TestApp {
            address: format!("http://127.0.0.1:{}", port),
            client: reqwest::Client::new(),
            prompts,
            uploads,
            records,
        }
    }

    pub async fn post_generate(&self, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}/generate", self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }
}
