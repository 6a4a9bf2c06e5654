use crate::config::{ImagegenConfig, StorageBackend};
use crate::error::AppError;
use crate::handlers;
use crate::middleware::cors_middleware;
use crate::services::providers::imagen::{ImagenConfig, ImagenProvider};
use crate::services::providers::ImageProvider;
use crate::services::{GcsAuth, GcsStorage, ImageDb, LocalStorage, MetadataStore, Storage};
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// Shared application state. Collaborator clients are built once at startup
/// and shared read-only across requests.
#[derive(Clone)]
pub struct AppState {
    pub config: ImagegenConfig,
    pub provider: Arc<dyn ImageProvider>,
    pub storage: Arc<dyn Storage>,
    pub store: Arc<dyn MetadataStore>,
}

/// Build the HTTP router. Every response passes through the CORS middleware.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/generate",
            post(handlers::generate_image).options(handlers::preflight),
        )
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .layer(from_fn(cors_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct Application {
    port: u16,
    server: std::pin::Pin<Box<dyn std::future::Future<Output = std::io::Result<()>> + Send>>,
    state: AppState,
}

impl Application {
    pub async fn build(config: ImagegenConfig) -> Result<Self, AppError> {
        let db = ImageDb::connect(
            &config.mongodb.uri,
            &config.mongodb.database,
            &config.mongodb.collection,
        )
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            e
        })?;
        db.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            e
        })?;

        let storage: Arc<dyn Storage> = match config.storage.backend {
            StorageBackend::Gcs => {
                let auth = match config.storage.gcs_token.clone() {
                    Some(token) => GcsAuth::StaticToken(token),
                    None => GcsAuth::MetadataServer,
                };
                Arc::new(GcsStorage::new(config.storage.bucket.clone(), auth))
            }
            StorageBackend::Local => Arc::new(
                LocalStorage::new(&config.storage.local_path)
                    .await
                    .map_err(|e| {
                        tracing::error!(
                            "Failed to initialize local storage at {}: {}",
                            config.storage.local_path,
                            e
                        );
                        AppError::InternalError(anyhow::anyhow!(e.to_string()))
                    })?,
            ),
        };

        let provider: Arc<dyn ImageProvider> = Arc::new(ImagenProvider::new(ImagenConfig {
            api_key: config.google.api_key.clone(),
            model: config.models.image_model.clone(),
        }));

        tracing::info!(
            model = %config.models.image_model,
            bucket = %config.storage.bucket,
            "Initialized Imagen provider and storage"
        );

        let state = AppState {
            config: config.clone(),
            provider,
            storage,
            store: Arc::new(db),
        };

        let app = app_router(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::pin(server.into_future()),
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
