use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("{0}")]
    GenerationFailure(String),

    #[error("{0}")]
    UploadFailure(String),

    #[error("{0}")]
    PersistenceFailure(String),

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorEnvelope {
            success: bool,
            error: String,
        }

        // Validation failures are the caller's fault and go out as plain text.
        // Everything else is a server-side fault wrapped in the JSON envelope.
        match self {
            AppError::BadRequest(err) => {
                (StatusCode::BAD_REQUEST, err.to_string()).into_response()
            }
            AppError::GenerationFailure(msg)
            | AppError::UploadFailure(msg)
            | AppError::PersistenceFailure(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorEnvelope {
                    success: false,
                    error: msg,
                }),
            )
                .into_response(),
            AppError::DatabaseError(err)
            | AppError::ConfigError(err)
            | AppError::InternalError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorEnvelope {
                    success: false,
                    error: err.to_string(),
                }),
            )
                .into_response(),
        }
    }
}
