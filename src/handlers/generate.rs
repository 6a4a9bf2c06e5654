use crate::dtos::{GenerateRequest, GenerateResponse};
use crate::error::AppError;
use crate::services::providers::GenerationParams;
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

/// CORS preflight for `/generate`: advertise the allowed method and header
/// and let browsers cache the answer for an hour.
pub async fn preflight() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_METHODS, "POST"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
            (header::ACCESS_CONTROL_MAX_AGE, "3600"),
        ],
    )
}

/// `POST /generate`: validate the prompt, generate the image, upload it to
/// object storage, record the metadata, respond.
///
/// Each stage wraps its collaborator's failure into a stage-tagged error; no
/// stage is retried and no side effect happens before validation passes.
pub async fn generate_image(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload.map_err(|e| {
        tracing::debug!(error = %e, "Rejected request body");
        AppError::BadRequest(anyhow::anyhow!("No prompt provided"))
    })?;

    request
        .validate()
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("No prompt provided")))?;

    tracing::info!(prompt_len = request.prompt.len(), "Image generation started");

    // Stage 1: generate. One 3:4 image per prompt, fixed safety settings.
    let image = state
        .provider
        .generate(&request.prompt, &GenerationParams::default())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Image generation failed");
            AppError::GenerationFailure(format!("Error generating image: {}", e))
        })?;

    if image.is_empty() {
        tracing::error!("Provider returned an empty image payload");
        return Err(AppError::GenerationFailure(
            "Error generating image: No images generated".to_string(),
        ));
    }

    // Stage 2: upload under a fresh name; the URL comes back from storage.
    let filename = format!("{}.png", Uuid::new_v4());
    let key = format!("{}/{}", state.config.storage.images_path, filename);

    let url = state
        .storage
        .put(&key, image, "image/png")
        .await
        .map_err(|e| {
            tracing::error!(key = %key, error = %e, "Image upload failed");
            AppError::UploadFailure(format!("Error uploading image to storage: {}", e))
        })?;

    // Stage 3: persist. An upload followed by a failed insert leaves the
    // object orphaned; there is no compensation.
    let record = state
        .store
        .insert(&request.prompt, &url)
        .await
        .map_err(|e| {
            tracing::error!(url = %url, error = %e, "Metadata persistence failed");
            AppError::PersistenceFailure(format!("Error storing image metadata: {}", e))
        })?;

    tracing::info!(
        id = %record.id,
        url = %url,
        "Image generated and stored"
    );

    Ok(Json(GenerateResponse {
        success: true,
        prompt: request.prompt,
        url,
    }))
}
