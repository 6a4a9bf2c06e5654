//! Image generation provider abstractions and implementations.
//!
//! A trait-based seam over the generative backend so the pipeline can be
//! exercised against a mock in tests and swapped between backends.

pub mod imagen;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("No images generated")]
    NoImages,

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Generation parameters sent with every request.
///
/// The service generates exactly one 3:4 image per prompt, blocking only
/// high-severity content and allowing adult subjects.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub number_of_images: i32,
    pub aspect_ratio: String,
    pub safety_filter_level: String,
    pub person_generation: String,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            number_of_images: 1,
            aspect_ratio: "3:4".to_string(),
            safety_filter_level: "BLOCK_ONLY_HIGH".to_string(),
            person_generation: "ALLOW_ADULT".to_string(),
        }
    }
}

/// Trait for image generation providers (e.g., Imagen).
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generate a single image and return its raw bytes.
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Vec<u8>, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;
}
