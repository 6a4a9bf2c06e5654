//! Imagen provider implementation.
//!
//! Implements image generation through the `:predict` method of Google's
//! Gemini API. Responses carry base64-encoded image bytes.

use super::{GenerationParams, ImageProvider, ProviderError};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Gemini API base URL.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Imagen provider configuration.
#[derive(Debug, Clone)]
pub struct ImagenConfig {
    pub api_key: String,
    pub model: String,
}

/// Imagen image provider.
pub struct ImagenProvider {
    config: ImagenConfig,
    client: Client,
}

impl ImagenProvider {
    pub fn new(config: ImagenConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Build the API URL for the given model and method.
    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            GEMINI_API_BASE, self.config.model, method, self.config.api_key
        )
    }
}

#[async_trait]
impl ImageProvider for ImagenProvider {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Vec<u8>, ProviderError> {
        let request = PredictRequest {
            instances: vec![Instance {
                prompt: prompt.to_string(),
            }],
            parameters: PredictParameters {
                sample_count: params.number_of_images,
                aspect_ratio: params.aspect_ratio.clone(),
                safety_filter_level: params.safety_filter_level.clone(),
                person_generation: params.person_generation.clone(),
            },
        };

        let url = self.api_url("predict");

        tracing::debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            "Sending predict request to Imagen API"
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }

            return Err(ProviderError::ApiError(format!(
                "Imagen API error {}: {}",
                status, error_text
            )));
        }

        let api_response: PredictResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        extract_image_bytes(api_response)
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Imagen API key not configured".to_string(),
            ));
        }

        // Try to list models to verify API key works
        let url = format!("{}/models?key={}", GEMINI_API_BASE, self.config.api_key);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::ApiError(format!(
                "Health check failed: {}",
                response.status()
            )))
        }
    }
}

/// Pull the first prediction's image bytes out of a predict response.
///
/// Empty or filtered predictions are errors; the pipeline never treats a
/// missing image as a success sentinel.
fn extract_image_bytes(response: PredictResponse) -> Result<Vec<u8>, ProviderError> {
    let prediction = response
        .predictions
        .into_iter()
        .next()
        .ok_or(ProviderError::NoImages)?;

    if prediction.rai_filtered_reason.is_some() {
        return Err(ProviderError::ContentFiltered);
    }

    let encoded = prediction
        .bytes_base64_encoded
        .ok_or(ProviderError::NoImages)?;

    let bytes = BASE64
        .decode(encoded.as_bytes())
        .map_err(|e| ProviderError::ApiError(format!("Failed to decode image bytes: {}", e)))?;

    if bytes.is_empty() {
        return Err(ProviderError::NoImages);
    }

    Ok(bytes)
}

// ============================================================================
// Imagen API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<Instance>,
    parameters: PredictParameters,
}

#[derive(Debug, Serialize)]
struct Instance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: i32,
    aspect_ratio: String,
    safety_filter_level: String,
    person_generation: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    #[serde(default)]
    bytes_base64_encoded: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    mime_type: Option<String>,
    #[serde(default)]
    rai_filtered_reason: Option<String>,
}
