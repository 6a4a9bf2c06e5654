use serde::{Deserialize, Serialize};
use validator::Validate;

/// Inbound payload for `POST /generate`.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateRequest {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub prompt: String,
}

/// Success envelope returned once the image is generated, stored and recorded.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub prompt: String,
    pub url: String,
}
