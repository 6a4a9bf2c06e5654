use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata record written to the document store for each generated image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    #[serde(rename = "_id")]
    pub id: String,
    pub prompt: String,
    pub url: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl GeneratedImage {
    /// Build a record stamped with the current time. Callers never supply the
    /// timestamp; it is assigned at the point of the write.
    pub fn new(prompt: String, url: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            prompt,
            url,
            created_at: Utc::now(),
        }
    }
}
