//! Mock provider implementation for testing.

use super::{GenerationParams, ImageProvider, ProviderError};
use async_trait::async_trait;

/// PNG signature followed by padding, so mock output looks like image bytes.
const MOCK_IMAGE: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x00";

/// Mock image provider for testing.
pub struct MockImageProvider {
    enabled: bool,
}

impl MockImageProvider {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl ImageProvider for MockImageProvider {
    async fn generate(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<Vec<u8>, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock image provider not enabled".to_string(),
            ));
        }

        // Simulate some processing
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        tracing::debug!(prompt_len = prompt.len(), "Mock image generated");
        Ok(MOCK_IMAGE.to_vec())
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.enabled {
            Ok(())
        } else {
            Err(ProviderError::NotConfigured(
                "Mock image provider not enabled".to_string(),
            ))
        }
    }
}
