use sd_core::error::ApiError;
use sd_core::model::{AiConfig, AiConfigPatch, ModelCatalog, NewAiConfig};
use serde_json::json;

use crate::client::ApiClient;
use crate::wire;

impl ApiClient {
    pub async fn list_ai_configs(&self) -> Result<Vec<AiConfig>, ApiError> {
        let body = self.get("/ai-config/", vec![]).await?;
        wire::decode_data(body)
    }

    pub async fn default_ai_config(&self) -> Result<AiConfig, ApiError> {
        let body = self.get("/ai-config/default", vec![]).await?;
        wire::decode_data(body)
    }

    pub async fn ai_config(&self, id: u64) -> Result<AiConfig, ApiError> {
        let body = self.get(&format!("/ai-config/{id}"), vec![]).await?;
        wire::decode_data(body)
    }

    pub async fn create_ai_config(&self, config: &NewAiConfig) -> Result<AiConfig, ApiError> {
        let body = self.post("/ai-config/", json!(config)).await?;
        wire::decode_data(body)
    }

    pub async fn update_ai_config(&self, id: u64, patch: &AiConfigPatch) -> Result<AiConfig, ApiError> {
        let body = self.put(&format!("/ai-config/{id}"), json!(patch)).await?;
        wire::decode_data(body)
    }

    pub async fn delete_ai_config(&self, id: u64) -> Result<(), ApiError> {
        self.delete(&format!("/ai-config/{id}")).await?;
        Ok(())
    }

    /// Available models grouped by provider.
    pub async fn available_models(&self) -> Result<ModelCatalog, ApiError> {
        let body = self.get("/ai-config/models", vec![]).await?;
        wire::decode_data(body)
    }
}
