use sd_core::error::SdError;
use sd_core::model::{AiConfig, AiConfigPatch, ModelCatalog, NewAiConfig};
use sd_core::notify::Notice;

use super::{ChatState, ChatStore};
use crate::report;

/// Keep at most one config flagged as default.
fn enforce_single_default(state: &mut ChatState, default_id: u64) {
    for config in &mut state.ai_configs {
        if config.id != default_id {
            config.is_default = false;
        }
    }
}

fn upsert(state: &mut ChatState, config: AiConfig) {
    if config.is_default {
        enforce_single_default(state, config.id);
    }
    match state.ai_configs.iter_mut().find(|c| c.id == config.id) {
        Some(slot) => *slot = config,
        None => state.ai_configs.push(config),
    }
}

impl ChatStore {
    /// Load all configs; picks the default one when nothing is chosen yet.
    pub async fn load_ai_configs(&self) -> Result<Vec<AiConfig>, SdError> {
        let configs = match self.inner.api.list_ai_configs().await {
            Ok(configs) => configs,
            Err(e) => return Err(report(self.notifier(), "load AI configs", e)),
        };
        tracing::debug!(count = configs.len(), "AI configs loaded");

        let mut shared = self.shared();
        shared.state.ai_configs = configs.clone();
        if shared.state.current_config_id.is_none() {
            shared.state.current_config_id = configs.iter().find(|c| c.is_default).map(|c| c.id);
        }
        Ok(configs)
    }

    /// Choose the config for the next chat turn; `None` means the server
    /// default.
    pub fn set_current_config(&self, config_id: Option<u64>) {
        self.shared().state.current_config_id = config_id;
    }

    pub fn current_config(&self) -> Option<AiConfig> {
        self.shared().state.current_config().cloned()
    }

    pub fn ai_configs(&self) -> Vec<AiConfig> {
        self.shared().state.ai_configs.clone()
    }

    pub async fn load_default_ai_config(&self) -> Result<AiConfig, SdError> {
        let config = match self.inner.api.default_ai_config().await {
            Ok(config) => config,
            Err(e) => return Err(report(self.notifier(), "load the default AI config", e)),
        };

        let mut shared = self.shared();
        upsert(&mut shared.state, config.clone());
        if shared.state.current_config_id.is_none() {
            shared.state.current_config_id = Some(config.id);
        }
        Ok(config)
    }

    pub async fn create_ai_config(&self, new: NewAiConfig) -> Result<AiConfig, SdError> {
        let config = match self.inner.api.create_ai_config(&new).await {
            Ok(config) => config,
            Err(e) => return Err(report(self.notifier(), "create AI config", e)),
        };
        tracing::info!(config_id = config.id, %config, "AI config created");

        upsert(&mut self.shared().state, config.clone());
        self.notifier().notify(Notice::success("AI config created"));
        Ok(config)
    }

    pub async fn update_ai_config(&self, id: u64, patch: AiConfigPatch) -> Result<AiConfig, SdError> {
        let config = match self.inner.api.update_ai_config(id, &patch).await {
            Ok(config) => config,
            Err(e) => return Err(report(self.notifier(), "update AI config", e)),
        };

        upsert(&mut self.shared().state, config.clone());
        self.notifier().notify(Notice::success("AI config updated"));
        Ok(config)
    }

    pub async fn delete_ai_config(&self, id: u64) -> Result<(), SdError> {
        if let Err(e) = self.inner.api.delete_ai_config(id).await {
            return Err(report(self.notifier(), "delete AI config", e));
        }

        {
            let mut shared = self.shared();
            shared.state.ai_configs.retain(|c| c.id != id);
            if shared.state.current_config_id == Some(id) {
                shared.state.current_config_id = None;
            }
        }
        self.notifier().notify(Notice::success("AI config deleted"));
        Ok(())
    }

    /// Fetch the catalogue of models the server can configure.
    pub async fn load_models(&self) -> Result<ModelCatalog, SdError> {
        let models = match self.inner.api.available_models().await {
            Ok(models) => models,
            Err(e) => return Err(report(self.notifier(), "load models", e)),
        };
        self.shared().state.models = models.clone();
        Ok(models)
    }
}
