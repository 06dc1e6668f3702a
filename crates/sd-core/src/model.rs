use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Backend model configuration that answers a chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(alias = "ID")]
    pub id: u64,
    pub model_name: String,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub max_tokens: u32,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default, alias = "CreatedAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "UpdatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl fmt::Display for AiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.model_name)
    }
}

/// Body of `POST /ai-config/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAiConfig {
    pub model_name: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub provider: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Body of `PUT /ai-config/:id`; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

/// Entry of the `/ai-config/models` catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOption {
    pub name: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub description: String,
}

/// Model options keyed by provider name.
pub type ModelCatalog = BTreeMap<String, Vec<ModelOption>>;

/// Pick the config a chat turn should use: the chosen id if it exists,
/// otherwise the default one.
pub fn resolve_config(configs: &[AiConfig], chosen: Option<u64>) -> Option<&AiConfig> {
    chosen
        .and_then(|id| configs.iter().find(|c| c.id == id))
        .or_else(|| configs.iter().find(|c| c.is_default))
}
