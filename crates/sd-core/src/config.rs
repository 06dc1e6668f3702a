use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// SmartDecision backend, as shipped with the server's default config
const DEFAULT_BASE_URL: &str = "http://localhost:14020";

/// Every REST and SSE endpoint lives under this prefix
pub const API_PREFIX: &str = "/api/v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,

    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Server origin, without the `/api/v1` prefix
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_session_page_size")]
    pub session_page_size: u32,

    #[serde(default = "default_message_page_size")]
    pub message_page_size: u32,

    #[serde(default = "default_knowledge_page_size")]
    pub knowledge_page_size: u32,

    /// Title given to sessions created implicitly by the first message
    #[serde(default = "default_session_title")]
    pub default_session_title: String,

    /// Local assistant message shown in a freshly created session
    #[serde(default = "default_greeting")]
    pub greeting: String,

    #[serde(default)]
    pub debug: bool,
}

fn default_working_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn default_data_dir() -> String {
    ".smart-decision".into()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

fn default_session_page_size() -> u32 {
    10
}

fn default_message_page_size() -> u32 {
    20
}

fn default_knowledge_page_size() -> u32 {
    10
}

fn default_session_title() -> String {
    "New chat".into()
}

fn default_greeting() -> String {
    "Hello! I'm your AI assistant. How can I help you today?".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            working_dir: default_working_dir(),
            data_dir: default_data_dir(),
            base_url: default_base_url(),
            session_page_size: default_session_page_size(),
            message_page_size: default_message_page_size(),
            knowledge_page_size: default_knowledge_page_size(),
            default_session_title: default_session_title(),
            greeting: default_greeting(),
            debug: false,
        }
    }
}

pub fn load_config(working_dir: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    let wd = working_dir.unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    let mut config = AppConfig {
        working_dir: wd.clone(),
        ..Default::default()
    };

    if let Some(config_dir) = dirs::config_dir() {
        let global_path = config_dir.join("smart-decision").join("config.json");
        if let Some(file_config) = read_config_file(&global_path)? {
            merge_config(&mut config, file_config);
        }
    }

    let local_path = wd.join("smart-decision.json");
    if let Some(file_config) = read_config_file(&local_path)? {
        merge_config(&mut config, file_config);
    }

    if let Ok(url) = std::env::var("SMART_DECISION_BASE_URL") {
        if !url.is_empty() {
            config.base_url = url;
        }
    }

    Ok(config)
}

fn read_config_file(path: &Path) -> Result<Option<AppConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content =
        std::fs::read_to_string(path).map_err(|e| ConfigError::File(e.to_string()))?;
    let file_config: AppConfig =
        serde_json::from_str(&content).map_err(|e| ConfigError::Invalid(e.to_string()))?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(Some(file_config))
}

fn merge_config(base: &mut AppConfig, overlay: AppConfig) {
    if overlay.data_dir != default_data_dir() {
        base.data_dir = overlay.data_dir;
    }
    if overlay.base_url != default_base_url() {
        base.base_url = overlay.base_url;
    }
    if overlay.session_page_size != default_session_page_size() {
        base.session_page_size = overlay.session_page_size;
    }
    if overlay.message_page_size != default_message_page_size() {
        base.message_page_size = overlay.message_page_size;
    }
    if overlay.knowledge_page_size != default_knowledge_page_size() {
        base.knowledge_page_size = overlay.knowledge_page_size;
    }
    if overlay.default_session_title != default_session_title() {
        base.default_session_title = overlay.default_session_title;
    }
    if overlay.greeting != default_greeting() {
        base.greeting = overlay.greeting;
    }
    if overlay.debug {
        base.debug = true;
    }
}

impl AppConfig {
    pub fn data_path(&self) -> PathBuf {
        self.working_dir.join(&self.data_dir)
    }

    /// Base URL of the REST API, e.g. `http://localhost:14020/api/v1`
    pub fn api_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), API_PREFIX)
    }
}
