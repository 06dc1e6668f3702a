use sd_core::error::SdError;
use sd_core::theme::{self, ThemeMode};
use sd_storage::{keys, LocalStorage};
use std::sync::Mutex;

use crate::lock;

/// Light/dark preference, persisted under `theme`.
pub struct ThemeStore {
    storage: LocalStorage,
    mode: Mutex<ThemeMode>,
}

impl ThemeStore {
    pub fn new(storage: LocalStorage) -> Self {
        Self {
            storage,
            mode: Mutex::new(ThemeMode::default()),
        }
    }

    pub fn mode(&self) -> ThemeMode {
        *lock(&self.mode)
    }

    /// Read the saved preference. Unknown values leave the current mode.
    pub async fn load(&self) -> Result<ThemeMode, SdError> {
        if let Some(saved) = self.storage.get(keys::THEME).await? {
            match saved.parse::<ThemeMode>() {
                Ok(mode) => *lock(&self.mode) = mode,
                Err(e) => tracing::warn!(value = %saved, error = %e, "ignoring saved theme"),
            }
        }
        Ok(self.mode())
    }

    pub async fn set_mode(&self, mode: ThemeMode) -> Result<(), SdError> {
        *lock(&self.mode) = mode;
        self.storage.set(keys::THEME, mode.as_str()).await?;
        tracing::debug!(%mode, "theme changed");
        Ok(())
    }

    pub async fn toggle(&self) -> Result<ThemeMode, SdError> {
        let mode = self.mode().toggled();
        self.set_mode(mode).await?;
        Ok(mode)
    }

    /// CSS variables for the current mode.
    pub fn css_variables(&self) -> [(&'static str, &'static str); 13] {
        theme::css_variables(self.mode())
    }
}
