//! Settings service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::settings::{default_value, Setting},
    repository::Repository,
};

#[derive(Clone)]
pub struct SettingsService {
    repository: Repository,
}

impl SettingsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Stored value, else the built-in default for known keys
    pub async fn get(&self, key: &str) -> AppResult<Setting> {
        let value = match self.repository.settings.get(key).await? {
            Some(value) => value,
            None => default_value(key)
                .ok_or_else(|| AppError::NotFound(format!("Setting '{}' not found", key)))?,
        };
        Ok(Setting {
            key: key.to_string(),
            value,
        })
    }

    pub async fn put(&self, setting: &Setting) -> AppResult<Setting> {
        setting.validate()?;
        self.repository
            .settings
            .upsert(&setting.key, &setting.value)
            .await?;
        tracing::info!(key = %setting.key, "Setting saved");
        Ok(setting.clone())
    }
}
