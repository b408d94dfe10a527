//! Settings repository

use serde_json::Value;
use sqlx::{Pool, Postgres};

use crate::error::AppResult;

#[derive(Clone)]
pub struct SettingsRepository {
    pool: Pool<Postgres>,
}

impl SettingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &str) -> AppResult<Option<Value>> {
        let value = sqlx::query_scalar("SELECT setting_value FROM app_settings WHERE setting_key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    /// Insert or replace a setting
    pub async fn upsert(&self, key: &str, value: &Value) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO app_settings (setting_key, setting_value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (setting_key)
            DO UPDATE SET setting_value = EXCLUDED.setting_value, updated_at = NOW()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
