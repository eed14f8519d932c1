use super::Database;
use super::models::RegistrySetting;
use crate::error::{RegistryError, Result};
use chrono::Utc;

impl Database {
    pub async fn setting_by_name(&self, registry_name: &str) -> Result<Option<RegistrySetting>> {
        let row = sqlx::query_as::<_, RegistrySetting>(
            "SELECT * FROM registry_settings WHERE registry_name = ?",
        )
        .bind(registry_name)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    pub async fn all_settings(&self) -> Result<Vec<RegistrySetting>> {
        let rows = sqlx::query_as::<_, RegistrySetting>(
            "SELECT * FROM registry_settings ORDER BY registry_name ASC",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    /// Bootstrap insert; existing rows keep their state.
    pub async fn seed_setting(&self, registry_name: &str, description: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO registry_settings (registry_name, enabled, description, updated_by, updated_at)
             VALUES (?, 1, ?, '', ?)
             ON CONFLICT(registry_name) DO NOTHING",
        )
        .bind(registry_name)
        .bind(description)
        .bind(Utc::now())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn set_registry_enabled(
        &self,
        registry_name: &str,
        enabled: bool,
        updated_by: &str,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE registry_settings SET enabled = ?, updated_by = ?, updated_at = ?
             WHERE registry_name = ?",
        )
        .bind(enabled)
        .bind(updated_by)
        .bind(Utc::now())
        .bind(registry_name)
        .execute(self.pool())
        .await?;
        if result.rows_affected() == 0 {
            return Err(RegistryError::NotFound(format!(
                "registry setting {registry_name}"
            )));
        }
        Ok(())
    }

    pub async fn set_registry_description(
        &self,
        registry_name: &str,
        description: &str,
        updated_by: &str,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE registry_settings SET description = ?, updated_by = ?, updated_at = ?
             WHERE registry_name = ?",
        )
        .bind(description)
        .bind(updated_by)
        .bind(Utc::now())
        .bind(registry_name)
        .execute(self.pool())
        .await?;
        if result.rows_affected() == 0 {
            return Err(RegistryError::NotFound(format!(
                "registry setting {registry_name}"
            )));
        }
        Ok(())
    }
}
