use super::Database;
use super::models::ApiKey;
use crate::error::{RegistryError, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub struct NewApiKey {
    pub user_id: String,
    pub name: String,
    pub key_hash: String,
    pub permissions: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Database {
    pub async fn create_api_key(&self, new: NewApiKey) -> Result<ApiKey> {
        let key = ApiKey {
            id: Uuid::new_v4().to_string(),
            user_id: new.user_id,
            name: new.name,
            key_hash: new.key_hash,
            permissions: serde_json::to_string(&new.permissions)
                .map_err(|err| RegistryError::Db(err.to_string()))?,
            expires_at: new.expires_at,
            last_used_at: None,
            is_active: true,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO api_keys (id, user_id, name, key_hash, permissions, expires_at, last_used_at, is_active, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&key.id)
        .bind(&key.user_id)
        .bind(&key.name)
        .bind(&key.key_hash)
        .bind(&key.permissions)
        .bind(key.expires_at)
        .bind(key.last_used_at)
        .bind(key.is_active)
        .bind(key.created_at)
        .execute(self.pool())
        .await?;

        Ok(key)
    }

    /// Lookup for validation: hash must match and the key must be active.
    pub async fn api_key_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>> {
        let key = sqlx::query_as::<_, ApiKey>(
            "SELECT * FROM api_keys WHERE key_hash = ? AND is_active = 1",
        )
        .bind(key_hash)
        .fetch_optional(self.pool())
        .await?;
        Ok(key)
    }

    pub async fn api_keys_for_user(&self, user_id: &str) -> Result<Vec<ApiKey>> {
        let keys = sqlx::query_as::<_, ApiKey>(
            "SELECT * FROM api_keys WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(keys)
    }

    pub async fn touch_api_key(&self, id: &str) -> Result<()> {
        sqlx::query("UPDATE api_keys SET last_used_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Revocation flips is_active; the row stays for audit.
    pub async fn revoke_api_key(&self, id: &str) -> Result<()> {
        let result = sqlx::query("UPDATE api_keys SET is_active = 0 WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(RegistryError::NotFound(format!("api key {id}")));
        }
        Ok(())
    }

    pub async fn api_key_by_id(&self, id: &str) -> Result<Option<ApiKey>> {
        let key = sqlx::query_as::<_, ApiKey>("SELECT * FROM api_keys WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(key)
    }
}
