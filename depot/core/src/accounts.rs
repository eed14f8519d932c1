use crate::credentials::{TokenService, generate_api_key, hash_api_key, passwords};
use crate::db::Database;
use crate::db::api_keys::NewApiKey;
use crate::db::models::{ApiKey, User};
use crate::db::users::NewUser;
use crate::error::{RegistryError, Result};
use chrono::{DateTime, Utc};

/// Account lifecycle: registration, password login, API-key management.
#[derive(Clone)]
pub struct AccountService {
    db: Database,
    tokens: TokenService,
    bcrypt_cost: u32,
}

/// Returned once at key creation; the raw key is never recoverable later.
pub struct CreatedApiKey {
    pub key: ApiKey,
    pub raw_key: String,
}

impl AccountService {
    pub fn new(db: Database, tokens: TokenService, bcrypt_cost: u32) -> Self {
        Self {
            db,
            tokens,
            bcrypt_cost,
        }
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<User> {
        if username.trim().is_empty() || email.trim().is_empty() {
            return Err(RegistryError::ValidationFailed(
                "username and email are required".to_string(),
            ));
        }
        if password.len() < 8 {
            return Err(RegistryError::ValidationFailed(
                "password must be at least 8 characters".to_string(),
            ));
        }

        let password_hash = passwords::hash_password(password, self.bcrypt_cost)?;
        self.db
            .create_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                is_admin,
            })
            .await
    }

    /// Password login. Failures are deliberately imprecise: the caller never
    /// learns whether the username or the password was wrong.
    pub async fn login(&self, username: &str, password: &str) -> Result<(User, String)> {
        let Some(user) = self.db.user_by_username(username).await? else {
            return Err(RegistryError::invalid_credentials());
        };
        if !user.is_active || !passwords::verify_password(password, &user.password_hash) {
            return Err(RegistryError::invalid_credentials());
        }
        let token = self.tokens.mint(&user.id)?;
        Ok((user, token))
    }

    pub async fn create_api_key(
        &self,
        user_id: &str,
        name: &str,
        permissions: Vec<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<CreatedApiKey> {
        if name.trim().is_empty() {
            return Err(RegistryError::ValidationFailed(
                "key name is required".to_string(),
            ));
        }

        let raw_key = generate_api_key();
        let key = self
            .db
            .create_api_key(NewApiKey {
                user_id: user_id.to_string(),
                name: name.to_string(),
                key_hash: hash_api_key(&raw_key),
                permissions,
                expires_at,
            })
            .await?;

        Ok(CreatedApiKey { key, raw_key })
    }

    pub async fn list_api_keys(&self, user_id: &str) -> Result<Vec<ApiKey>> {
        self.db.api_keys_for_user(user_id).await
    }

    /// Owning user or an admin may revoke.
    pub async fn revoke_api_key(&self, key_id: &str, acting_user: &User) -> Result<()> {
        let Some(key) = self.db.api_key_by_id(key_id).await? else {
            return Err(RegistryError::NotFound(format!("api key {key_id}")));
        };
        if key.user_id != acting_user.id && !acting_user.is_admin {
            return Err(RegistryError::InsufficientPermissions);
        }
        self.db.revoke_api_key(key_id).await
    }

    pub fn token_service(&self) -> &TokenService {
        &self.tokens
    }
}
