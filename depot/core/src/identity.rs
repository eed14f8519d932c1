use crate::credentials::{TokenCache, TokenService, hash_api_key, is_valid_key_format};
use crate::db::Database;
use crate::db::models::{ApiKey, User};
use crate::error::{RegistryError, Result};
use chrono::Utc;
use std::sync::Arc;

/// Credentials as presented on a request, in resolution order.
#[derive(Debug, Clone, Default)]
pub struct RequestCredentials {
    pub bearer: Option<String>,
    pub api_key_header: Option<String>,
    /// `api_key=` query parameter, for package managers that cannot set
    /// headers.
    pub api_key_query: Option<String>,
}

/// Outcome of principal resolution.
///
/// `bearer_rejected` records that a Bearer token was presented and failed:
/// required-auth routes must reject outright instead of falling through to
/// API keys, while optional-auth routes proceed (anonymously or via a valid
/// key) since no authentication succeeds silently there.
#[derive(Debug, Default)]
pub struct Resolution {
    pub user: Option<User>,
    pub bearer_rejected: bool,
}

/// Request→principal resolution (bearer tokens and API keys).
#[derive(Clone)]
pub struct IdentityService {
    db: Database,
    tokens: TokenService,
    cache: Option<Arc<TokenCache>>,
}

impl IdentityService {
    pub fn new(db: Database, tokens: TokenService, cache: Option<Arc<TokenCache>>) -> Self {
        Self { db, tokens, cache }
    }

    pub async fn resolve(&self, creds: &RequestCredentials) -> Resolution {
        let mut resolution = Resolution::default();

        if let Some(bearer) = &creds.bearer {
            match self.resolve_bearer(bearer).await {
                Ok(user) => {
                    resolution.user = Some(user);
                    return resolution;
                }
                Err(_) => resolution.bearer_rejected = true,
            }
        }

        for key in [&creds.api_key_header, &creds.api_key_query]
            .into_iter()
            .flatten()
        {
            if let Ok((user, _)) = self.resolve_api_key(key).await {
                resolution.user = Some(user);
                return resolution;
            }
        }

        resolution
    }

    /// Bearer token → active user. The optional cache is consulted by user
    /// id; misses and cache failures fall back to the database.
    pub async fn resolve_bearer(&self, token: &str) -> Result<User> {
        let user_id = self.tokens.verify(token)?;

        if let Some(cache) = &self.cache
            && let Some(user) = cache.get(&user_id)
        {
            if !user.is_active {
                return Err(RegistryError::InvalidToken);
            }
            return Ok(user);
        }

        let Some(user) = self.db.user_by_id(&user_id).await? else {
            return Err(RegistryError::InvalidToken);
        };
        if !user.is_active {
            return Err(RegistryError::InvalidToken);
        }
        if let Some(cache) = &self.cache {
            cache.put(&user);
        }
        Ok(user)
    }

    /// API-key validation pipeline: parse format → SHA-256 → lookup active
    /// row → expiry → user active → touch last_used_at.
    pub async fn resolve_api_key(&self, raw_key: &str) -> Result<(User, ApiKey)> {
        if !is_valid_key_format(raw_key) {
            return Err(RegistryError::InvalidApiKey);
        }

        let key_hash = hash_api_key(raw_key);
        let Some(key) = self.db.api_key_by_hash(&key_hash).await? else {
            return Err(RegistryError::InvalidApiKey);
        };

        if let Some(expires_at) = key.expires_at
            && expires_at < Utc::now()
        {
            return Err(RegistryError::InvalidApiKey);
        }

        let Some(user) = self.db.user_by_id(&key.user_id).await? else {
            return Err(RegistryError::InvalidApiKey);
        };
        if !user.is_active {
            return Err(RegistryError::InvalidApiKey);
        }

        if let Err(err) = self.db.touch_api_key(&key.id).await {
            tracing::warn!(key_id = key.id.as_str(), %err, "last_used_at update failed");
        }

        Ok((user, key))
    }
}
