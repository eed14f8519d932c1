use crate::db::models::User;
use crate::error::{RegistryError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Instant;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

/// Stateless bearer tokens signed with a symmetric secret. The payload
/// carries the user id and expiry, nothing else.
#[derive(Clone)]
pub struct TokenService {
    secret: Vec<u8>,
    ttl_secs: i64,
}

impl TokenService {
    pub fn new(secret: Vec<u8>, ttl_secs: i64) -> Self {
        Self { secret, ttl_secs }
    }

    pub fn mint(&self, user_id: &str) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.ttl_secs);
        let claims = Claims {
            sub: user_id.to_string(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|_| RegistryError::InvalidToken)
    }

    /// Returns the user id from a valid token.
    pub fn verify(&self, token: &str) -> Result<String> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        match decode::<Claims>(token, &DecodingKey::from_secret(&self.secret), &validation) {
            Ok(data) => Ok(data.claims.sub),
            Err(err) => match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    Err(RegistryError::ExpiredToken)
                }
                _ => Err(RegistryError::InvalidToken),
            },
        }
    }
}

/// Optional in-process token→user cache. Every interaction is best-effort:
/// a poisoned lock behaves like a miss and persistent state stays in the DB.
pub struct TokenCache {
    ttl: std::time::Duration,
    entries: RwLock<HashMap<String, (User, Instant)>>,
}

impl TokenCache {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, user_id: &str) -> Option<User> {
        let entries = self.entries.read().ok()?;
        let (user, inserted) = entries.get(user_id)?;
        if inserted.elapsed() > self.ttl {
            return None;
        }
        Some(user.clone())
    }

    pub fn put(&self, user: &User) {
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|_, (_, inserted)| inserted.elapsed() <= self.ttl);
            entries.insert(user.id.clone(), (user.clone(), Instant::now()));
        }
    }

    pub fn invalidate(&self, user_id: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(user_id);
        }
    }
}
