use crate::error::{RegistryError, Result};

/// Cost-parameterized password hashing.
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    bcrypt::hash(password, cost).map_err(|err| RegistryError::Db(format!("password hash: {err}")))
}

/// Verification runs in time independent of the supplied value; a malformed
/// stored hash simply fails the check.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    bcrypt::verify(password, password_hash).unwrap_or(false)
}
