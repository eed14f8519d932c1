use thiserror::Error;

/// Error taxonomy shared by every registry operation.
///
/// Lower-layer errors are wrapped with enough context to identify the failed
/// step, never internal filesystem paths.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("validation failed: {0}")]
    ValidationFailed(String),
    #[error("authentication required")]
    Unauthorized,
    #[error("insufficient permissions")]
    InsufficientPermissions,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    ExpiredToken,
    #[error("invalid API key")]
    InvalidApiKey,
    #[error("registry {0} is disabled")]
    RegistryDisabled(String),
    #[error("cannot remove the last owner of {0}")]
    LastOwner(String),
    #[error("digest mismatch: expected {expected}, computed {computed}")]
    DigestMismatch { expected: String, computed: String },
    #[error("unsupported registry: {0}")]
    UnsupportedRegistry(String),
    #[error("operation cancelled")]
    Cancelled,
    #[error("storage error: {0}")]
    Io(String),
    #[error("database error: {0}")]
    Db(String),
}

impl RegistryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Imprecise credential failure: callers must not learn whether the
    /// username or the password was wrong.
    pub fn invalid_credentials() -> Self {
        Self::ValidationFailed("invalid credentials".to_string())
    }
}

impl From<std::io::Error> for RegistryError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<sqlx::Error> for RegistryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound("row not found".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::AlreadyExists(db.message().to_string())
            }
            other => Self::Db(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
