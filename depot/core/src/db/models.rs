use crate::adapters::ArtifactMetadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

/// Registered account. Identifiers are UUID-v4 strings; SQLite stores them
/// as TEXT.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persisted API key. Only the SHA-256 of the raw key is stored; the raw key
/// is emitted once at creation and never again.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ApiKey {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub key_hash: String,
    /// JSON array of permission strings.
    pub permissions: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ApiKey {
    pub fn permission_set(&self) -> Vec<String> {
        serde_json::from_str(&self.permissions).unwrap_or_default()
    }
}

/// Publisher display fields preloaded on artifact listings. Never carries
/// the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct Publisher {
    pub id: String,
    pub username: String,
    pub email: String,
}

/// One immutable (registry, name, version) tuple with its blob and metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    pub id: String,
    pub name: String,
    pub version: String,
    pub registry: String,
    pub content_type: String,
    pub size: i64,
    pub sha256: String,
    pub storage_path: String,
    pub metadata: ArtifactMetadata,
    pub downloads: i64,
    pub published_by: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<Publisher>,
}

impl sqlx::FromRow<'_, SqliteRow> for Artifact {
    fn from_row(row: &SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        let metadata_json: String = row.try_get("metadata")?;
        let metadata = serde_json::from_str(&metadata_json).map_err(|err| {
            sqlx::Error::ColumnDecode {
                index: "metadata".to_string(),
                source: Box::new(err),
            }
        })?;

        // Publisher columns are present only on listing queries.
        let publisher = match row.try_get::<String, _>("publisher_username") {
            Ok(username) => Some(Publisher {
                id: row.try_get("published_by")?,
                username,
                email: row.try_get("publisher_email").unwrap_or_default(),
            }),
            Err(_) => None,
        };

        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            version: row.try_get("version")?,
            registry: row.try_get("registry")?,
            content_type: row.try_get("content_type")?,
            size: row.try_get("size")?,
            sha256: row.try_get("sha256")?,
            storage_path: row.try_get("storage_path")?,
            metadata,
            downloads: row.try_get("downloads")?,
            published_by: row.try_get("published_by")?,
            is_public: row.try_get("is_public")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            publisher,
        })
    }
}

/// Package-scoped role, ascending privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerRole {
    Contributor,
    Maintainer,
    Owner,
}

impl OwnerRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contributor => "contributor",
            Self::Maintainer => "maintainer",
            Self::Owner => "owner",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "contributor" => Some(Self::Contributor),
            "maintainer" => Some(Self::Maintainer),
            "owner" => Some(Self::Owner),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageOwnership {
    pub id: String,
    pub package_key: String,
    pub user_id: String,
    pub role: OwnerRole,
    pub granted_by: String,
    pub granted_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, SqliteRow> for PackageOwnership {
    fn from_row(row: &SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        let role_str: String = row.try_get("role")?;
        let role = OwnerRole::parse(&role_str).ok_or_else(|| sqlx::Error::ColumnDecode {
            index: "role".to_string(),
            source: format!("unknown role {role_str}").into(),
        })?;
        Ok(Self {
            id: row.try_get("id")?,
            package_key: row.try_get("package_key")?,
            user_id: row.try_get("user_id")?,
            role,
            granted_by: row.try_get("granted_by")?,
            granted_at: row.try_get("granted_at")?,
        })
    }
}

/// Runtime enable/disable flag per format, one row per registry.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RegistrySetting {
    pub registry_name: String,
    pub enabled: bool,
    pub description: String,
    pub updated_by: String,
    pub updated_at: DateTime<Utc>,
}
