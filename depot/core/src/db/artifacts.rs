use super::Database;
use super::models::Artifact;
use crate::error::{RegistryError, Result};
use chrono::Utc;
use sqlx::QueryBuilder;

/// Listing filter; `limit`/`offset` paginate, everything else narrows.
#[derive(Debug, Clone, Default)]
pub struct ArtifactFilter {
    /// Case-insensitive substring match on the artifact name.
    pub name: Option<String>,
    pub registry: Option<String>,
    pub tags: Vec<String>,
    pub limit: i64,
    pub offset: i64,
}

const LIST_COLUMNS: &str = "a.*, u.username AS publisher_username, u.email AS publisher_email";

impl Database {
    pub async fn insert_artifact(&self, artifact: &Artifact) -> Result<()> {
        let metadata = serde_json::to_string(&artifact.metadata)
            .map_err(|err| RegistryError::Db(err.to_string()))?;

        sqlx::query(
            "INSERT INTO artifacts (id, name, version, registry, content_type, size, sha256,
                 storage_path, metadata, downloads, published_by, is_public, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&artifact.id)
        .bind(&artifact.name)
        .bind(&artifact.version)
        .bind(&artifact.registry)
        .bind(&artifact.content_type)
        .bind(artifact.size)
        .bind(&artifact.sha256)
        .bind(&artifact.storage_path)
        .bind(&metadata)
        .bind(artifact.downloads)
        .bind(&artifact.published_by)
        .bind(artifact.is_public)
        .bind(artifact.created_at)
        .bind(artifact.updated_at)
        .execute(self.pool())
        .await
        .map_err(|err| match RegistryError::from(err) {
            RegistryError::AlreadyExists(_) => RegistryError::AlreadyExists(format!(
                "{}/{}@{}",
                artifact.registry, artifact.name, artifact.version
            )),
            other => other,
        })?;

        Ok(())
    }

    pub async fn artifact_by_identity(
        &self,
        registry: &str,
        name: &str,
        version: &str,
    ) -> Result<Option<Artifact>> {
        let artifact = sqlx::query_as::<_, Artifact>(
            "SELECT * FROM artifacts WHERE registry = ? AND name = ? AND version = ?",
        )
        .bind(registry)
        .bind(name)
        .bind(version)
        .fetch_optional(self.pool())
        .await?;
        Ok(artifact)
    }

    pub async fn artifact_versions(&self, registry: &str, name: &str) -> Result<Vec<Artifact>> {
        let artifacts = sqlx::query_as::<_, Artifact>(
            "SELECT * FROM artifacts WHERE registry = ? AND name = ? ORDER BY created_at ASC",
        )
        .bind(registry)
        .bind(name)
        .fetch_all(self.pool())
        .await?;
        Ok(artifacts)
    }

    pub async fn artifact_count_for_package(&self, registry: &str, name: &str) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM artifacts WHERE registry = ? AND name = ?")
                .bind(registry)
                .bind(name)
                .fetch_one(self.pool())
                .await?;
        Ok(count)
    }

    /// Returns the requested page plus the total count before pagination.
    /// Publisher display fields are preloaded; the password hash never
    /// leaves the users table.
    pub async fn list_artifacts(&self, filter: &ArtifactFilter) -> Result<(Vec<Artifact>, i64)> {
        let mut query = QueryBuilder::new(format!(
            "SELECT {LIST_COLUMNS} FROM artifacts a JOIN users u ON u.id = a.published_by WHERE 1=1"
        ));
        push_conditions(&mut query, filter);
        query.push(" ORDER BY a.created_at DESC");

        if filter.tags.is_empty() {
            let mut count_query = QueryBuilder::new(
                "SELECT COUNT(*) FROM artifacts a JOIN users u ON u.id = a.published_by WHERE 1=1",
            );
            push_conditions(&mut count_query, filter);
            let total: i64 = count_query
                .build_query_scalar()
                .fetch_one(self.pool())
                .await?;

            if filter.limit > 0 {
                query.push(" LIMIT ");
                query.push_bind(filter.limit);
                query.push(" OFFSET ");
                query.push_bind(filter.offset.max(0));
            }
            let page = query
                .build_query_as::<Artifact>()
                .fetch_all(self.pool())
                .await?;
            return Ok((page, total));
        }

        // Tag filters inspect extracted metadata, so pagination is applied
        // after the in-memory narrowing pass.
        let all = query
            .build_query_as::<Artifact>()
            .fetch_all(self.pool())
            .await?;
        let matched: Vec<Artifact> = all
            .into_iter()
            .filter(|a| {
                let tags = a.metadata.tags();
                filter
                    .tags
                    .iter()
                    .all(|wanted| tags.iter().any(|t| t.eq_ignore_ascii_case(wanted)))
            })
            .collect();
        let total = matched.len() as i64;
        let start = filter.offset.max(0) as usize;
        let page: Vec<Artifact> = if filter.limit > 0 {
            matched
                .into_iter()
                .skip(start)
                .take(filter.limit as usize)
                .collect()
        } else {
            matched.into_iter().skip(start).collect()
        };
        Ok((page, total))
    }

    pub async fn delete_artifact(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM artifacts WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(RegistryError::NotFound(format!("artifact {id}")));
        }
        Ok(())
    }

    /// Atomic counter bump; a single SQL expression, never read-modify-write.
    pub async fn increment_downloads(&self, id: &str) -> Result<()> {
        sqlx::query("UPDATE artifacts SET downloads = downloads + 1, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(())
    }
}

fn push_conditions(query: &mut QueryBuilder<'_, sqlx::Sqlite>, filter: &ArtifactFilter) {
    if let Some(name) = &filter.name {
        query.push(" AND lower(a.name) LIKE ");
        query.push_bind(format!("%{}%", name.to_lowercase()));
    }
    if let Some(registry) = &filter.registry {
        query.push(" AND a.registry = ");
        query.push_bind(registry.clone());
    }
}
