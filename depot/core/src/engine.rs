use crate::adapters::AdapterRegistry;
use crate::analytics::AnalyticsService;
use crate::blob::BlobStore;
use crate::context::OpContext;
use crate::db::Database;
use crate::db::artifacts::ArtifactFilter;
use crate::db::models::{Artifact, User};
use crate::error::{RegistryError, Result};
use crate::ownership::OwnershipService;
use crate::settings::SettingsService;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

/// One upload, stream already drained by the protocol layer.
pub struct UploadRequest {
    pub registry: String,
    pub name: String,
    pub version: String,
    pub content: Vec<u8>,
    /// Protocol-level hint (e.g. the NuGet symbol-package content type);
    /// the adapter has the final word.
    pub content_type: Option<String>,
    /// Metadata declared by the publish protocol itself (cargo's publish
    /// JSON); supersedes what the adapter can read out of the archive.
    pub metadata: Option<crate::adapters::ArtifactMetadata>,
}

/// Upload/download/list/delete pipeline orchestrating the blob store,
/// adapters, ownership, settings, and analytics.
#[derive(Clone)]
pub struct RegistryEngine {
    db: Database,
    blobs: Arc<dyn BlobStore>,
    adapters: AdapterRegistry,
    ownership: OwnershipService,
    settings: SettingsService,
    analytics: AnalyticsService,
}

impl RegistryEngine {
    pub fn new(db: Database, blobs: Arc<dyn BlobStore>, adapters: AdapterRegistry) -> Self {
        let ownership = OwnershipService::new(db.clone());
        let settings = SettingsService::new(db.clone());
        let analytics = AnalyticsService::new(db.clone());
        Self {
            db,
            blobs,
            adapters,
            ownership,
            settings,
            analytics,
        }
    }

    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    pub fn ownership(&self) -> &OwnershipService {
        &self.ownership
    }

    pub fn settings(&self) -> &SettingsService {
        &self.settings
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn adapters(&self) -> &AdapterRegistry {
        &self.adapters
    }

    /// The upload pipeline. Step order is load-bearing: nothing touches the
    /// blob store until the artifact is validated, authorized, and known to
    /// be new.
    pub async fn upload(
        &self,
        ctx: &OpContext,
        request: UploadRequest,
        publisher: &User,
    ) -> Result<Artifact> {
        ctx.ensure_active()?;

        let adapter = self.adapters.get(&request.registry)?;

        if !self.settings.is_registry_enabled(&request.registry).await? {
            return Err(RegistryError::RegistryDisabled(request.registry.clone()));
        }

        let content = request.content;
        let size = content.len() as i64;
        let sha256 = {
            let mut hasher = Sha256::new();
            hasher.update(&content);
            format!("{:x}", hasher.finalize())
        };

        let now = Utc::now();
        let mut artifact = Artifact {
            id: Uuid::new_v4().to_string(),
            name: adapter.sanitize_name(&request.name),
            version: request.version.clone(),
            registry: request.registry.clone(),
            content_type: request.content_type.unwrap_or_default(),
            size,
            sha256,
            storage_path: String::new(),
            metadata: Default::default(),
            downloads: 0,
            published_by: publisher.id.clone(),
            is_public: false,
            created_at: now,
            updated_at: now,
            publisher: None,
        };

        adapter.validate(&artifact, &content)?;
        artifact.metadata = match request.metadata {
            Some(declared) => declared,
            None => adapter.extract_metadata(&content)?,
        };

        if !self
            .ownership
            .can_user_publish(&artifact.registry, &artifact.name, publisher)
            .await?
        {
            return Err(RegistryError::InsufficientPermissions);
        }

        if self
            .db
            .artifact_by_identity(&artifact.registry, &artifact.name, &artifact.version)
            .await?
            .is_some()
        {
            return Err(RegistryError::AlreadyExists(format!(
                "{}/{}@{}",
                artifact.registry, artifact.name, artifact.version
            )));
        }
        let first_for_package = self
            .db
            .artifact_count_for_package(&artifact.registry, &artifact.name)
            .await?
            == 0;

        artifact.storage_path = adapter.storage_path(&artifact.name, &artifact.version);

        adapter
            .upload_hook(ctx, &mut artifact, &content, self.blobs.as_ref())
            .await?;

        if let Err(err) = self.db.insert_artifact(&artifact).await {
            // A lost uniqueness race means the winner owns the path now;
            // only a genuine persist failure rolls the blob back.
            if !matches!(err, RegistryError::AlreadyExists(_))
                && let Err(cleanup) = self.blobs.delete(ctx, &artifact.storage_path).await
            {
                tracing::warn!(
                    path = artifact.storage_path.as_str(),
                    %cleanup,
                    "orphan blob cleanup failed after persist error"
                );
            }
            return Err(err);
        }

        if first_for_package {
            self.ownership
                .establish_initial_ownership(&artifact.registry, &artifact.name, &publisher.id)
                .await?;
        }

        tracing::info!(
            registry = artifact.registry.as_str(),
            name = artifact.name.as_str(),
            version = artifact.version.as_str(),
            size = artifact.size,
            "artifact published"
        );
        Ok(artifact)
    }

    /// Lookup, open the blob, then bump the counter. The bump never blocks
    /// or fails the download.
    pub async fn download(
        &self,
        ctx: &OpContext,
        registry: &str,
        name: &str,
        version: &str,
        user_id: Option<&str>,
    ) -> Result<(Artifact, tokio::fs::File)> {
        ctx.ensure_active()?;
        let Some(artifact) = self.db.artifact_by_identity(registry, name, version).await? else {
            return Err(RegistryError::NotFound(format!(
                "{registry}/{name}@{version}"
            )));
        };

        let file = self.blobs.retrieve(ctx, &artifact.storage_path).await?;
        self.analytics.record_download(&artifact.id, user_id).await;
        Ok((artifact, file))
    }

    pub async fn list(
        &self,
        ctx: &OpContext,
        filter: &ArtifactFilter,
    ) -> Result<(Vec<Artifact>, i64)> {
        ctx.ensure_active()?;
        self.db.list_artifacts(filter).await
    }

    /// The blob goes first: when it cannot be removed the row stays, since
    /// an orphan row beats a dangling blob with lost metadata.
    pub async fn delete(
        &self,
        ctx: &OpContext,
        registry: &str,
        name: &str,
        version: &str,
        acting_user: &User,
    ) -> Result<()> {
        ctx.ensure_active()?;
        let Some(artifact) = self.db.artifact_by_identity(registry, name, version).await? else {
            return Err(RegistryError::NotFound(format!(
                "{registry}/{name}@{version}"
            )));
        };

        if !self
            .ownership
            .can_user_delete(registry, &artifact.name, acting_user)
            .await?
        {
            return Err(RegistryError::InsufficientPermissions);
        }

        self.blobs.delete(ctx, &artifact.storage_path).await?;
        self.db.delete_artifact(&artifact.id).await?;

        tracing::info!(
            registry,
            name = artifact.name.as_str(),
            version = artifact.version.as_str(),
            "artifact deleted"
        );
        Ok(())
    }
}
