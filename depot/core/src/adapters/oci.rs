use super::{ArtifactMetadata, FormatAdapter};
use crate::blob::BlobStore;
use crate::context::OpContext;
use crate::db::models::Artifact;
use crate::error::{RegistryError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

static REPOSITORY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+((\.|_|-+)[a-z0-9]+)*(/[a-z0-9]+((\.|_|-+)[a-z0-9]+)*)*$").unwrap()
});

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9._-]{0,127}$").unwrap());

static DIGEST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^sha256:[a-f0-9]{64}$").unwrap());

pub const DEFAULT_MANIFEST_TYPE: &str = "application/vnd.oci.image.manifest.v1+json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub schema_version: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// `sha256:` + hex of the exact submitted bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    pub layer_count: usize,
}

#[derive(Debug, Deserialize)]
struct ManifestDocument {
    #[serde(rename = "schemaVersion")]
    schema_version: i64,
    #[serde(default, rename = "mediaType")]
    media_type: Option<String>,
    #[serde(default)]
    layers: Vec<serde_json::Value>,
}

pub struct OciAdapter;

pub fn is_valid_repository(name: &str) -> bool {
    REPOSITORY.is_match(name)
}

pub fn is_valid_reference(reference: &str) -> bool {
    is_digest(reference) || TAG.is_match(reference)
}

pub fn is_digest(reference: &str) -> bool {
    DIGEST.is_match(reference)
}

/// Digest of the exact submitted bytes; never a placeholder.
pub fn compute_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256:{:x}", hasher.finalize())
}

pub fn manifest_path(repository: &str, reference: &str) -> String {
    format!("oci/{repository}/manifests/{reference}")
}

#[async_trait::async_trait]
impl FormatAdapter for OciAdapter {
    fn registry(&self) -> &'static str {
        "oci"
    }

    fn validate(&self, artifact: &Artifact, content: &[u8]) -> Result<()> {
        if !is_valid_repository(&artifact.name) {
            return Err(RegistryError::ValidationFailed(format!(
                "invalid repository name: {}",
                artifact.name
            )));
        }
        if !is_valid_reference(&artifact.version) {
            return Err(RegistryError::ValidationFailed(format!(
                "invalid reference: {}",
                artifact.version
            )));
        }
        let manifest: ManifestDocument = serde_json::from_slice(content)
            .map_err(|err| RegistryError::ValidationFailed(format!("invalid manifest: {err}")))?;
        if manifest.schema_version != 2 {
            return Err(RegistryError::ValidationFailed(format!(
                "unsupported manifest schemaVersion {}",
                manifest.schema_version
            )));
        }
        Ok(())
    }

    fn extract_metadata(&self, content: &[u8]) -> Result<ArtifactMetadata> {
        let manifest: ManifestDocument = serde_json::from_slice(content)
            .map_err(|err| RegistryError::ValidationFailed(format!("invalid manifest: {err}")))?;
        Ok(ArtifactMetadata::Oci(ManifestMetadata {
            schema_version: manifest.schema_version,
            media_type: manifest.media_type,
            digest: Some(compute_digest(content)),
            layer_count: manifest.layers.len(),
        }))
    }

    /// Digest references address blob storage, tags address manifests.
    fn storage_path(&self, name: &str, version: &str) -> String {
        match version.strip_prefix("sha256:") {
            Some(hex) if is_digest(version) => format!("oci/{name}/blobs/sha256/{hex}"),
            _ => manifest_path(name, version),
        }
    }

    fn content_type(&self, artifact: &Artifact) -> String {
        match &artifact.metadata {
            ArtifactMetadata::Oci(meta) => meta
                .media_type
                .clone()
                .unwrap_or_else(|| DEFAULT_MANIFEST_TYPE.to_string()),
            _ => DEFAULT_MANIFEST_TYPE.to_string(),
        }
    }

    /// A manifest PUT lands twice: under the submitted reference and under
    /// its own digest, so clients can fetch either.
    async fn upload_hook(
        &self,
        ctx: &OpContext,
        artifact: &mut Artifact,
        content: &[u8],
        blobs: &dyn BlobStore,
    ) -> Result<()> {
        artifact.content_type = self.content_type(artifact);
        blobs
            .store(ctx, &artifact.storage_path, content, &artifact.content_type)
            .await?;

        let digest = compute_digest(content);
        let digest_path = manifest_path(&artifact.name, &digest);
        if digest_path != artifact.storage_path {
            blobs
                .store(ctx, &digest_path, content, &artifact.content_type)
                .await?;
        }
        Ok(())
    }
}
