use super::archive::{basename, find_tar_entry, gunzip};
use super::{ArtifactMetadata, FormatAdapter};
use crate::db::models::Artifact;
use crate::error::{RegistryError, Result};
use serde::{Deserialize, Serialize};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundleMetadata {
    /// `.manifest` revision, when the bundle carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roots: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BundleManifest {
    #[serde(default)]
    revision: Option<String>,
    #[serde(default)]
    roots: Vec<String>,
}

pub struct OpaAdapter;

#[async_trait::async_trait]
impl FormatAdapter for OpaAdapter {
    fn registry(&self) -> &'static str {
        "opa"
    }

    fn validate(&self, artifact: &Artifact, content: &[u8]) -> Result<()> {
        if artifact.name.trim().is_empty() {
            return Err(RegistryError::ValidationFailed(
                "bundle name is required".to_string(),
            ));
        }
        if artifact.version.trim().is_empty() {
            return Err(RegistryError::ValidationFailed(
                "bundle version is required".to_string(),
            ));
        }
        if content.len() < 2 || content[..2] != GZIP_MAGIC {
            return Err(RegistryError::ValidationFailed(
                "bundle is not a gzipped tarball".to_string(),
            ));
        }
        Ok(())
    }

    fn extract_metadata(&self, content: &[u8]) -> Result<ArtifactMetadata> {
        let mut meta = BundleMetadata::default();
        if let Ok(tar_bytes) = gunzip(content)
            && let Ok(Some((_, manifest_bytes))) =
                find_tar_entry(&tar_bytes, |path| basename(path) == ".manifest")
            && let Ok(manifest) = serde_json::from_slice::<BundleManifest>(&manifest_bytes)
        {
            meta.revision = manifest.revision;
            meta.roots = manifest.roots;
        }
        Ok(ArtifactMetadata::Opa(meta))
    }

    /// Layout: `opa/bundles/<name>/<version>.tar.gz`
    fn storage_path(&self, name: &str, version: &str) -> String {
        format!("opa/bundles/{name}/{version}.tar.gz")
    }

    fn content_type(&self, _artifact: &Artifact) -> String {
        "application/gzip".to_string()
    }
}
