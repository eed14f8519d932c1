use super::{ArtifactMetadata, FormatAdapter, is_semver};
use crate::db::models::Artifact;
use crate::error::{RegistryError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

static NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_-]*$").unwrap());

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Crate metadata as the publish payload declares it; the sparse index is
/// rebuilt from these fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrateMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deps: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub features: HashMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rust_version: Option<String>,
}

pub struct CargoAdapter;

pub fn is_valid_crate_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= 64 && NAME.is_match(name)
}

#[async_trait::async_trait]
impl FormatAdapter for CargoAdapter {
    fn registry(&self) -> &'static str {
        "cargo"
    }

    fn validate(&self, artifact: &Artifact, content: &[u8]) -> Result<()> {
        if !is_valid_crate_name(&artifact.name) {
            return Err(RegistryError::ValidationFailed(format!(
                "invalid crate name: {}",
                artifact.name
            )));
        }
        if !is_semver(&artifact.version) {
            return Err(RegistryError::ValidationFailed(format!(
                "invalid crate version: {}",
                artifact.version
            )));
        }
        if content.len() < 2 || content[..2] != GZIP_MAGIC {
            return Err(RegistryError::ValidationFailed(
                "crate file is not a gzipped tarball".to_string(),
            ));
        }
        Ok(())
    }

    /// The interesting fields arrive in the publish payload, not the
    /// tarball; the protocol layer merges them in after extraction.
    fn extract_metadata(&self, _content: &[u8]) -> Result<ArtifactMetadata> {
        Ok(ArtifactMetadata::Cargo(CrateMetadata::default()))
    }

    /// Layout: `cargo/crates/<name>/<name>-<version>.crate`
    fn storage_path(&self, name: &str, version: &str) -> String {
        format!("cargo/crates/{name}/{name}-{version}.crate")
    }

    fn content_type(&self, _artifact: &Artifact) -> String {
        "application/gzip".to_string()
    }
}
