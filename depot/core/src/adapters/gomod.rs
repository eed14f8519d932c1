use super::{ArtifactMetadata, FormatAdapter};
use crate::db::models::Artifact;
use crate::error::{RegistryError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::sync::LazyLock;

static MODULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9.\-_~]+(/[a-z0-9.\-_~]+)*$").unwrap());

static VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v\d+\.\d+\.\d+(-[0-9A-Za-z.-]+)?(\+[0-9A-Za-z.-]+)?$").unwrap()
});

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoMetadata {
    /// `module` directive from the embedded go.mod, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub go_version: Option<String>,
}

pub struct GoAdapter;

pub fn is_valid_module_path(name: &str) -> bool {
    if !MODULE.is_match(name) {
        return false;
    }
    // The leading segment is a hostname and must carry a dot.
    name.split('/').next().is_some_and(|host| host.contains('.'))
}

pub fn is_valid_version(version: &str) -> bool {
    VERSION.is_match(version)
}

/// Reads `<module>@<version>/go.mod` (or any go.mod member) from the module
/// zip.
pub fn read_go_mod(content: &[u8]) -> Option<String> {
    let cursor = std::io::Cursor::new(content);
    let mut archive = zip::ZipArchive::new(cursor).ok()?;
    let entry_name = archive
        .file_names()
        .find(|name| name.ends_with("/go.mod") || *name == "go.mod")
        .map(str::to_string)?;
    let mut file = archive.by_name(&entry_name).ok()?;
    let mut text = String::new();
    file.read_to_string(&mut text).ok()?;
    Some(text)
}

#[async_trait::async_trait]
impl FormatAdapter for GoAdapter {
    fn registry(&self) -> &'static str {
        "go"
    }

    fn sanitize_name(&self, name: &str) -> String {
        name.to_lowercase()
    }

    fn validate(&self, artifact: &Artifact, content: &[u8]) -> Result<()> {
        if !is_valid_module_path(&artifact.name) {
            return Err(RegistryError::ValidationFailed(format!(
                "invalid go module path: {}",
                artifact.name
            )));
        }
        if !is_valid_version(&artifact.version) {
            return Err(RegistryError::ValidationFailed(format!(
                "invalid go module version: {}",
                artifact.version
            )));
        }
        if zip::ZipArchive::new(std::io::Cursor::new(content)).is_err() {
            return Err(RegistryError::ValidationFailed(
                "module archive is not a zip".to_string(),
            ));
        }
        Ok(())
    }

    fn extract_metadata(&self, content: &[u8]) -> Result<ArtifactMetadata> {
        let mut meta = GoMetadata::default();
        if let Some(go_mod) = read_go_mod(content) {
            for line in go_mod.lines() {
                let line = line.trim();
                if let Some(path) = line.strip_prefix("module ") {
                    meta.module_path = Some(path.trim().to_string());
                } else if let Some(version) = line.strip_prefix("go ") {
                    meta.go_version = Some(version.trim().to_string());
                }
            }
        }
        Ok(ArtifactMetadata::Go(meta))
    }

    /// Layout: `go/<module>/@v/<version>.zip`
    fn storage_path(&self, name: &str, version: &str) -> String {
        format!("go/{name}/@v/{version}.zip")
    }

    fn content_type(&self, _artifact: &Artifact) -> String {
        "application/zip".to_string()
    }
}
