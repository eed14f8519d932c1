use super::archive::{basename, find_tar_entry, gunzip};
use super::{ArtifactMetadata, FormatAdapter};
use crate::db::models::Artifact;
use crate::error::{RegistryError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_-]*$").unwrap());

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GemMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub licenses: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

pub struct RubyGemsAdapter;

pub fn is_valid_gem_name(name: &str) -> bool {
    !name.is_empty() && NAME.is_match(name)
}

/// (name, version) from the gemspec. The version sits inside a ruby-tagged
/// `Gem::Version` object, one level down.
pub fn gem_identity(content: &[u8]) -> Result<(String, String)> {
    let spec = read_gemspec(content)?;
    let name = yaml_str(&spec, "name").ok_or_else(|| {
        RegistryError::ValidationFailed("gemspec has no name".to_string())
    })?;
    let version_node = untag(&spec).get("version").map(untag).cloned();
    let version = version_node
        .as_ref()
        .and_then(|node| match node {
            serde_yaml::Value::String(s) => Some(s.clone()),
            other => other
                .get("version")
                .map(untag)
                .and_then(|v| v.as_str())
                .map(str::to_string),
        })
        .ok_or_else(|| RegistryError::ValidationFailed("gemspec has no version".to_string()))?;
    Ok((name, version))
}

/// A gem is a plain tar whose `metadata.gz` member holds the gemspec as
/// YAML, ruby-tagged. Tags are unwrapped and the interesting scalar fields
/// are lifted out.
fn read_gemspec(content: &[u8]) -> Result<serde_yaml::Value> {
    let Some((_, metadata_gz)) = find_tar_entry(content, |path| basename(path) == "metadata.gz")?
    else {
        return Err(RegistryError::ValidationFailed(
            "gem contains no metadata.gz".to_string(),
        ));
    };
    let yaml_bytes = gunzip(&metadata_gz)?;
    serde_yaml::from_slice(&yaml_bytes)
        .map_err(|err| RegistryError::ValidationFailed(format!("invalid gemspec YAML: {err}")))
}

fn untag(value: &serde_yaml::Value) -> &serde_yaml::Value {
    match value {
        serde_yaml::Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

fn yaml_str(value: &serde_yaml::Value, key: &str) -> Option<String> {
    untag(value)
        .get(key)
        .map(untag)
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

fn yaml_str_list(value: &serde_yaml::Value, key: &str) -> Vec<String> {
    untag(value)
        .get(key)
        .map(untag)
        .and_then(|v| v.as_sequence())
        .map(|seq| {
            seq.iter()
                .filter_map(|item| untag(item).as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl FormatAdapter for RubyGemsAdapter {
    fn registry(&self) -> &'static str {
        "rubygems"
    }

    fn validate(&self, artifact: &Artifact, content: &[u8]) -> Result<()> {
        if !is_valid_gem_name(&artifact.name) {
            return Err(RegistryError::ValidationFailed(format!(
                "invalid gem name: {}",
                artifact.name
            )));
        }
        if artifact.version.is_empty() {
            return Err(RegistryError::ValidationFailed(
                "gem version is required".to_string(),
            ));
        }
        read_gemspec(content)?;
        Ok(())
    }

    fn extract_metadata(&self, content: &[u8]) -> Result<ArtifactMetadata> {
        let spec = read_gemspec(content)?;
        Ok(ArtifactMetadata::Rubygems(GemMetadata {
            summary: yaml_str(&spec, "summary"),
            authors: yaml_str_list(&spec, "authors"),
            licenses: yaml_str_list(&spec, "licenses"),
            homepage: yaml_str(&spec, "homepage"),
        }))
    }

    /// Layout: `rubygems/gems/<name>-<version>.gem`
    fn storage_path(&self, name: &str, version: &str) -> String {
        format!("rubygems/gems/{name}-{version}.gem")
    }

    fn content_type(&self, _artifact: &Artifact) -> String {
        "application/octet-stream".to_string()
    }
}
