use super::{ArtifactMetadata, FormatAdapter};
use crate::db::models::Artifact;
use crate::error::{RegistryError, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9._-]*$").unwrap());

// Single-character versions are legal; longer ones must start and end
// alphanumeric.
static VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]([a-zA-Z0-9._-]*[a-zA-Z0-9])?$").unwrap());

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MavenMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packaging: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

pub struct MavenAdapter;

/// Splits `groupId:artifactId`; exactly two coordinate parts.
pub fn split_coordinate(name: &str) -> Result<(&str, &str)> {
    let parts: Vec<&str> = name.split(':').collect();
    if parts.len() != 2 {
        return Err(RegistryError::ValidationFailed(format!(
            "maven name must be groupId:artifactId, got {name}"
        )));
    }
    Ok((parts[0], parts[1]))
}

pub fn is_valid_version(version: &str) -> bool {
    VERSION.is_match(version)
}

#[async_trait::async_trait]
impl FormatAdapter for MavenAdapter {
    fn registry(&self) -> &'static str {
        "maven"
    }

    fn validate(&self, artifact: &Artifact, _content: &[u8]) -> Result<()> {
        let (group_id, artifact_id) = split_coordinate(&artifact.name)?;
        if !PART.is_match(group_id) || !PART.is_match(artifact_id) {
            return Err(RegistryError::ValidationFailed(format!(
                "invalid maven coordinate: {}",
                artifact.name
            )));
        }
        if !is_valid_version(&artifact.version) {
            return Err(RegistryError::ValidationFailed(format!(
                "invalid maven version: {}",
                artifact.version
            )));
        }
        Ok(())
    }

    /// POM uploads carry a parseable project document; jar uploads yield the
    /// coordinate fields only once the engine knows them, so binary content
    /// extracts as empty.
    fn extract_metadata(&self, content: &[u8]) -> Result<ArtifactMetadata> {
        if looks_like_xml(content) {
            let xml = String::from_utf8_lossy(content);
            return Ok(ArtifactMetadata::Maven(parse_pom(&xml)));
        }
        Ok(ArtifactMetadata::Maven(MavenMetadata::default()))
    }

    /// Layout: `maven/<groupId dots as slashes>/<artifactId>/<version>/
    /// <artifactId>-<version>.jar`
    fn storage_path(&self, name: &str, version: &str) -> String {
        let (group_id, artifact_id) = match split_coordinate(name) {
            Ok(parts) => parts,
            Err(_) => (name, name),
        };
        format!(
            "maven/{}/{artifact_id}/{version}/{artifact_id}-{version}.jar",
            group_id.replace('.', "/")
        )
    }

    fn content_type(&self, artifact: &Artifact) -> String {
        if matches!(&artifact.metadata, ArtifactMetadata::Maven(meta) if meta.packaging.as_deref() == Some("pom"))
        {
            "application/xml".to_string()
        } else {
            "application/java-archive".to_string()
        }
    }
}

fn looks_like_xml(content: &[u8]) -> bool {
    content
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .map(|b| *b == b'<')
        .unwrap_or(false)
}

/// Minimal POM read: top-level project coordinates and description.
fn parse_pom(xml: &str) -> MavenMetadata {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut meta = MavenMetadata {
        packaging: Some("pom".to_string()),
        ..Default::default()
    };
    let mut stack: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                stack.push(String::from_utf8_lossy(element.local_name().as_ref()).into_owned());
            }
            Ok(Event::Text(text)) => {
                let value = text.unescape().map(|v| v.into_owned()).unwrap_or_default();
                let value = value.trim().to_string();
                // Only direct children of <project>.
                if stack.len() == 2 && stack.first().map(String::as_str) == Some("project") {
                    match stack.last().map(String::as_str) {
                        Some("groupId") => meta.group_id = Some(value),
                        Some("artifactId") => meta.artifact_id = Some(value),
                        Some("description") => meta.description = Some(value),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
    meta
}
