use super::{ArtifactMetadata, FormatAdapter, is_semver};
use crate::blob::BlobStore;
use crate::context::OpContext;
use crate::db::models::Artifact;
use crate::error::{RegistryError, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::sync::LazyLock;

pub const SYMBOL_CONTENT_TYPE: &str = "application/vnd.nuget.symbolpackage";

static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9][-a-zA-Z0-9._]*$").unwrap());

/// Fields lifted from the `.nuspec` manifest inside the package zip.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NuSpecMetadata {
    pub id: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owners: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_license_acceptance: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub development_dependency: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_client_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub package_types: Vec<String>,
    /// Framework-grouped or flat, exactly as declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework_assemblies: Option<serde_json::Value>,
}

impl NuSpecMetadata {
    pub fn is_symbol_package(&self) -> bool {
        self.package_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case("symbols"))
    }
}

pub struct NuGetAdapter;

pub fn is_valid_package_id(name: &str) -> bool {
    !name.is_empty() && NAME.is_match(name)
}

/// (id, version) from the embedded nuspec; the push endpoint has no
/// coordinates in its URL.
pub fn package_identity(content: &[u8]) -> Result<(String, String)> {
    let nuspec = NuGetAdapter::read_nuspec(content)?;
    Ok((nuspec.id, nuspec.version))
}

/// Layout for the debug-symbol companion:
/// `nuget/symbols/<id>/<version>/<id>.<version>.snupkg` (lowercased).
pub fn symbol_storage_path(name: &str, version: &str) -> String {
    let name = name.to_lowercase();
    let version = version.to_lowercase();
    format!("nuget/symbols/{name}/{version}/{name}.{version}.snupkg")
}

fn zip_entry_names(content: &[u8]) -> Result<Vec<String>> {
    let cursor = std::io::Cursor::new(content);
    let archive = zip::ZipArchive::new(cursor)
        .map_err(|err| RegistryError::ValidationFailed(format!("not a zip archive: {err}")))?;
    Ok(archive.file_names().map(str::to_string).collect())
}

fn read_zip_entry(content: &[u8], entry_name: &str) -> Result<Vec<u8>> {
    let cursor = std::io::Cursor::new(content);
    let mut archive = zip::ZipArchive::new(cursor)
        .map_err(|err| RegistryError::ValidationFailed(format!("not a zip archive: {err}")))?;
    let mut file = archive
        .by_name(entry_name)
        .map_err(|err| RegistryError::ValidationFailed(format!("zip entry missing: {err}")))?;
    let mut out = Vec::new();
    file.read_to_end(&mut out)
        .map_err(|err| RegistryError::ValidationFailed(format!("bad zip entry: {err}")))?;
    Ok(out)
}

fn has_debug_symbols(entries: &[String]) -> bool {
    entries.iter().any(|name| {
        let lower = name.to_lowercase();
        lower.ends_with(".pdb") || lower.ends_with(".mdb")
    })
}

impl NuGetAdapter {
    fn read_nuspec(content: &[u8]) -> Result<NuSpecMetadata> {
        let entries = zip_entry_names(content)?;
        let Some(nuspec_entry) = entries
            .iter()
            .find(|name| name.to_lowercase().ends_with(".nuspec"))
            .cloned()
        else {
            return Err(RegistryError::ValidationFailed(
                "package contains no .nuspec manifest".to_string(),
            ));
        };
        let xml_bytes = read_zip_entry(content, &nuspec_entry)?;
        let xml = String::from_utf8_lossy(&xml_bytes);
        parse_nuspec(&xml)
    }

    /// Symbol packages: flagged via package type, pushed with the symbol
    /// content type, or simply shipping debug files.
    fn detect_symbol_package(artifact: &Artifact, content: &[u8]) -> bool {
        if artifact.content_type == SYMBOL_CONTENT_TYPE {
            return true;
        }
        if let ArtifactMetadata::Nuget(meta) = &artifact.metadata
            && meta.is_symbol_package()
        {
            return true;
        }
        zip_entry_names(content)
            .map(|entries| has_debug_symbols(&entries))
            .unwrap_or(false)
    }
}

#[async_trait::async_trait]
impl FormatAdapter for NuGetAdapter {
    fn registry(&self) -> &'static str {
        "nuget"
    }

    // Package ids are case-insensitive; rows and paths keep the lowercase
    // form, the nuspec keeps the author's casing.
    fn sanitize_name(&self, name: &str) -> String {
        name.to_lowercase()
    }

    fn validate(&self, artifact: &Artifact, content: &[u8]) -> Result<()> {
        if !is_valid_package_id(&artifact.name) {
            return Err(RegistryError::ValidationFailed(format!(
                "invalid NuGet package id: {}",
                artifact.name
            )));
        }
        if !is_semver(&artifact.version) {
            return Err(RegistryError::ValidationFailed(format!(
                "invalid NuGet version: {}",
                artifact.version
            )));
        }

        let nuspec = Self::read_nuspec(content)?;
        if !nuspec.id.eq_ignore_ascii_case(&artifact.name) {
            return Err(RegistryError::ValidationFailed(format!(
                "nuspec id {} does not match package id {}",
                nuspec.id, artifact.name
            )));
        }
        if nuspec.version != artifact.version {
            return Err(RegistryError::ValidationFailed(format!(
                "nuspec version {} does not match package version {}",
                nuspec.version, artifact.version
            )));
        }

        if Self::detect_symbol_package(artifact, content) {
            let entries = zip_entry_names(content)?;
            if !has_debug_symbols(&entries) {
                return Err(RegistryError::ValidationFailed(
                    "invalid symbol package: no .pdb or .mdb entries".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn extract_metadata(&self, content: &[u8]) -> Result<ArtifactMetadata> {
        Ok(ArtifactMetadata::Nuget(Self::read_nuspec(content)?))
    }

    /// Layout: `nuget/<id>/<version>/<id>.<version>.nupkg` (lowercased).
    fn storage_path(&self, name: &str, version: &str) -> String {
        let name = name.to_lowercase();
        let version = version.to_lowercase();
        format!("nuget/{name}/{version}/{name}.{version}.nupkg")
    }

    fn content_type(&self, artifact: &Artifact) -> String {
        if artifact.content_type == SYMBOL_CONTENT_TYPE {
            SYMBOL_CONTENT_TYPE.to_string()
        } else {
            "application/octet-stream".to_string()
        }
    }

    async fn upload_hook(
        &self,
        ctx: &OpContext,
        artifact: &mut Artifact,
        content: &[u8],
        blobs: &dyn BlobStore,
    ) -> Result<()> {
        if Self::detect_symbol_package(artifact, content) {
            artifact.content_type = SYMBOL_CONTENT_TYPE.to_string();
            artifact.storage_path = symbol_storage_path(&artifact.name, &artifact.version);
        } else {
            artifact.content_type = self.content_type(artifact);
        }
        blobs
            .store(ctx, &artifact.storage_path, content, &artifact.content_type)
            .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// nuspec XML parsing
// ---------------------------------------------------------------------------

fn attr_map(element: &BytesStart<'_>) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for attr in element.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        if let Ok(value) = attr.unescape_value() {
            map.insert(key, value.into_owned());
        }
    }
    map
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn split_list(value: &str, separator: char) -> Vec<String> {
    value
        .split(separator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_nuspec(xml: &str) -> Result<NuSpecMetadata> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut meta = NuSpecMetadata::default();
    let mut stack: Vec<String> = Vec::new();
    let mut license_type: Option<String> = None;
    let mut dependency_groups: Vec<serde_json::Value> = Vec::new();
    let mut flat_dependencies: Vec<serde_json::Value> = Vec::new();
    let mut current_group: Option<(String, Vec<serde_json::Value>)> = None;
    let mut framework_assemblies: Vec<serde_json::Value> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                let name =
                    String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
                let attrs = attr_map(&element);
                match name.as_str() {
                    "metadata" => {
                        meta.min_client_version = attrs.get("minClientVersion").cloned();
                    }
                    "license" => {
                        license_type = attrs.get("type").cloned();
                    }
                    "group" => {
                        current_group = Some((
                            attrs.get("targetFramework").cloned().unwrap_or_default(),
                            Vec::new(),
                        ));
                    }
                    _ => {}
                }
                stack.push(name);
            }
            Ok(Event::Empty(element)) => {
                let name =
                    String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
                let attrs = attr_map(&element);
                match name.as_str() {
                    "dependency" => {
                        let dep = serde_json::json!({
                            "id": attrs.get("id").cloned().unwrap_or_default(),
                            "version": attrs.get("version").cloned().unwrap_or_default(),
                        });
                        match &mut current_group {
                            Some((_, deps)) => deps.push(dep),
                            None => flat_dependencies.push(dep),
                        }
                    }
                    "packageType" => {
                        if let Some(type_name) = attrs.get("name") {
                            meta.package_types.push(type_name.clone());
                        }
                    }
                    "repository" => {
                        meta.repository = Some(serde_json::json!({
                            "type": attrs.get("type").cloned().unwrap_or_default(),
                            "url": attrs.get("url").cloned().unwrap_or_default(),
                        }));
                    }
                    "frameworkAssembly" => {
                        framework_assemblies.push(serde_json::json!({
                            "assemblyName": attrs.get("assemblyName").cloned().unwrap_or_default(),
                            "targetFramework": attrs.get("targetFramework").cloned().unwrap_or_default(),
                        }));
                    }
                    "group" => {
                        dependency_groups.push(serde_json::json!({
                            "targetFramework": attrs.get("targetFramework").cloned().unwrap_or_default(),
                            "dependencies": [],
                        }));
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(text)) => {
                let value = text
                    .unescape()
                    .map(|v| v.into_owned())
                    .unwrap_or_default();
                let value = value.trim().to_string();
                if value.is_empty() {
                    continue;
                }
                match stack.last().map(String::as_str) {
                    Some("id") => meta.id = value,
                    Some("version") => meta.version = value,
                    Some("title") => meta.title = Some(value),
                    Some("authors") => meta.authors = split_list(&value, ','),
                    Some("owners") => meta.owners = split_list(&value, ','),
                    Some("description") => meta.description = Some(value),
                    Some("summary") => meta.summary = Some(value),
                    Some("tags") => meta.tags = value.split_whitespace().map(str::to_string).collect(),
                    Some("projectUrl") => meta.project_url = Some(value),
                    Some("licenseUrl") => meta.license_url = Some(value),
                    Some("iconUrl") => meta.icon_url = Some(value),
                    Some("copyright") => meta.copyright = Some(value),
                    Some("language") => meta.language = Some(value),
                    Some("releaseNotes") => meta.release_notes = Some(value),
                    Some("requireLicenseAcceptance") => {
                        meta.require_license_acceptance = parse_bool(&value);
                    }
                    Some("developmentDependency") => {
                        meta.development_dependency = parse_bool(&value);
                    }
                    Some("license") => {
                        meta.license = Some(serde_json::json!({
                            "type": license_type.clone().unwrap_or_default(),
                            "value": value,
                        }));
                    }
                    _ => {}
                }
            }
            Ok(Event::End(element)) => {
                let name =
                    String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
                if name == "group"
                    && let Some((target_framework, deps)) = current_group.take()
                {
                    dependency_groups.push(serde_json::json!({
                        "targetFramework": target_framework,
                        "dependencies": deps,
                    }));
                }
                stack.pop();
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                return Err(RegistryError::ValidationFailed(format!(
                    "invalid nuspec XML: {err}"
                )));
            }
            _ => {}
        }
    }

    if meta.id.is_empty() || meta.version.is_empty() {
        return Err(RegistryError::ValidationFailed(
            "nuspec is missing id or version".to_string(),
        ));
    }

    if !dependency_groups.is_empty() {
        meta.dependencies = Some(serde_json::json!({ "groups": dependency_groups }));
    } else if !flat_dependencies.is_empty() {
        meta.dependencies = Some(serde_json::Value::Array(flat_dependencies));
    }
    if !framework_assemblies.is_empty() {
        meta.framework_assemblies = Some(serde_json::Value::Array(framework_assemblies));
    }

    Ok(meta)
}
