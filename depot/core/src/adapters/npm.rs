use super::archive::{basename, find_tar_entry, gunzip};
use super::{ArtifactMetadata, FormatAdapter, is_prerelease};
use crate::db::models::Artifact;
use crate::error::{RegistryError, Result};
use chrono::{SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

const MAX_NAME_LEN: usize = 214;

static NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(@[a-z0-9-~][a-z0-9._~-]*/)?[a-z0-9-~][a-z0-9._~-]*$").unwrap()
});

static VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z.+-]+$").unwrap());

/// Fields lifted from the embedded `package.json`. Loosely-typed fields
/// (author, repository, bugs) stay as raw JSON values; npm allows both
/// string and object shapes there.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NpmMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub dependencies: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub dev_dependencies: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub peer_dependencies: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bugs: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub scripts: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub engines: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contributors: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub dist_tags: HashMap<String, String>,
    /// `created`/`modified`/version → RFC 3339 stamp.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub time: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct PackageJson {
    name: String,
    version: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    license: Option<serde_json::Value>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    dependencies: HashMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: HashMap<String, String>,
    #[serde(default, rename = "peerDependencies")]
    peer_dependencies: HashMap<String, String>,
    #[serde(default)]
    homepage: Option<String>,
    #[serde(default)]
    bugs: Option<serde_json::Value>,
    #[serde(default)]
    scripts: HashMap<String, String>,
    #[serde(default)]
    engines: HashMap<String, String>,
    #[serde(default)]
    contributors: Option<serde_json::Value>,
    #[serde(default)]
    author: Option<serde_json::Value>,
    #[serde(default)]
    repository: Option<serde_json::Value>,
    #[serde(default, rename = "dist-tags")]
    dist_tags: HashMap<String, String>,
}

pub struct NpmAdapter;

impl NpmAdapter {
    fn read_package_json(content: &[u8]) -> Result<PackageJson> {
        let tar_bytes = gunzip(content)?;
        let Some((_, manifest)) =
            find_tar_entry(&tar_bytes, |path| basename(path) == "package.json")?
        else {
            return Err(RegistryError::ValidationFailed(
                "tarball contains no package.json".to_string(),
            ));
        };
        serde_json::from_slice(&manifest)
            .map_err(|err| RegistryError::ValidationFailed(format!("invalid package.json: {err}")))
    }
}

pub fn is_valid_package_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= MAX_NAME_LEN && NAME.is_match(name)
}

#[async_trait::async_trait]
impl FormatAdapter for NpmAdapter {
    fn registry(&self) -> &'static str {
        "npm"
    }

    fn sanitize_name(&self, name: &str) -> String {
        name.to_lowercase()
    }

    fn validate(&self, artifact: &Artifact, content: &[u8]) -> Result<()> {
        if !is_valid_package_name(&artifact.name) {
            return Err(RegistryError::ValidationFailed(format!(
                "invalid npm package name: {}",
                artifact.name
            )));
        }
        if artifact.version.is_empty() || !VERSION.is_match(&artifact.version) {
            return Err(RegistryError::ValidationFailed(format!(
                "invalid npm version: {}",
                artifact.version
            )));
        }

        let pkg = Self::read_package_json(content)?;
        if pkg.name != artifact.name {
            return Err(RegistryError::ValidationFailed(format!(
                "package.json name {} does not match artifact name {}",
                pkg.name, artifact.name
            )));
        }
        if pkg.version != artifact.version {
            return Err(RegistryError::ValidationFailed(format!(
                "package.json version {} does not match artifact version {}",
                pkg.version, artifact.version
            )));
        }
        Ok(())
    }

    fn extract_metadata(&self, content: &[u8]) -> Result<ArtifactMetadata> {
        let pkg = Self::read_package_json(content)?;

        let mut dist_tags = pkg.dist_tags;
        if dist_tags.is_empty() && !is_prerelease(&pkg.version) {
            dist_tags.insert("latest".to_string(), pkg.version.clone());
        }

        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut time = HashMap::new();
        time.insert("created".to_string(), now.clone());
        time.insert("modified".to_string(), now.clone());
        time.insert(pkg.version.clone(), now);

        Ok(ArtifactMetadata::Npm(NpmMetadata {
            description: pkg.description,
            license: pkg.license,
            keywords: pkg.keywords,
            dependencies: pkg.dependencies,
            dev_dependencies: pkg.dev_dependencies,
            peer_dependencies: pkg.peer_dependencies,
            homepage: pkg.homepage,
            bugs: pkg.bugs,
            scripts: pkg.scripts,
            engines: pkg.engines,
            contributors: pkg.contributors,
            author: pkg.author,
            repository: pkg.repository,
            dist_tags,
            time,
        }))
    }

    /// Layout: `npm/<name, scope slash %2f-encoded>/<version>.tgz`
    fn storage_path(&self, name: &str, version: &str) -> String {
        format!("npm/{}/{version}.tgz", name.replace('/', "%2f"))
    }

    fn content_type(&self, _artifact: &Artifact) -> String {
        "application/octet-stream".to_string()
    }
}
