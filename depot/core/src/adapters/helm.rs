use super::archive::{basename, find_tar_entry, gunzip};
use super::{ArtifactMetadata, FormatAdapter};
use crate::db::models::Artifact;
use crate::error::{RegistryError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

const MAX_NAME_LEN: usize = 63;

// DNS-1123 label, the same grammar Helm itself enforces.
static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").unwrap());

/// `Chart.yaml` fields carried on the artifact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ChartYaml {
    name: String,
    version: String,
    #[serde(default, rename = "apiVersion")]
    api_version: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, rename = "appVersion")]
    app_version: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    home: Option<String>,
    #[serde(default)]
    sources: Vec<String>,
}

pub struct HelmAdapter;

pub fn is_valid_chart_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= MAX_NAME_LEN && NAME.is_match(name)
}

/// (name, version) as Chart.yaml declares them; chart pushes carry no
/// coordinates in the URL.
pub fn chart_identity(content: &[u8]) -> Result<(String, String)> {
    let chart = read_chart_yaml(content)?;
    Ok((chart.name, chart.version))
}

fn read_chart_yaml(content: &[u8]) -> Result<ChartYaml> {
    let tar_bytes = gunzip(content)?;
    let Some((_, chart)) = find_tar_entry(&tar_bytes, |path| basename(path) == "Chart.yaml")?
    else {
        return Err(RegistryError::ValidationFailed(
            "chart archive contains no Chart.yaml".to_string(),
        ));
    };
    serde_yaml::from_slice(&chart)
        .map_err(|err| RegistryError::ValidationFailed(format!("invalid Chart.yaml: {err}")))
}

#[async_trait::async_trait]
impl FormatAdapter for HelmAdapter {
    fn registry(&self) -> &'static str {
        "helm"
    }

    fn validate(&self, artifact: &Artifact, content: &[u8]) -> Result<()> {
        if !is_valid_chart_name(&artifact.name) {
            return Err(RegistryError::ValidationFailed(format!(
                "invalid chart name: {}",
                artifact.name
            )));
        }

        // The version is chart-internal: Chart.yaml is authoritative and the
        // artifact identity must agree with it.
        let chart = read_chart_yaml(content)?;
        if chart.name != artifact.name {
            return Err(RegistryError::ValidationFailed(format!(
                "Chart.yaml name {} does not match chart name {}",
                chart.name, artifact.name
            )));
        }
        if chart.version != artifact.version {
            return Err(RegistryError::ValidationFailed(format!(
                "Chart.yaml version {} does not match chart version {}",
                chart.version, artifact.version
            )));
        }
        Ok(())
    }

    fn extract_metadata(&self, content: &[u8]) -> Result<ArtifactMetadata> {
        let chart = read_chart_yaml(content)?;
        Ok(ArtifactMetadata::Helm(ChartMetadata {
            api_version: chart.api_version,
            description: chart.description,
            app_version: chart.app_version,
            keywords: chart.keywords,
            home: chart.home,
            sources: chart.sources,
        }))
    }

    /// Layout: `helm/charts/<name>-<version>.tgz`
    fn storage_path(&self, name: &str, version: &str) -> String {
        format!("helm/charts/{name}-{version}.tgz")
    }

    fn content_type(&self, _artifact: &Artifact) -> String {
        "application/gzip".to_string()
    }
}
