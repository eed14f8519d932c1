use crate::blob::BlobStore;
use crate::context::OpContext;
use crate::db::models::Artifact;
use crate::error::{RegistryError, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

mod archive;
pub mod cargo;
pub mod gomod;
pub mod helm;
pub mod maven;
pub mod npm;
pub mod nuget;
pub mod oci;
pub mod opa;
pub mod rubygems;

pub use cargo::CargoAdapter;
pub use gomod::GoAdapter;
pub use helm::HelmAdapter;
pub use maven::MavenAdapter;
pub use npm::NpmAdapter;
pub use nuget::NuGetAdapter;
pub use oci::OciAdapter;
pub use opa::OpaAdapter;
pub use rubygems::RubyGemsAdapter;

/// Typed per-format metadata, persisted as JSON with a `format`
/// discriminator so the artifacts table stays polymorphic at the column
/// level while adapters consume typed fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum ArtifactMetadata {
    Npm(npm::NpmMetadata),
    Nuget(nuget::NuSpecMetadata),
    Maven(maven::MavenMetadata),
    Go(gomod::GoMetadata),
    Helm(helm::ChartMetadata),
    Oci(oci::ManifestMetadata),
    Cargo(cargo::CrateMetadata),
    Rubygems(rubygems::GemMetadata),
    Opa(opa::BundleMetadata),
    #[default]
    None,
}

impl ArtifactMetadata {
    /// Searchable tag material, format permitting.
    pub fn tags(&self) -> Vec<String> {
        match self {
            Self::Npm(meta) => meta.keywords.clone(),
            Self::Nuget(meta) => meta.tags.clone(),
            Self::Helm(meta) => meta.keywords.clone(),
            Self::Cargo(meta) => meta.keywords.clone(),
            _ => Vec::new(),
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Npm(meta) => meta.description.as_deref(),
            Self::Nuget(meta) => meta.description.as_deref(),
            Self::Helm(meta) => meta.description.as_deref(),
            Self::Cargo(meta) => meta.description.as_deref(),
            Self::Rubygems(meta) => meta.summary.as_deref(),
            _ => None,
        }
    }
}

/// Capability set every format adapter satisfies. Download, list, and
/// delete have no adapter-level counterparts; those verbs live only on the
/// registry engine.
#[async_trait]
pub trait FormatAdapter: Send + Sync {
    /// Format tag, e.g. `npm`.
    fn registry(&self) -> &'static str;

    /// Format-normalized artifact name (lowercasing where the ecosystem is
    /// case-insensitive). Identity transform by default.
    fn sanitize_name(&self, name: &str) -> String {
        name.to_string()
    }

    /// Rejects invalid names, versions, or bytes with a reason.
    fn validate(&self, artifact: &Artifact, content: &[u8]) -> Result<()>;

    /// Pulls typed metadata out of the archive bytes.
    fn extract_metadata(&self, content: &[u8]) -> Result<ArtifactMetadata>;

    /// Deterministic storage path. Pure: same (name, version), same string.
    fn storage_path(&self, name: &str, version: &str) -> String;

    /// Content type recorded on the artifact row.
    fn content_type(&self, artifact: &Artifact) -> String;

    /// Stores the blob and stamps the content type. Formats with richer
    /// write fan-out (OCI manifests) override this.
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
        Ok(())
    }
}

/// Adapter lookup by format tag.
#[derive(Clone)]
pub struct AdapterRegistry {
    adapters: HashMap<&'static str, Arc<dyn FormatAdapter>>,
}

impl AdapterRegistry {
    pub fn with_defaults() -> Self {
        let mut adapters: HashMap<&'static str, Arc<dyn FormatAdapter>> = HashMap::new();
        for adapter in [
            Arc::new(NpmAdapter) as Arc<dyn FormatAdapter>,
            Arc::new(NuGetAdapter),
            Arc::new(MavenAdapter),
            Arc::new(GoAdapter),
            Arc::new(HelmAdapter),
            Arc::new(OciAdapter),
            Arc::new(CargoAdapter),
            Arc::new(RubyGemsAdapter),
            Arc::new(OpaAdapter),
        ] {
            adapters.insert(adapter.registry(), adapter);
        }
        Self { adapters }
    }

    pub fn get(&self, registry: &str) -> Result<Arc<dyn FormatAdapter>> {
        self.adapters
            .get(registry)
            .cloned()
            .ok_or_else(|| RegistryError::UnsupportedRegistry(registry.to_string()))
    }

    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<&'static str> = self.adapters.keys().copied().collect();
        tags.sort_unstable();
        tags
    }
}

static SEMVER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+\.\d+\.\d+(-[0-9A-Za-z.-]+)?(\+[0-9A-Za-z.-]+)?$").unwrap()
});

/// SemVer 2.0 shape shared by NuGet and Cargo versions.
pub(crate) fn is_semver(version: &str) -> bool {
    SEMVER.is_match(version)
}

/// A version with a `-` or `+` suffix is a prerelease/build and must not
/// become `latest` implicitly.
pub(crate) fn is_prerelease(version: &str) -> bool {
    version.contains('-') || version.contains('+')
}
