use crate::db::Database;
use crate::db::models::RegistrySetting;
use crate::error::Result;

/// Runtime per-format enable flags; nine rows seeded at bootstrap.
#[derive(Clone)]
pub struct SettingsService {
    db: Database,
}

pub const KNOWN_REGISTRIES: [(&str, &str); 9] = [
    ("npm", "npm package registry"),
    ("nuget", "NuGet package registry (including symbol packages)"),
    ("maven", "Maven artifact repository"),
    ("go", "Go module proxy"),
    ("helm", "Helm chart repository"),
    ("oci", "OCI / Docker distribution registry"),
    ("cargo", "Cargo crate registry"),
    ("rubygems", "RubyGems registry"),
    ("opa", "Open Policy Agent bundle registry"),
];

impl SettingsService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn bootstrap_defaults(&self) -> Result<()> {
        for (name, description) in KNOWN_REGISTRIES {
            self.db.seed_setting(name, description).await?;
        }
        Ok(())
    }

    /// Fail-closed: a missing row reads as disabled.
    pub async fn is_registry_enabled(&self, registry_name: &str) -> Result<bool> {
        Ok(self
            .db
            .setting_by_name(registry_name)
            .await?
            .map(|s| s.enabled)
            .unwrap_or(false))
    }

    pub async fn list(&self) -> Result<Vec<RegistrySetting>> {
        self.db.all_settings().await
    }

    pub async fn enable(&self, registry_name: &str, updated_by: &str) -> Result<()> {
        self.db
            .set_registry_enabled(registry_name, true, updated_by)
            .await
    }

    pub async fn disable(&self, registry_name: &str, updated_by: &str) -> Result<()> {
        self.db
            .set_registry_enabled(registry_name, false, updated_by)
            .await
    }

    pub async fn update_description(
        &self,
        registry_name: &str,
        description: &str,
        updated_by: &str,
    ) -> Result<()> {
        self.db
            .set_registry_description(registry_name, description, updated_by)
            .await
    }
}
