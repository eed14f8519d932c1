use crate::db::Database;
use crate::db::models::{OwnerRole, PackageOwnership, User};
use crate::error::{RegistryError, Result};

/// Package-scoped RBAC over the ownership table.
///
/// The package key is `{registry}:{name}`; Maven names themselves contain a
/// colon, so the key grammar is simply whatever the adapter emits behind the
/// registry prefix.
#[derive(Clone)]
pub struct OwnershipService {
    db: Database,
}

pub fn package_key(registry: &str, name: &str) -> String {
    format!("{registry}:{name}")
}

impl OwnershipService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn can_user_publish(&self, registry: &str, name: &str, user: &User) -> Result<bool> {
        if user.is_admin {
            return Ok(true);
        }
        let key = package_key(registry, name);
        let rows = self.db.ownerships_for_package(&key).await?;
        if rows.is_empty() {
            // First-publisher bootstrap: a brand-new package is open to any
            // active user.
            return Ok(true);
        }
        Ok(rows.iter().any(|row| {
            row.user_id == user.id
                && matches!(row.role, OwnerRole::Owner | OwnerRole::Maintainer)
        }))
    }

    pub async fn can_user_delete(&self, registry: &str, name: &str, user: &User) -> Result<bool> {
        if user.is_admin {
            return Ok(true);
        }
        self.has_role(registry, name, &user.id, OwnerRole::Owner).await
    }

    pub async fn can_user_manage_ownership(
        &self,
        registry: &str,
        name: &str,
        user: &User,
    ) -> Result<bool> {
        if user.is_admin {
            return Ok(true);
        }
        self.has_role(registry, name, &user.id, OwnerRole::Owner).await
    }

    async fn has_role(
        &self,
        registry: &str,
        name: &str,
        user_id: &str,
        role: OwnerRole,
    ) -> Result<bool> {
        let key = package_key(registry, name);
        let row = self.db.ownership_for_user(&key, user_id).await?;
        Ok(row.map(|r| r.role == role).unwrap_or(false))
    }

    pub async fn add_owner(
        &self,
        registry: &str,
        name: &str,
        target_user_id: &str,
        role: OwnerRole,
        acting_user: &User,
    ) -> Result<PackageOwnership> {
        if !self.can_user_manage_ownership(registry, name, acting_user).await? {
            return Err(RegistryError::InsufficientPermissions);
        }
        let key = package_key(registry, name);
        self.db
            .upsert_ownership(&key, target_user_id, role, &acting_user.id)
            .await
    }

    /// Removing the sole remaining owner is refused; every package with any
    /// ownership rows keeps at least one owner.
    pub async fn remove_owner(
        &self,
        registry: &str,
        name: &str,
        target_user_id: &str,
        acting_user: &User,
    ) -> Result<()> {
        if !self.can_user_manage_ownership(registry, name, acting_user).await? {
            return Err(RegistryError::InsufficientPermissions);
        }
        let key = package_key(registry, name);
        let Some(target) = self.db.ownership_for_user(&key, target_user_id).await? else {
            return Err(RegistryError::NotFound(format!(
                "ownership {key}/{target_user_id}"
            )));
        };
        if target.role == OwnerRole::Owner
            && self.db.count_role(&key, OwnerRole::Owner).await? == 1
        {
            return Err(RegistryError::LastOwner(key));
        }
        self.db.delete_ownership(&key, target_user_id).await
    }

    pub async fn list_owners(&self, registry: &str, name: &str) -> Result<Vec<PackageOwnership>> {
        self.db
            .ownerships_for_package(&package_key(registry, name))
            .await
    }

    /// Idempotent first-publish bootstrap: a no-op when any ownership rows
    /// already exist, otherwise one self-granted owner row.
    pub async fn establish_initial_ownership(
        &self,
        registry: &str,
        name: &str,
        user_id: &str,
    ) -> Result<()> {
        let key = package_key(registry, name);
        if !self.db.ownerships_for_package(&key).await?.is_empty() {
            return Ok(());
        }
        self.db
            .upsert_ownership(&key, user_id, OwnerRole::Owner, user_id)
            .await?;
        Ok(())
    }
}
