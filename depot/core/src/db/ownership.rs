use super::Database;
use super::models::{OwnerRole, PackageOwnership};
use crate::error::{RegistryError, Result};
use chrono::Utc;
use uuid::Uuid;

impl Database {
    pub async fn ownerships_for_package(&self, package_key: &str) -> Result<Vec<PackageOwnership>> {
        let rows = sqlx::query_as::<_, PackageOwnership>(
            "SELECT * FROM package_ownerships WHERE package_key = ? ORDER BY granted_at ASC",
        )
        .bind(package_key)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    pub async fn ownership_for_user(
        &self,
        package_key: &str,
        user_id: &str,
    ) -> Result<Option<PackageOwnership>> {
        let row = sqlx::query_as::<_, PackageOwnership>(
            "SELECT * FROM package_ownerships WHERE package_key = ? AND user_id = ?",
        )
        .bind(package_key)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    pub async fn count_role(&self, package_key: &str, role: OwnerRole) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM package_ownerships WHERE package_key = ? AND role = ?",
        )
        .bind(package_key)
        .bind(role.as_str())
        .fetch_one(self.pool())
        .await?;
        Ok(count)
    }

    /// Insert-or-update keyed by (package_key, user_id).
    pub async fn upsert_ownership(
        &self,
        package_key: &str,
        user_id: &str,
        role: OwnerRole,
        granted_by: &str,
    ) -> Result<PackageOwnership> {
        let row = PackageOwnership {
            id: Uuid::new_v4().to_string(),
            package_key: package_key.to_string(),
            user_id: user_id.to_string(),
            role,
            granted_by: granted_by.to_string(),
            granted_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO package_ownerships (id, package_key, user_id, role, granted_by, granted_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(package_key, user_id)
             DO UPDATE SET role = excluded.role,
                           granted_by = excluded.granted_by,
                           granted_at = excluded.granted_at",
        )
        .bind(&row.id)
        .bind(&row.package_key)
        .bind(&row.user_id)
        .bind(row.role.as_str())
        .bind(&row.granted_by)
        .bind(row.granted_at)
        .execute(self.pool())
        .await?;

        Ok(row)
    }

    pub async fn delete_ownership(&self, package_key: &str, user_id: &str) -> Result<()> {
        let result =
            sqlx::query("DELETE FROM package_ownerships WHERE package_key = ? AND user_id = ?")
                .bind(package_key)
                .bind(user_id)
                .execute(self.pool())
                .await?;
        if result.rows_affected() == 0 {
            return Err(RegistryError::NotFound(format!(
                "ownership {package_key}/{user_id}"
            )));
        }
        Ok(())
    }
}
