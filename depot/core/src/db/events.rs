use super::Database;
use crate::error::Result;
use chrono::Utc;
use uuid::Uuid;

impl Database {
    /// Minimal download-event log; callers treat failures as non-fatal.
    pub async fn record_download_event(
        &self,
        artifact_id: &str,
        user_id: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO download_events (id, artifact_id, user_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(artifact_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn download_event_count(&self, artifact_id: &str) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM download_events WHERE artifact_id = ?")
                .bind(artifact_id)
                .fetch_one(self.pool())
                .await?;
        Ok(count)
    }
}
