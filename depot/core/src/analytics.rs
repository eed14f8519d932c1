use crate::db::Database;

/// Download accounting. The counter bump is a single atomic SQL expression;
/// the event append is best-effort. Neither may fail a download.
#[derive(Clone)]
pub struct AnalyticsService {
    db: Database,
}

impl AnalyticsService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn record_download(&self, artifact_id: &str, user_id: Option<&str>) {
        if let Err(err) = self.db.increment_downloads(artifact_id).await {
            tracing::warn!(artifact_id, %err, "download counter update failed");
        }
        if let Err(err) = self.db.record_download_event(artifact_id, user_id).await {
            tracing::warn!(artifact_id, %err, "download event append failed");
        }
    }
}
