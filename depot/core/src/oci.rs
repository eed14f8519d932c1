use crate::adapters::oci::{compute_digest, is_valid_repository};
use crate::blob::BlobStore;
use crate::context::OpContext;
use crate::error::{RegistryError, Result};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

const SESSION_IDLE_HOURS: i64 = 24;

const BLOB_CONTENT_TYPE: &str = "application/octet-stream";

/// One in-flight chunked blob upload. Lives in memory only; the bytes
/// accumulate at `temp_path` in the blob store.
#[derive(Debug, Clone)]
pub struct UploadSession {
    pub id: String,
    pub repository: String,
    pub user_id: String,
    pub temp_path: String,
    pub size: i64,
    pub digest: Option<String>,
    pub started_at: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
}

/// Outcome of a completed upload.
#[derive(Debug, Clone)]
pub struct CompletedUpload {
    pub path: String,
    pub digest: String,
}

/// Chunked-upload state machine.
///
/// Two locking tiers: the manager mutex guards the session map (insert,
/// remove, sweep), a per-session mutex serializes append/complete/cancel on
/// one session. Chunks for distinct sessions proceed in parallel.
pub struct UploadSessionManager {
    blobs: Arc<dyn BlobStore>,
    sessions: Mutex<HashMap<String, Arc<Mutex<UploadSession>>>>,
}

impl UploadSessionManager {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            blobs,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub async fn start_upload(&self, repository: &str, user_id: &str) -> Result<UploadSession> {
        if !is_valid_repository(repository) {
            return Err(RegistryError::ValidationFailed(format!(
                "invalid repository name: {repository}"
            )));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let session = UploadSession {
            id: id.clone(),
            repository: repository.to_string(),
            user_id: user_id.to_string(),
            temp_path: format!("temp/uploads/{repository}/{id}"),
            size: 0,
            digest: None,
            started_at: now,
            last_update: now,
        };

        self.sessions
            .lock()
            .await
            .insert(id, Arc::new(Mutex::new(session.clone())));
        Ok(session)
    }

    pub async fn get_session(&self, session_id: &str) -> Option<UploadSession> {
        let arc = self.sessions.lock().await.get(session_id).cloned()?;
        let session = arc.lock().await;
        Some(session.clone())
    }

    async fn session_arc(&self, session_id: &str) -> Result<Arc<Mutex<UploadSession>>> {
        self.sessions
            .lock()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(format!("upload session {session_id}")))
    }

    /// Appends one chunk. The first chunk stores the temp blob; later
    /// chunks read it back, concatenate, and store again. Correctness under
    /// interleaving matters here, not throughput.
    pub async fn append_chunk(
        &self,
        ctx: &OpContext,
        session_id: &str,
        chunk: &[u8],
    ) -> Result<i64> {
        let arc = self.session_arc(session_id).await?;
        let mut session = arc.lock().await;

        let combined = if self.blobs.exists(ctx, &session.temp_path).await? {
            let mut existing = self.blobs.retrieve_bytes(ctx, &session.temp_path).await?;
            existing.extend_from_slice(chunk);
            existing
        } else {
            chunk.to_vec()
        };

        self.blobs
            .store(ctx, &session.temp_path, &combined, BLOB_CONTENT_TYPE)
            .await?;

        session.size = combined.len() as i64;
        session.last_update = Utc::now();
        Ok(session.size)
    }

    /// Verifies the digest over everything received, promotes the bytes to
    /// `oci/{repo}/blobs/{digest}`, and drops the session.
    pub async fn complete_upload(
        &self,
        ctx: &OpContext,
        session_id: &str,
        expected_digest: Option<&str>,
    ) -> Result<CompletedUpload> {
        let arc = self.session_arc(session_id).await?;
        let mut session = arc.lock().await;

        let bytes = self.blobs.retrieve_bytes(ctx, &session.temp_path).await?;
        let digest = compute_digest(&bytes);

        if let Some(expected) = expected_digest
            && !expected.is_empty()
            && expected != digest
        {
            return Err(RegistryError::DigestMismatch {
                expected: expected.to_string(),
                computed: digest,
            });
        }

        let final_path = format!("oci/{}/blobs/{digest}", session.repository);
        self.blobs
            .store(ctx, &final_path, &bytes, BLOB_CONTENT_TYPE)
            .await?;
        self.blobs.delete(ctx, &session.temp_path).await?;

        session.digest = Some(digest.clone());
        drop(session);
        self.sessions.lock().await.remove(session_id);

        Ok(CompletedUpload {
            path: final_path,
            digest,
        })
    }

    pub async fn cancel_upload(&self, ctx: &OpContext, session_id: &str) -> Result<()> {
        let arc = self.session_arc(session_id).await?;
        let session = arc.lock().await;
        self.blobs.delete(ctx, &session.temp_path).await?;
        drop(session);
        self.sessions.lock().await.remove(session_id);
        Ok(())
    }

    /// Expires sessions idle past the 24h window. `now` is injected so the
    /// scheduler (an hourly interval in the service) and tests share one
    /// code path.
    pub async fn sweep(&self, ctx: &OpContext, now: DateTime<Utc>) -> usize {
        let candidates: Vec<(String, Arc<Mutex<UploadSession>>)> = {
            let sessions = self.sessions.lock().await;
            sessions
                .iter()
                .map(|(id, arc)| (id.clone(), arc.clone()))
                .collect()
        };

        let mut expired = Vec::new();
        for (id, arc) in candidates {
            let session = arc.lock().await;
            if now - session.last_update > Duration::hours(SESSION_IDLE_HOURS) {
                if let Err(err) = self.blobs.delete(ctx, &session.temp_path).await {
                    tracing::warn!(session_id = id.as_str(), %err, "expired temp cleanup failed");
                }
                expired.push(id);
            }
        }

        let mut sessions = self.sessions.lock().await;
        for id in &expired {
            sessions.remove(id);
            tracing::info!(session_id = id.as_str(), "upload session expired");
        }
        expired.len()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

/// Tags for a repository: the manifests prefix minus digest-keyed entries.
pub async fn list_tags(
    ctx: &OpContext,
    blobs: &dyn BlobStore,
    repository: &str,
) -> Result<Vec<String>> {
    let prefix = format!("oci/{repository}/manifests/");
    let entries = blobs.list(ctx, &prefix).await?;
    let mut tags: Vec<String> = entries
        .iter()
        .filter_map(|path| path.strip_prefix(&prefix))
        .filter(|name| !name.starts_with("sha256:"))
        .map(str::to_string)
        .collect();
    tags.sort();
    Ok(tags)
}
