use super::{BlobStore, StoredBlob};
use crate::context::OpContext;
use crate::error::{RegistryError, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

const WRITE_CHUNK: usize = 64 * 1024;

/// Filesystem-backed blob store rooted at a single directory.
///
/// Writes land in `{path}.tmp.{nanos}`, are fsynced, then renamed over the
/// target, so readers never observe a partial blob. A readers-writer lock
/// serializes writes against everything else; reads run in parallel.
pub struct LocalBlobStore {
    root: PathBuf,
    lock: RwLock<()>,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a relative blob path, rejecting traversal components.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        if path.is_empty() || path.contains('\\') {
            return Err(RegistryError::Io(format!("invalid blob path: {path}")));
        }
        let rel = Path::new(path);
        if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(RegistryError::Io(format!("invalid blob path: {path}")));
        }
        Ok(self.root.join(rel))
    }

    async fn create_parent(&self, target: &Path) -> Result<()> {
        let Some(parent) = target.parent() else {
            return Ok(());
        };
        if tokio::fs::metadata(parent).await.is_ok() {
            return Ok(());
        }
        tokio::fs::create_dir_all(parent).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut dir = parent.to_path_buf();
            while dir.starts_with(&self.root) && dir != self.root {
                let _ = tokio::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755))
                    .await;
                match dir.parent() {
                    Some(p) => dir = p.to_path_buf(),
                    None => break,
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(
        &self,
        ctx: &OpContext,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<StoredBlob> {
        ctx.ensure_active()?;
        let target = self.resolve(path)?;

        let _guard = self.lock.write().await;
        ctx.ensure_active()?;

        self.create_parent(&target).await?;

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let tmp = target.with_file_name(format!(
            "{}.tmp.{nanos}",
            target
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("blob")
        ));

        let result = write_and_hash(&tmp, bytes).await;
        let sha256 = match result {
            Ok(digest) => digest,
            Err(err) => {
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(err);
            }
        };

        if let Err(err) = tokio::fs::rename(&tmp, &target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(err.into());
        }

        tracing::debug!(
            path,
            content_type,
            sha256 = sha256.as_str(),
            size = bytes.len(),
            "blob stored"
        );

        Ok(StoredBlob {
            sha256,
            size: bytes.len() as i64,
        })
    }

    async fn retrieve(&self, ctx: &OpContext, path: &str) -> Result<tokio::fs::File> {
        ctx.ensure_active()?;
        let target = self.resolve(path)?;
        let _guard = self.lock.read().await;
        match tokio::fs::File::open(&target).await {
            Ok(file) => Ok(file),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(RegistryError::NotFound(format!("blob {path}")))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn delete(&self, ctx: &OpContext, path: &str) -> Result<()> {
        ctx.ensure_active()?;
        let target = self.resolve(path)?;
        let _guard = self.lock.write().await;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn exists(&self, ctx: &OpContext, path: &str) -> Result<bool> {
        ctx.ensure_active()?;
        let target = self.resolve(path)?;
        let _guard = self.lock.read().await;
        Ok(tokio::fs::metadata(&target).await.is_ok())
    }

    async fn size(&self, ctx: &OpContext, path: &str) -> Result<i64> {
        ctx.ensure_active()?;
        let target = self.resolve(path)?;
        let _guard = self.lock.read().await;
        match tokio::fs::metadata(&target).await {
            Ok(meta) => Ok(meta.len() as i64),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(RegistryError::NotFound(format!("blob {path}")))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn list(&self, ctx: &OpContext, prefix: &str) -> Result<Vec<String>> {
        ctx.ensure_active()?;
        let _guard = self.lock.read().await;

        // The prefix may name a directory or a partial final segment; walk
        // the deepest existing directory and string-filter the results.
        let full = self.root.join(prefix.trim_end_matches('/'));
        let (walk_root, filter) = if tokio::fs::metadata(&full).await.map(|m| m.is_dir()).unwrap_or(false)
        {
            (full, None)
        } else {
            match full.parent() {
                Some(parent) if tokio::fs::metadata(parent).await.is_ok() => {
                    (parent.to_path_buf(), Some(prefix.trim_end_matches('/').to_string()))
                }
                _ => return Ok(Vec::new()),
            }
        };

        let mut found = Vec::new();
        let mut stack = vec![walk_root];
        while let Some(dir) = stack.pop() {
            ctx.ensure_active()?;
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            };
            while let Some(entry) = entries.next_entry().await? {
                ctx.ensure_active()?;
                let path = entry.path();
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    stack.push(path);
                    continue;
                }
                let Ok(rel) = path.strip_prefix(&self.root) else {
                    continue;
                };
                let rel = rel.to_string_lossy().replace('\\', "/");
                if rel.contains(".tmp.") {
                    continue;
                }
                if let Some(filter) = &filter
                    && !rel.starts_with(filter.as_str())
                {
                    continue;
                }
                found.push(rel);
            }
        }
        found.sort();
        Ok(found)
    }
}

async fn write_and_hash(tmp: &Path, bytes: &[u8]) -> Result<String> {
    let mut file = tokio::fs::File::create(tmp).await?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = file
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .await;
    }

    let mut hasher = Sha256::new();
    for chunk in bytes.chunks(WRITE_CHUNK) {
        hasher.update(chunk);
        file.write_all(chunk).await?;
    }
    file.sync_all().await?;
    Ok(format!("{:x}", hasher.finalize()))
}
