use crate::context::OpContext;
use crate::error::Result;
use async_trait::async_trait;

mod local;

pub use local::LocalBlobStore;

/// Outcome of a successful [`BlobStore::store`] call.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub sha256: String,
    pub size: i64,
}

/// Byte storage seam.
///
/// The local implementation below is the only one shipped; cloud object
/// stores would implement the same trait.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Writes `bytes` at `path` atomically. No partial file is ever visible;
    /// the integrity hash is computed in-line and logged.
    async fn store(
        &self,
        ctx: &OpContext,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<StoredBlob>;

    /// Opens the blob for reading. The caller closes the handle.
    async fn retrieve(&self, ctx: &OpContext, path: &str) -> Result<tokio::fs::File>;

    /// Removes the blob. Deleting a missing path is success.
    async fn delete(&self, ctx: &OpContext, path: &str) -> Result<()>;

    async fn exists(&self, ctx: &OpContext, path: &str) -> Result<bool>;

    async fn size(&self, ctx: &OpContext, path: &str) -> Result<i64>;

    /// Lists blob paths under `prefix`, relative to the store root. A
    /// non-existent prefix yields an empty list.
    async fn list(&self, ctx: &OpContext, prefix: &str) -> Result<Vec<String>>;

    /// Convenience: reads a whole blob into memory.
    async fn retrieve_bytes(&self, ctx: &OpContext, path: &str) -> Result<Vec<u8>> {
        use tokio::io::AsyncReadExt;
        let mut file = self.retrieve(ctx, path).await?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).await?;
        Ok(buf)
    }
}
