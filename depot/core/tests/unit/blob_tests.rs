use depot_core::OpContext;
use depot_core::RegistryError;
use depot_core::blob::{BlobStore, LocalBlobStore};
use sha2::{Digest, Sha256};
use tempfile::TempDir;

fn store() -> (LocalBlobStore, TempDir) {
    let tmp = TempDir::new().unwrap();
    (LocalBlobStore::new(tmp.path()), tmp)
}

#[tokio::test]
async fn store_retrieve_round_trip_preserves_bytes_and_hash() {
    let (blobs, _tmp) = store();
    let ctx = OpContext::new();

    let payload = b"hello blob store";
    let stored = blobs
        .store(&ctx, "npm/pkg/1.0.0.tgz", payload, "application/octet-stream")
        .await
        .unwrap();

    let expected = format!("{:x}", Sha256::digest(payload));
    assert_eq!(stored.sha256, expected);
    assert_eq!(stored.size, payload.len() as i64);

    let bytes = blobs.retrieve_bytes(&ctx, "npm/pkg/1.0.0.tgz").await.unwrap();
    assert_eq!(bytes, payload);
    assert_eq!(blobs.size(&ctx, "npm/pkg/1.0.0.tgz").await.unwrap(), payload.len() as i64);
}

#[tokio::test]
async fn no_temp_files_survive_a_store(){
    let (blobs, tmp) = store();
    let ctx = OpContext::new();
    blobs
        .store(&ctx, "dir/file.bin", b"data", "application/octet-stream")
        .await
        .unwrap();

    let mut names = Vec::new();
    for entry in std::fs::read_dir(tmp.path().join("dir")).unwrap() {
        names.push(entry.unwrap().file_name().to_string_lossy().into_owned());
    }
    assert_eq!(names, vec!["file.bin"]);
}

#[tokio::test]
async fn delete_missing_path_is_success() {
    let (blobs, _tmp) = store();
    let ctx = OpContext::new();
    assert!(blobs.delete(&ctx, "never/was/here").await.is_ok());
}

#[tokio::test]
async fn retrieve_and_size_report_not_found() {
    let (blobs, _tmp) = store();
    let ctx = OpContext::new();
    assert!(matches!(
        blobs.retrieve(&ctx, "missing").await,
        Err(RegistryError::NotFound(_))
    ));
    assert!(matches!(
        blobs.size(&ctx, "missing").await,
        Err(RegistryError::NotFound(_))
    ));
    assert!(!blobs.exists(&ctx, "missing").await.unwrap());
}

#[tokio::test]
async fn list_missing_prefix_is_empty() {
    let (blobs, _tmp) = store();
    let ctx = OpContext::new();
    assert!(blobs.list(&ctx, "oci/none/manifests/").await.unwrap().is_empty());
}

#[tokio::test]
async fn list_returns_relative_paths_under_prefix() {
    let (blobs, _tmp) = store();
    let ctx = OpContext::new();
    for path in [
        "oci/app/manifests/v1",
        "oci/app/manifests/v2",
        "oci/app/blobs/sha256:aaaa",
        "cargo/crates/x/x-1.0.0.crate",
    ] {
        blobs
            .store(&ctx, path, b"x", "application/octet-stream")
            .await
            .unwrap();
    }

    let manifests = blobs.list(&ctx, "oci/app/manifests/").await.unwrap();
    assert_eq!(
        manifests,
        vec!["oci/app/manifests/v1".to_string(), "oci/app/manifests/v2".to_string()]
    );

    let everything = blobs.list(&ctx, "").await.unwrap();
    assert_eq!(everything.len(), 4);
}

#[tokio::test]
async fn traversal_paths_are_rejected() {
    let (blobs, _tmp) = store();
    let ctx = OpContext::new();
    assert!(blobs
        .store(&ctx, "../escape", b"x", "application/octet-stream")
        .await
        .is_err());
    assert!(blobs.retrieve(&ctx, "/absolute/path").await.is_err());
}

#[tokio::test]
async fn cancelled_context_short_circuits() {
    let (blobs, _tmp) = store();
    let ctx = OpContext::new();
    ctx.cancel();

    assert!(matches!(
        blobs
            .store(&ctx, "a/b", b"x", "application/octet-stream")
            .await,
        Err(RegistryError::Cancelled)
    ));
    assert!(matches!(
        blobs.list(&ctx, "").await,
        Err(RegistryError::Cancelled)
    ));
}

#[tokio::test]
async fn overwrite_replaces_content_atomically() {
    let (blobs, _tmp) = store();
    let ctx = OpContext::new();
    blobs
        .store(&ctx, "path/file", b"first", "application/octet-stream")
        .await
        .unwrap();
    blobs
        .store(&ctx, "path/file", b"second", "application/octet-stream")
        .await
        .unwrap();
    assert_eq!(blobs.retrieve_bytes(&ctx, "path/file").await.unwrap(), b"second");
}
