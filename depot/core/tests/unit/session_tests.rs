use depot_core::OpContext;
use depot_core::RegistryError;
use depot_core::blob::{BlobStore, LocalBlobStore};
use depot_core::oci::UploadSessionManager;
use std::sync::Arc;
use tempfile::TempDir;

const HELLO_WORLD_DIGEST: &str =
    "sha256:315f5bdb76d078c43b8ac0064e4a0164612b1fce77c869345bfc94c75894edd3";

fn manager() -> (UploadSessionManager, Arc<dyn BlobStore>, TempDir) {
    let tmp = TempDir::new().unwrap();
    let blobs: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(tmp.path()));
    (UploadSessionManager::new(blobs.clone()), blobs, tmp)
}

#[tokio::test]
async fn chunked_upload_happy_path() {
    let (manager, blobs, _tmp) = manager();
    let ctx = OpContext::new();

    let session = manager.start_upload("lib/app", "u1").await.unwrap();
    assert_eq!(session.temp_path, format!("temp/uploads/lib/app/{}", session.id));
    // No blob yet before the first chunk.
    assert!(!blobs.exists(&ctx, &session.temp_path).await.unwrap());

    assert_eq!(
        manager.append_chunk(&ctx, &session.id, b"Hello, ").await.unwrap(),
        7
    );
    assert_eq!(
        manager.append_chunk(&ctx, &session.id, b"world!").await.unwrap(),
        13
    );

    let completed = manager
        .complete_upload(&ctx, &session.id, Some(HELLO_WORLD_DIGEST))
        .await
        .unwrap();
    assert_eq!(completed.digest, HELLO_WORLD_DIGEST);
    assert_eq!(
        completed.path,
        format!("oci/lib/app/blobs/{HELLO_WORLD_DIGEST}")
    );

    // Final blob present, temp gone, session dropped.
    assert_eq!(
        blobs.retrieve_bytes(&ctx, &completed.path).await.unwrap(),
        b"Hello, world!"
    );
    assert!(!blobs.exists(&ctx, &session.temp_path).await.unwrap());
    assert!(manager.get_session(&session.id).await.is_none());
}

#[tokio::test]
async fn wrong_expected_digest_is_a_mismatch() {
    let (manager, blobs, _tmp) = manager();
    let ctx = OpContext::new();

    let session = manager.start_upload("lib/app", "u1").await.unwrap();
    manager
        .append_chunk(&ctx, &session.id, b"Hello, world!")
        .await
        .unwrap();

    let wrong = format!("sha256:{}", "0".repeat(64));
    let err = manager
        .complete_upload(&ctx, &session.id, Some(wrong.as_str()))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::DigestMismatch { .. }));

    // The session survives a failed completion; the bytes stay staged.
    assert!(manager.get_session(&session.id).await.is_some());
    assert!(blobs.exists(&ctx, &session.temp_path).await.unwrap());
}

#[tokio::test]
async fn empty_expected_digest_skips_verification() {
    let (manager, _blobs, _tmp) = manager();
    let ctx = OpContext::new();

    let session = manager.start_upload("lib/app", "u1").await.unwrap();
    manager.append_chunk(&ctx, &session.id, b"payload").await.unwrap();
    assert!(manager.complete_upload(&ctx, &session.id, None).await.is_ok());
}

#[tokio::test]
async fn cancel_removes_temp_and_session() {
    let (manager, blobs, _tmp) = manager();
    let ctx = OpContext::new();

    let session = manager.start_upload("lib/app", "u1").await.unwrap();
    manager.append_chunk(&ctx, &session.id, b"partial").await.unwrap();

    manager.cancel_upload(&ctx, &session.id).await.unwrap();
    assert!(!blobs.exists(&ctx, &session.temp_path).await.unwrap());
    assert!(manager.get_session(&session.id).await.is_none());

    assert!(matches!(
        manager.append_chunk(&ctx, &session.id, b"more").await,
        Err(RegistryError::NotFound(_))
    ));
}

#[tokio::test]
async fn unknown_session_operations_fail_not_found() {
    let (manager, _blobs, _tmp) = manager();
    let ctx = OpContext::new();
    assert!(matches!(
        manager.append_chunk(&ctx, "nope", b"x").await,
        Err(RegistryError::NotFound(_))
    ));
    assert!(matches!(
        manager.complete_upload(&ctx, "nope", None).await,
        Err(RegistryError::NotFound(_))
    ));
}

#[tokio::test]
async fn sweep_expires_only_idle_sessions() {
    let (manager, blobs, _tmp) = manager();
    let ctx = OpContext::new();

    let session = manager.start_upload("lib/app", "u1").await.unwrap();
    manager.append_chunk(&ctx, &session.id, b"staged").await.unwrap();

    // 23 hours of idleness: still alive.
    let kept = manager
        .sweep(&ctx, chrono::Utc::now() + chrono::Duration::hours(23))
        .await;
    assert_eq!(kept, 0);
    assert!(manager.get_session(&session.id).await.is_some());

    // 25 hours: gone, temp cleaned up.
    let expired = manager
        .sweep(&ctx, chrono::Utc::now() + chrono::Duration::hours(25))
        .await;
    assert_eq!(expired, 1);
    assert!(manager.get_session(&session.id).await.is_none());
    assert!(!blobs.exists(&ctx, &session.temp_path).await.unwrap());
    assert_eq!(manager.session_count().await, 0);
}

#[tokio::test]
async fn sessions_are_independent() {
    let (manager, _blobs, _tmp) = manager();
    let ctx = OpContext::new();

    let a = manager.start_upload("repo/a", "u1").await.unwrap();
    let b = manager.start_upload("repo/b", "u2").await.unwrap();

    manager.append_chunk(&ctx, &a.id, b"aaaa").await.unwrap();
    manager.append_chunk(&ctx, &b.id, b"bb").await.unwrap();
    manager.append_chunk(&ctx, &a.id, b"aa").await.unwrap();

    assert_eq!(manager.get_session(&a.id).await.unwrap().size, 6);
    assert_eq!(manager.get_session(&b.id).await.unwrap().size, 2);
}

#[tokio::test]
async fn invalid_repository_cannot_start_a_session() {
    let (manager, _blobs, _tmp) = manager();
    assert!(manager.start_upload("Bad/Repo", "u1").await.is_err());
}
