use crate::support::{create_user, npm_tarball, read_all, test_registry, upload};
use depot_core::OpContext;
use depot_core::RegistryError;
use depot_core::db::artifacts::ArtifactFilter;
use depot_core::db::models::OwnerRole;

#[tokio::test]
async fn npm_happy_path_publish_and_download() {
    let reg = test_registry().await;
    let ctx = OpContext::new();
    let alice = create_user(&reg.db, "alice", false).await;

    let tarball = npm_tarball("left-pad", "1.0.0");
    let artifact = reg
        .engine
        .upload(&ctx, upload("npm", "left-pad", "1.0.0", tarball.clone()), &alice)
        .await
        .unwrap();

    assert!(!artifact.sha256.is_empty());
    assert_eq!(artifact.storage_path, "npm/left-pad/1.0.0.tgz");
    assert_eq!(artifact.size as usize, tarball.len());

    // First publish self-grants ownership.
    let owners = reg
        .engine
        .ownership()
        .list_owners("npm", "left-pad")
        .await
        .unwrap();
    assert_eq!(owners.len(), 1);
    assert_eq!(owners[0].user_id, alice.id);
    assert_eq!(owners[0].role, OwnerRole::Owner);
    assert_eq!(owners[0].granted_by, alice.id);

    // Download returns identical bytes and bumps the counter.
    let (_, handle) = reg
        .engine
        .download(&ctx, "npm", "left-pad", "1.0.0", Some(alice.id.as_str()))
        .await
        .unwrap();
    assert_eq!(read_all(handle).await, tarball);

    let row = reg
        .db
        .artifact_by_identity("npm", "left-pad", "1.0.0")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.downloads, 1);
    assert_eq!(reg.db.download_event_count(&row.id).await.unwrap(), 1);
}

#[tokio::test]
async fn duplicate_upload_conflicts_and_leaves_state_alone() {
    let reg = test_registry().await;
    let ctx = OpContext::new();
    let alice = create_user(&reg.db, "alice", false).await;

    let tarball = npm_tarball("left-pad", "1.0.0");
    reg.engine
        .upload(&ctx, upload("npm", "left-pad", "1.0.0", tarball.clone()), &alice)
        .await
        .unwrap();
    let (_, handle) = reg
        .engine
        .download(&ctx, "npm", "left-pad", "1.0.0", None)
        .await
        .unwrap();
    drop(handle);

    let err = reg
        .engine
        .upload(&ctx, upload("npm", "left-pad", "1.0.0", tarball.clone()), &alice)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::AlreadyExists(_)));

    // Blob untouched, counter untouched.
    let bytes = reg
        .engine
        .blobs()
        .retrieve_bytes(&ctx, "npm/left-pad/1.0.0.tgz")
        .await
        .unwrap();
    assert_eq!(bytes, tarball);
    let row = reg
        .db
        .artifact_by_identity("npm", "left-pad", "1.0.0")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.downloads, 1);
}

#[tokio::test]
async fn non_owner_publish_is_blocked_without_side_effects() {
    let reg = test_registry().await;
    let ctx = OpContext::new();
    let alice = create_user(&reg.db, "alice", false).await;
    let bob = create_user(&reg.db, "bob", false).await;

    reg.engine
        .upload(&ctx, upload("npm", "left-pad", "1.0.0", npm_tarball("left-pad", "1.0.0")), &alice)
        .await
        .unwrap();

    let err = reg
        .engine
        .upload(&ctx, upload("npm", "left-pad", "1.0.1", npm_tarball("left-pad", "1.0.1")), &bob)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::InsufficientPermissions));

    assert!(reg
        .db
        .artifact_by_identity("npm", "left-pad", "1.0.1")
        .await
        .unwrap()
        .is_none());
    assert!(!reg
        .engine
        .blobs()
        .exists(&ctx, "npm/left-pad/1.0.1.tgz")
        .await
        .unwrap());
}

#[tokio::test]
async fn maintainer_may_publish_new_versions() {
    let reg = test_registry().await;
    let ctx = OpContext::new();
    let alice = create_user(&reg.db, "alice", false).await;
    let bob = create_user(&reg.db, "bob", false).await;

    reg.engine
        .upload(&ctx, upload("npm", "left-pad", "1.0.0", npm_tarball("left-pad", "1.0.0")), &alice)
        .await
        .unwrap();
    reg.engine
        .ownership()
        .add_owner("npm", "left-pad", &bob.id, OwnerRole::Maintainer, &alice)
        .await
        .unwrap();

    reg.engine
        .upload(&ctx, upload("npm", "left-pad", "1.0.1", npm_tarball("left-pad", "1.0.1")), &bob)
        .await
        .unwrap();
}

#[tokio::test]
async fn admin_delete_overrides_ownership() {
    let reg = test_registry().await;
    let ctx = OpContext::new();
    let alice = create_user(&reg.db, "alice", false).await;
    let root = create_user(&reg.db, "root", true).await;

    reg.engine
        .upload(&ctx, upload("npm", "left-pad", "1.0.0", npm_tarball("left-pad", "1.0.0")), &alice)
        .await
        .unwrap();

    reg.engine
        .delete(&ctx, "npm", "left-pad", "1.0.0", &root)
        .await
        .unwrap();

    assert!(!reg
        .engine
        .blobs()
        .exists(&ctx, "npm/left-pad/1.0.0.tgz")
        .await
        .unwrap());
    assert!(reg
        .db
        .artifact_by_identity("npm", "left-pad", "1.0.0")
        .await
        .unwrap()
        .is_none());
    // Ownership survives the version delete.
    assert_eq!(
        reg.engine
            .ownership()
            .list_owners("npm", "left-pad")
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn non_owner_delete_is_forbidden() {
    let reg = test_registry().await;
    let ctx = OpContext::new();
    let alice = create_user(&reg.db, "alice", false).await;
    let bob = create_user(&reg.db, "bob", false).await;

    reg.engine
        .upload(&ctx, upload("npm", "left-pad", "1.0.0", npm_tarball("left-pad", "1.0.0")), &alice)
        .await
        .unwrap();

    let err = reg
        .engine
        .delete(&ctx, "npm", "left-pad", "1.0.0", &bob)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::InsufficientPermissions));
}

#[tokio::test]
async fn delete_then_republish_succeeds() {
    let reg = test_registry().await;
    let ctx = OpContext::new();
    let alice = create_user(&reg.db, "alice", false).await;

    let request = || upload("npm", "left-pad", "1.0.0", npm_tarball("left-pad", "1.0.0"));
    reg.engine.upload(&ctx, request(), &alice).await.unwrap();
    reg.engine
        .delete(&ctx, "npm", "left-pad", "1.0.0", &alice)
        .await
        .unwrap();
    reg.engine.upload(&ctx, request(), &alice).await.unwrap();
}

#[tokio::test]
async fn disabled_registry_rejects_uploads() {
    let reg = test_registry().await;
    let ctx = OpContext::new();
    let alice = create_user(&reg.db, "alice", false).await;

    reg.engine.settings().disable("npm", &alice.id).await.unwrap();
    let err = reg
        .engine
        .upload(&ctx, upload("npm", "left-pad", "1.0.0", npm_tarball("left-pad", "1.0.0")), &alice)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::RegistryDisabled(_)));

    reg.engine.settings().enable("npm", &alice.id).await.unwrap();
    reg.engine
        .upload(&ctx, upload("npm", "left-pad", "1.0.0", npm_tarball("left-pad", "1.0.0")), &alice)
        .await
        .unwrap();
}

#[tokio::test]
async fn unknown_registry_is_rejected_up_front() {
    let reg = test_registry().await;
    let ctx = OpContext::new();
    let alice = create_user(&reg.db, "alice", false).await;

    let err = reg
        .engine
        .upload(&ctx, upload("apt", "pkg", "1.0.0", vec![1, 2, 3]), &alice)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::UnsupportedRegistry(_)));
}

#[tokio::test]
async fn list_filters_and_totals() {
    let reg = test_registry().await;
    let ctx = OpContext::new();
    let alice = create_user(&reg.db, "alice", false).await;

    for (name, version) in [("left-pad", "1.0.0"), ("left-pad", "1.1.0"), ("right-pad", "2.0.0")] {
        reg.engine
            .upload(&ctx, upload("npm", name, version, npm_tarball(name, version)), &alice)
            .await
            .unwrap();
    }

    // Substring match is case-insensitive; total ignores pagination.
    let (page, total) = reg
        .engine
        .list(
            &ctx,
            &ArtifactFilter {
                name: Some("LEFT".to_string()),
                registry: Some("npm".to_string()),
                limit: 1,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(page.len(), 1);

    // Publisher display fields are preloaded.
    let publisher = page[0].publisher.as_ref().unwrap();
    assert_eq!(publisher.username, "alice");

    // Tag filter inspects extracted metadata ("test" comes from the
    // fixture's keywords).
    let (_, tagged_total) = reg
        .engine
        .list(
            &ctx,
            &ArtifactFilter {
                tags: vec!["test".to_string()],
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(tagged_total, 3);

    let (_, no_match) = reg
        .engine
        .list(
            &ctx,
            &ArtifactFilter {
                tags: vec!["nonexistent".to_string()],
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(no_match, 0);
}

#[tokio::test]
async fn oci_manifest_put_is_fetchable_by_tag_and_digest() {
    let reg = test_registry().await;
    let ctx = OpContext::new();
    let alice = create_user(&reg.db, "alice", false).await;

    let manifest = serde_json::json!({
        "schemaVersion": 2,
        "mediaType": "application/vnd.oci.image.manifest.v1+json",
        "layers": [],
    })
    .to_string();

    let artifact = reg
        .engine
        .upload(
            &ctx,
            upload("oci", "lib/app", "v1", manifest.clone().into_bytes()),
            &alice,
        )
        .await
        .unwrap();

    let digest = depot_core::adapters::oci::compute_digest(manifest.as_bytes());
    let by_tag = reg
        .engine
        .blobs()
        .retrieve_bytes(&ctx, "oci/lib/app/manifests/v1")
        .await
        .unwrap();
    let by_digest = reg
        .engine
        .blobs()
        .retrieve_bytes(&ctx, &format!("oci/lib/app/manifests/{digest}"))
        .await
        .unwrap();
    assert_eq!(by_tag, by_digest);
    assert_eq!(by_tag, manifest.as_bytes());
    assert_eq!(artifact.content_type, "application/vnd.oci.image.manifest.v1+json");
}

#[tokio::test]
async fn cancelled_context_aborts_upload() {
    let reg = test_registry().await;
    let alice = create_user(&reg.db, "alice", false).await;

    let ctx = OpContext::new();
    ctx.cancel();
    let err = reg
        .engine
        .upload(&ctx, upload("npm", "left-pad", "1.0.0", npm_tarball("left-pad", "1.0.0")), &alice)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Cancelled));
}
