use crate::support::{create_user, test_db};
use depot_core::RegistryError;
use depot_core::db::models::OwnerRole;
use depot_core::ownership::{OwnershipService, package_key};

#[test]
fn package_key_keeps_maven_colons() {
    assert_eq!(package_key("npm", "left-pad"), "npm:left-pad");
    assert_eq!(
        package_key("maven", "com.example:lib"),
        "maven:com.example:lib"
    );
}

#[tokio::test]
async fn first_publisher_bootstrap_allows_anyone() {
    let db = test_db().await;
    let service = OwnershipService::new(db.clone());
    let alice = create_user(&db, "alice", false).await;

    assert!(service.can_user_publish("npm", "new-pkg", &alice).await.unwrap());

    service
        .establish_initial_ownership("npm", "new-pkg", &alice.id)
        .await
        .unwrap();

    let bob = create_user(&db, "bob", false).await;
    assert!(!service.can_user_publish("npm", "new-pkg", &bob).await.unwrap());
}

#[tokio::test]
async fn establish_initial_ownership_is_idempotent() {
    let db = test_db().await;
    let service = OwnershipService::new(db.clone());
    let alice = create_user(&db, "alice", false).await;

    for _ in 0..5 {
        service
            .establish_initial_ownership("npm", "pkg", &alice.id)
            .await
            .unwrap();
    }
    let rows = service.list_owners("npm", "pkg").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].role, OwnerRole::Owner);

    // A later caller does not displace the existing owner.
    let bob = create_user(&db, "bob", false).await;
    service
        .establish_initial_ownership("npm", "pkg", &bob.id)
        .await
        .unwrap();
    let rows = service.list_owners("npm", "pkg").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_id, alice.id);
}

#[tokio::test]
async fn role_privileges_are_ordered() {
    let db = test_db().await;
    let service = OwnershipService::new(db.clone());
    let owner = create_user(&db, "owner", false).await;
    let maintainer = create_user(&db, "maintainer", false).await;
    let contributor = create_user(&db, "contributor", false).await;

    service
        .establish_initial_ownership("npm", "pkg", &owner.id)
        .await
        .unwrap();
    service
        .add_owner("npm", "pkg", &maintainer.id, OwnerRole::Maintainer, &owner)
        .await
        .unwrap();
    service
        .add_owner("npm", "pkg", &contributor.id, OwnerRole::Contributor, &owner)
        .await
        .unwrap();

    assert!(service.can_user_publish("npm", "pkg", &maintainer).await.unwrap());
    assert!(!service.can_user_publish("npm", "pkg", &contributor).await.unwrap());

    assert!(service.can_user_delete("npm", "pkg", &owner).await.unwrap());
    assert!(!service.can_user_delete("npm", "pkg", &maintainer).await.unwrap());

    assert!(service.can_user_manage_ownership("npm", "pkg", &owner).await.unwrap());
    assert!(!service
        .can_user_manage_ownership("npm", "pkg", &maintainer)
        .await
        .unwrap());
}

#[tokio::test]
async fn non_owner_cannot_manage_roster() {
    let db = test_db().await;
    let service = OwnershipService::new(db.clone());
    let owner = create_user(&db, "owner", false).await;
    let outsider = create_user(&db, "outsider", false).await;

    service
        .establish_initial_ownership("npm", "pkg", &owner.id)
        .await
        .unwrap();

    let err = service
        .add_owner("npm", "pkg", &outsider.id, OwnerRole::Maintainer, &outsider)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::InsufficientPermissions));
}

#[tokio::test]
async fn removing_sole_owner_fails_with_last_owner() {
    let db = test_db().await;
    let service = OwnershipService::new(db.clone());
    let alice = create_user(&db, "alice", false).await;

    service
        .establish_initial_ownership("npm", "pkg", &alice.id)
        .await
        .unwrap();

    let err = service
        .remove_owner("npm", "pkg", &alice.id, &alice)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::LastOwner(_)));
}

#[tokio::test]
async fn removing_one_of_two_owners_succeeds() {
    let db = test_db().await;
    let service = OwnershipService::new(db.clone());
    let alice = create_user(&db, "alice", false).await;
    let bob = create_user(&db, "bob", false).await;

    service
        .establish_initial_ownership("npm", "pkg", &alice.id)
        .await
        .unwrap();
    service
        .add_owner("npm", "pkg", &bob.id, OwnerRole::Owner, &alice)
        .await
        .unwrap();

    service.remove_owner("npm", "pkg", &bob.id, &alice).await.unwrap();
    let rows = service.list_owners("npm", "pkg").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_id, alice.id);
}

#[tokio::test]
async fn removing_a_maintainer_never_hits_last_owner() {
    let db = test_db().await;
    let service = OwnershipService::new(db.clone());
    let alice = create_user(&db, "alice", false).await;
    let bob = create_user(&db, "bob", false).await;

    service
        .establish_initial_ownership("npm", "pkg", &alice.id)
        .await
        .unwrap();
    service
        .add_owner("npm", "pkg", &bob.id, OwnerRole::Maintainer, &alice)
        .await
        .unwrap();

    service.remove_owner("npm", "pkg", &bob.id, &alice).await.unwrap();
}

#[tokio::test]
async fn add_owner_upserts_role() {
    let db = test_db().await;
    let service = OwnershipService::new(db.clone());
    let alice = create_user(&db, "alice", false).await;
    let bob = create_user(&db, "bob", false).await;

    service
        .establish_initial_ownership("npm", "pkg", &alice.id)
        .await
        .unwrap();
    service
        .add_owner("npm", "pkg", &bob.id, OwnerRole::Contributor, &alice)
        .await
        .unwrap();
    service
        .add_owner("npm", "pkg", &bob.id, OwnerRole::Owner, &alice)
        .await
        .unwrap();

    let rows = service.list_owners("npm", "pkg").await.unwrap();
    assert_eq!(rows.len(), 2);
    let bob_row = rows.iter().find(|r| r.user_id == bob.id).unwrap();
    assert_eq!(bob_row.role, OwnerRole::Owner);
}

#[tokio::test]
async fn admin_bypasses_every_check() {
    let db = test_db().await;
    let service = OwnershipService::new(db.clone());
    let alice = create_user(&db, "alice", false).await;
    let root = create_user(&db, "root", true).await;

    service
        .establish_initial_ownership("npm", "pkg", &alice.id)
        .await
        .unwrap();

    assert!(service.can_user_publish("npm", "pkg", &root).await.unwrap());
    assert!(service.can_user_delete("npm", "pkg", &root).await.unwrap());
    assert!(service.can_user_manage_ownership("npm", "pkg", &root).await.unwrap());
}
