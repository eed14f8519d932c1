use crate::support::test_db;
use depot_core::RegistryError;
use depot_core::settings::{KNOWN_REGISTRIES, SettingsService};

#[tokio::test]
async fn bootstrap_seeds_nine_enabled_rows() {
    let db = test_db().await;
    let service = SettingsService::new(db);
    service.bootstrap_defaults().await.unwrap();

    let settings = service.list().await.unwrap();
    assert_eq!(settings.len(), KNOWN_REGISTRIES.len());
    assert!(settings.iter().all(|s| s.enabled));
}

#[tokio::test]
async fn bootstrap_preserves_existing_state() {
    let db = test_db().await;
    let service = SettingsService::new(db);
    service.bootstrap_defaults().await.unwrap();
    service.disable("npm", "admin").await.unwrap();

    service.bootstrap_defaults().await.unwrap();
    assert!(!service.is_registry_enabled("npm").await.unwrap());
}

#[tokio::test]
async fn missing_row_reads_as_disabled() {
    let db = test_db().await;
    let service = SettingsService::new(db);
    // No bootstrap: fail closed.
    assert!(!service.is_registry_enabled("npm").await.unwrap());
}

#[tokio::test]
async fn enable_disable_round_trip() {
    let db = test_db().await;
    let service = SettingsService::new(db);
    service.bootstrap_defaults().await.unwrap();

    service.disable("cargo", "admin").await.unwrap();
    assert!(!service.is_registry_enabled("cargo").await.unwrap());
    service.enable("cargo", "admin").await.unwrap();
    assert!(service.is_registry_enabled("cargo").await.unwrap());
}

#[tokio::test]
async fn updates_against_unknown_registry_fail() {
    let db = test_db().await;
    let service = SettingsService::new(db);
    service.bootstrap_defaults().await.unwrap();

    assert!(matches!(
        service.enable("apt", "admin").await,
        Err(RegistryError::NotFound(_))
    ));
    assert!(matches!(
        service.update_description("apt", "nope", "admin").await,
        Err(RegistryError::NotFound(_))
    ));

    service
        .update_description("helm", "charts live here", "admin")
        .await
        .unwrap();
    let helm = service
        .list()
        .await
        .unwrap()
        .into_iter()
        .find(|s| s.registry_name == "helm")
        .unwrap();
    assert_eq!(helm.description, "charts live here");
    assert_eq!(helm.updated_by, "admin");
}
