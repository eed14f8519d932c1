use depot_core::accounts::AccountService;
use depot_core::adapters::AdapterRegistry;
use depot_core::blob::LocalBlobStore;
use depot_core::credentials::{TokenCache, TokenService};
use depot_core::db::Database;
use depot_core::engine::RegistryEngine;
use depot_core::error::Result;
use depot_core::identity::IdentityService;
use depot_core::oci::UploadSessionManager;
use depot_core::settings::SettingsService;
use depot_core::DepotConfig;
use std::sync::Arc;
use std::time::Duration;

/// Everything the handlers share, wired once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: DepotConfig,
    pub engine: RegistryEngine,
    pub accounts: AccountService,
    pub identity: Arc<IdentityService>,
    pub sessions: Arc<UploadSessionManager>,
}

impl AppState {
    pub async fn init(config: &DepotConfig) -> Result<Self> {
        let db = Database::connect(&config.database_url).await?;
        db.init_schema().await?;
        SettingsService::new(db.clone()).bootstrap_defaults().await?;

        let blobs = Arc::new(LocalBlobStore::new(config.blob_root.clone()));
        let engine = RegistryEngine::new(db.clone(), blobs.clone(), AdapterRegistry::with_defaults());

        let tokens = TokenService::new(config.jwt_secret.clone(), config.token_ttl_secs);
        let cache = (config.token_cache_ttl_secs > 0).then(|| {
            Arc::new(TokenCache::new(Duration::from_secs(
                config.token_cache_ttl_secs,
            )))
        });
        let identity = Arc::new(IdentityService::new(db.clone(), tokens.clone(), cache));
        let accounts = AccountService::new(db, tokens, config.bcrypt_cost);
        let sessions = Arc::new(UploadSessionManager::new(blobs));

        Ok(Self {
            config: config.clone(),
            engine,
            accounts,
            identity,
            sessions,
        })
    }
}
