/// Runtime configuration, resolved once at startup from the environment.
///
/// `DEPOT_JWT_SECRET` has no default: tokens signed with a guessable secret
/// are worthless, so startup panics when it is absent.
#[derive(Clone, Debug)]
pub struct DepotConfig {
    pub database_url: String,
    pub blob_root: String,
    pub jwt_secret: Vec<u8>,
    pub token_ttl_secs: i64,
    pub bcrypt_cost: u32,
    /// TTL for the optional in-process token→user cache; 0 disables it.
    pub token_cache_ttl_secs: u64,
    pub bind_addr: String,
    pub tls_cert_path: String,
    pub tls_key_path: String,
}

impl DepotConfig {
    pub fn init() -> Self {
        let database_url = envmnt::get_or("DEPOT_DATABASE_URL", "sqlite://depot.db?mode=rwc");
        let blob_root = envmnt::get_or("DEPOT_BLOB_ROOT", "storage");
        let jwt_secret = envmnt::get_or_panic("DEPOT_JWT_SECRET").into_bytes();
        let token_ttl_secs = envmnt::get_or("DEPOT_TOKEN_TTL_SECONDS", "86400")
            .parse()
            .unwrap_or(86_400);
        let bcrypt_cost = envmnt::get_or("DEPOT_BCRYPT_COST", "12").parse().unwrap_or(12);
        let token_cache_ttl_secs = envmnt::get_or("DEPOT_TOKEN_CACHE_TTL_SECS", "0")
            .parse()
            .unwrap_or(0);
        let bind_addr = envmnt::get_or("DEPOT_BIND_ADDR", "0.0.0.0:8585");
        let tls_cert_path = envmnt::get_or("DEPOT_TLS_CERT_PATH", "cert.pem");
        let tls_key_path = envmnt::get_or("DEPOT_TLS_KEY_PATH", "key.pem");

        Self {
            database_url,
            blob_root,
            jwt_secret,
            token_ttl_secs,
            bcrypt_cost,
            token_cache_ttl_secs,
            bind_addr,
            tls_cert_path,
            tls_key_path,
        }
    }

    /// Fixed-value config for tests; no environment reads.
    pub fn for_tests(blob_root: &str) -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            blob_root: blob_root.to_string(),
            jwt_secret: b"depot-test-secret".to_vec(),
            token_ttl_secs: 3600,
            bcrypt_cost: 4,
            token_cache_ttl_secs: 0,
            bind_addr: "127.0.0.1:0".to_string(),
            tls_cert_path: String::new(),
            tls_key_path: String::new(),
        }
    }
}
