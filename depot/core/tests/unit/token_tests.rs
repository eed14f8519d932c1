use crate::support::{create_user, test_db};
use depot_core::RegistryError;
use depot_core::credentials::{TokenCache, TokenService};
use std::time::Duration;

#[test]
fn mint_and_verify_round_trip() {
    let tokens = TokenService::new(b"secret".to_vec(), 3600);
    let token = tokens.mint("user-123").unwrap();
    assert_eq!(tokens.verify(&token).unwrap(), "user-123");
}

#[test]
fn zero_ttl_token_is_expired() {
    let tokens = TokenService::new(b"secret".to_vec(), 0);
    let token = tokens.mint("user-123").unwrap();
    assert!(matches!(
        tokens.verify(&token),
        Err(RegistryError::ExpiredToken)
    ));
}

#[test]
fn wrong_secret_is_invalid_not_expired() {
    let minter = TokenService::new(b"secret-a".to_vec(), 3600);
    let verifier = TokenService::new(b"secret-b".to_vec(), 3600);
    let token = minter.mint("user-123").unwrap();
    assert!(matches!(
        verifier.verify(&token),
        Err(RegistryError::InvalidToken)
    ));
}

#[test]
fn garbage_token_is_invalid() {
    let tokens = TokenService::new(b"secret".to_vec(), 3600);
    assert!(matches!(
        tokens.verify("not.a.jwt"),
        Err(RegistryError::InvalidToken)
    ));
}

#[tokio::test]
async fn cache_round_trip_and_expiry() {
    let db = test_db().await;
    let user = create_user(&db, "cached", false).await;

    let cache = TokenCache::new(Duration::from_secs(60));
    assert!(cache.get(&user.id).is_none());
    cache.put(&user);
    assert_eq!(cache.get(&user.id).unwrap().username, "cached");

    cache.invalidate(&user.id);
    assert!(cache.get(&user.id).is_none());

    // Zero TTL: entries are dead on arrival.
    let dead = TokenCache::new(Duration::from_secs(0));
    dead.put(&user);
    assert!(dead.get(&user.id).is_none());
}
