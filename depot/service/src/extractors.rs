use crate::middleware::identity::AuthResolution;
use crate::shared::http_error::ApiError;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use depot_core::RegistryError;
use depot_core::db::models::User;
use std::future::{Ready, ready};

fn resolution(req: &HttpRequest) -> Option<AuthResolution> {
    req.extensions().get::<AuthResolution>().cloned()
}

/// Required principal. A presented-but-invalid Bearer token rejects the
/// request outright; it never falls through to the API-key alternatives.
pub struct AuthUser(pub User);

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let outcome = match resolution(req) {
            Some(res) if res.bearer_rejected => Err(ApiError(RegistryError::InvalidToken)),
            Some(res) => match &res.user {
                Some(user) => Ok(AuthUser(user.clone())),
                None => Err(ApiError(RegistryError::Unauthorized)),
            },
            None => Err(ApiError(RegistryError::Unauthorized)),
        };
        ready(outcome)
    }
}

/// Optional principal; anonymous requests proceed.
pub struct MaybeUser(pub Option<User>);

impl FromRequest for MaybeUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = resolution(req).and_then(|res| res.user.clone());
        ready(Ok(MaybeUser(user)))
    }
}

/// Required admin principal.
pub struct AdminUser(pub User);

impl FromRequest for AdminUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let outcome = match AuthUser::from_request(req, payload).into_inner() {
            Ok(AuthUser(user)) if user.is_admin => Ok(AdminUser(user)),
            Ok(_) => Err(ApiError(RegistryError::InsufficientPermissions)),
            Err(err) => Err(err),
        };
        ready(outcome)
    }
}
