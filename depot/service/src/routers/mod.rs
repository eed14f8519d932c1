use actix_web::{HttpResponse, Responder, get};
use utoipa::OpenApi;

pub mod accounts;
pub mod admin;
pub mod api_keys;
pub mod artifacts;
pub mod cargo;
pub mod docker;
pub mod gomod;
pub mod health;
pub mod helm;
pub mod maven;
pub mod npm;
pub mod nuget;
pub mod opa;
pub mod rubygems;

#[derive(OpenApi)]
#[openapi(
    paths(
        accounts::register,
        accounts::login,
        api_keys::create,
        api_keys::list,
        api_keys::revoke,
        admin::list_settings,
        admin::enable_registry,
        admin::disable_registry,
        admin::update_description,
        artifacts::list,
        health::handle,
    ),
    tags(
        (name = "accounts", description = "User registration and login"),
        (name = "api-keys", description = "API key lifecycle"),
        (name = "admin", description = "Registry settings administration"),
        (name = "artifacts", description = "Cross-format artifact listing"),
        (name = "health", description = "Service health"),
    )
)]
struct ManagementApiDoc;

pub fn openapi() -> utoipa::openapi::OpenApi {
    ManagementApiDoc::openapi()
}

#[get("/swagger-ui")]
pub async fn swagger_redirect() -> impl Responder {
    HttpResponse::Found()
        .append_header(("Location", "/swagger-ui/"))
        .finish()
}
