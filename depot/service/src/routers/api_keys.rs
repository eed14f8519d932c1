use crate::extractors::AuthUser;
use crate::shared::http_error::ApiResult;
use crate::state::AppState;
use actix_web::dev::HttpServiceFactory;
use actix_web::{HttpResponse, delete, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateKeyRequest {
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, ToSchema)]
pub struct CreateKeyResponse {
    pub id: String,
    pub name: String,
    /// Shown exactly once; only the hash survives.
    pub key: String,
}

#[utoipa::path(
    post,
    operation_id = "create_api_key",
    tags = ["api-keys"],
    path = "/api/v1/keys",
    request_body(content = CreateKeyRequest, content_type = "application/json"),
    responses(
        (status = 201, description = "Key created; raw value returned once", body = CreateKeyResponse),
        (status = 401, description = "Authentication required"),
    ),
    security(("bearerAuth" = []))
)]
#[post("")]
pub async fn create(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Json<CreateKeyRequest>,
) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let created = state
        .accounts
        .create_api_key(&user.0.id, &body.name, body.permissions, body.expires_at)
        .await?;
    Ok(HttpResponse::Created().json(CreateKeyResponse {
        id: created.key.id,
        name: created.key.name,
        key: created.raw_key,
    }))
}

#[utoipa::path(
    get,
    operation_id = "list_api_keys",
    tags = ["api-keys"],
    path = "/api/v1/keys",
    responses(
        (status = 200, description = "Key metadata for the calling user"),
        (status = 401, description = "Authentication required"),
    ),
    security(("bearerAuth" = []))
)]
#[get("")]
pub async fn list(state: web::Data<AppState>, user: AuthUser) -> ApiResult<HttpResponse> {
    let keys = state.accounts.list_api_keys(&user.0.id).await?;
    Ok(HttpResponse::Ok().json(keys))
}

#[utoipa::path(
    delete,
    operation_id = "revoke_api_key",
    tags = ["api-keys"],
    path = "/api/v1/keys/{id}",
    params(("id" = String, Path, description = "API key id")),
    responses(
        (status = 204, description = "Key revoked"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the key owner"),
        (status = 404, description = "No such key"),
    ),
    security(("bearerAuth" = []))
)]
#[delete("/{id}")]
pub async fn revoke(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    state
        .accounts
        .revoke_api_key(&path.into_inner(), &user.0)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn scope() -> impl HttpServiceFactory {
    web::scope("/api/v1/keys")
        .service(create)
        .service(list)
        .service(revoke)
}
