use crate::extractors::AdminUser;
use crate::shared::http_error::ApiResult;
use crate::state::AppState;
use actix_web::dev::HttpServiceFactory;
use actix_web::{HttpResponse, get, post, put, web};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct DescriptionRequest {
    pub description: String,
}

#[utoipa::path(
    get,
    operation_id = "list_registry_settings",
    tags = ["admin"],
    path = "/api/v1/admin/registries",
    responses(
        (status = 200, description = "All registry settings"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Admin only"),
    ),
    security(("bearerAuth" = []))
)]
#[get("")]
pub async fn list_settings(state: web::Data<AppState>, _admin: AdminUser) -> ApiResult<HttpResponse> {
    let settings = state.engine.settings().list().await?;
    Ok(HttpResponse::Ok().json(settings))
}

#[utoipa::path(
    post,
    operation_id = "enable_registry",
    tags = ["admin"],
    path = "/api/v1/admin/registries/{name}/enable",
    params(("name" = String, Path, description = "Registry format tag")),
    responses(
        (status = 204, description = "Registry enabled"),
        (status = 404, description = "Unknown registry"),
    ),
    security(("bearerAuth" = []))
)]
#[post("/{name}/enable")]
pub async fn enable_registry(
    state: web::Data<AppState>,
    admin: AdminUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    state
        .engine
        .settings()
        .enable(&path.into_inner(), &admin.0.id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    operation_id = "disable_registry",
    tags = ["admin"],
    path = "/api/v1/admin/registries/{name}/disable",
    params(("name" = String, Path, description = "Registry format tag")),
    responses(
        (status = 204, description = "Registry disabled"),
        (status = 404, description = "Unknown registry"),
    ),
    security(("bearerAuth" = []))
)]
#[post("/{name}/disable")]
pub async fn disable_registry(
    state: web::Data<AppState>,
    admin: AdminUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    state
        .engine
        .settings()
        .disable(&path.into_inner(), &admin.0.id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    put,
    operation_id = "update_registry_description",
    tags = ["admin"],
    path = "/api/v1/admin/registries/{name}/description",
    params(("name" = String, Path, description = "Registry format tag")),
    request_body(content = DescriptionRequest, content_type = "application/json"),
    responses(
        (status = 204, description = "Description updated"),
        (status = 404, description = "Unknown registry"),
    ),
    security(("bearerAuth" = []))
)]
#[put("/{name}/description")]
pub async fn update_description(
    state: web::Data<AppState>,
    admin: AdminUser,
    path: web::Path<String>,
    body: web::Json<DescriptionRequest>,
) -> ApiResult<HttpResponse> {
    state
        .engine
        .settings()
        .update_description(&path.into_inner(), &body.description, &admin.0.id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn scope() -> impl HttpServiceFactory {
    web::scope("/api/v1/admin/registries")
        .service(list_settings)
        .service(enable_registry)
        .service(disable_registry)
        .service(update_description)
}
