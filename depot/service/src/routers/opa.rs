use crate::extractors::{AuthUser, MaybeUser};
use crate::shared::http_error::{ApiError, ApiResult};
use crate::shared::read_file;
use crate::state::AppState;
use actix_web::dev::HttpServiceFactory;
use actix_web::{HttpResponse, get, put, web};
use depot_core::OpContext;
use depot_core::RegistryError;
use depot_core::engine::UploadRequest;

#[put("/bundles/{name}/{version}")]
pub async fn push(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<(String, String)>,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let (name, version) = path.into_inner();
    let version = version
        .strip_suffix(".tar.gz")
        .unwrap_or(&version)
        .to_string();

    let ctx = OpContext::new();
    state
        .engine
        .upload(
            &ctx,
            UploadRequest {
                registry: "opa".to_string(),
                name,
                version,
                content: body.to_vec(),
                content_type: None,
                metadata: None,
            },
            &user.0,
        )
        .await?;
    Ok(HttpResponse::Created().finish())
}

#[get("/bundles/{name}/{file}")]
pub async fn fetch(
    state: web::Data<AppState>,
    user: MaybeUser,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (name, file) = path.into_inner();
    let Some(version) = file.strip_suffix(".tar.gz") else {
        return Err(ApiError(RegistryError::NotFound(format!("bundle {file}"))));
    };

    let ctx = OpContext::new();
    let (artifact, handle) = state
        .engine
        .download(&ctx, "opa", &name, version, user.0.as_ref().map(|u| u.id.as_str()))
        .await?;
    let bytes = read_file(handle)
        .await
        .map_err(|err| ApiError(RegistryError::Io(err.to_string())))?;
    Ok(HttpResponse::Ok()
        .content_type(artifact.content_type)
        .body(bytes))
}

pub fn scope() -> impl HttpServiceFactory {
    web::scope("/opa").service(push).service(fetch)
}
