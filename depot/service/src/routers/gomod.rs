use crate::extractors::{AuthUser, MaybeUser};
use crate::shared::http_error::{ApiError, ApiResult};
use crate::shared::read_file;
use crate::state::AppState;
use actix_web::dev::HttpServiceFactory;
use actix_web::{HttpResponse, get, put, web};
use depot_core::OpContext;
use depot_core::RegistryError;
use depot_core::adapters::gomod::read_go_mod;
use depot_core::engine::UploadRequest;

/// The module proxy URL space nests `<module>/@v/<file>`; the module path
/// itself contains slashes, so the whole tail is parsed by hand.
fn split_proxy_path(tail: &str) -> Option<(&str, &str)> {
    let (module, rest) = tail.split_once("/@v/")?;
    (!module.is_empty() && !rest.is_empty()).then_some((module, rest))
}

#[get("/{tail:.*}")]
pub async fn proxy(
    state: web::Data<AppState>,
    user: MaybeUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let tail = path.into_inner();
    let ctx = OpContext::new();

    if let Some(module) = tail.strip_suffix("/@latest") {
        return latest(state.get_ref(), module).await;
    }

    let Some((module, file)) = split_proxy_path(&tail) else {
        return Err(ApiError(RegistryError::NotFound(format!("go proxy path {tail}"))));
    };

    match file {
        "list" => {
            let artifacts = state.engine.db().artifact_versions("go", module).await?;
            let list: Vec<&str> = artifacts.iter().map(|a| a.version.as_str()).collect();
            Ok(HttpResponse::Ok()
                .content_type("text/plain; charset=utf-8")
                .body(list.join("\n")))
        }
        file if file.ends_with(".info") => {
            let version = file.trim_end_matches(".info");
            let Some(artifact) = state
                .engine
                .db()
                .artifact_by_identity("go", module, version)
                .await?
            else {
                return Err(ApiError(RegistryError::NotFound(format!(
                    "go module {module}@{version}"
                ))));
            };
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "Version": artifact.version,
                "Time": artifact.created_at,
            })))
        }
        file if file.ends_with(".mod") => {
            let version = file.trim_end_matches(".mod");
            let (_, handle) = state
                .engine
                .download(&ctx, "go", module, version, user.0.as_ref().map(|u| u.id.as_str()))
                .await?;
            let bytes = read_file(handle)
                .await
                .map_err(|err| ApiError(RegistryError::Io(err.to_string())))?;
            let go_mod = read_go_mod(&bytes).ok_or_else(|| {
                ApiError(RegistryError::NotFound(format!(
                    "go.mod for {module}@{version}"
                )))
            })?;
            Ok(HttpResponse::Ok()
                .content_type("text/plain; charset=utf-8")
                .body(go_mod))
        }
        file if file.ends_with(".zip") => {
            let version = file.trim_end_matches(".zip");
            let (artifact, handle) = state
                .engine
                .download(&ctx, "go", module, version, user.0.as_ref().map(|u| u.id.as_str()))
                .await?;
            let bytes = read_file(handle)
                .await
                .map_err(|err| ApiError(RegistryError::Io(err.to_string())))?;
            Ok(HttpResponse::Ok()
                .content_type(artifact.content_type)
                .body(bytes))
        }
        _ => Err(ApiError(RegistryError::NotFound(format!("go proxy file {file}")))),
    }
}

async fn latest(state: &AppState, module: &str) -> ApiResult<HttpResponse> {
    let artifacts = state.engine.db().artifact_versions("go", module).await?;
    let Some(artifact) = artifacts.last() else {
        return Err(ApiError(RegistryError::NotFound(format!("go module {module}"))));
    };
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "Version": artifact.version,
        "Time": artifact.created_at,
    })))
}

#[put("/{tail:.*}")]
pub async fn publish(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let tail = path.into_inner();
    let Some((module, file)) = split_proxy_path(&tail) else {
        return Err(ApiError(RegistryError::ValidationFailed(format!(
            "not a module upload path: {tail}"
        ))));
    };
    let Some(version) = file.strip_suffix(".zip") else {
        return Err(ApiError(RegistryError::ValidationFailed(
            "module uploads must be <version>.zip".to_string(),
        )));
    };

    let ctx = OpContext::new();
    state
        .engine
        .upload(
            &ctx,
            UploadRequest {
                registry: "go".to_string(),
                name: module.to_string(),
                version: version.to_string(),
                content: body.to_vec(),
                content_type: None,
                metadata: None,
            },
            &user.0,
        )
        .await?;
    Ok(HttpResponse::Created().finish())
}

pub fn scope() -> impl HttpServiceFactory {
    web::scope("/go").service(publish).service(proxy)
}
