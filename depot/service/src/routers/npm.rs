use crate::extractors::{AuthUser, MaybeUser};
use crate::shared::http_error::{ApiError, ApiResult};
use crate::shared::read_file;
use crate::state::AppState;
use actix_web::dev::HttpServiceFactory;
use actix_web::{HttpRequest, HttpResponse, get, put, web};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use depot_core::OpContext;
use depot_core::RegistryError;
use depot_core::adapters::ArtifactMetadata;
use depot_core::engine::UploadRequest;
use serde::Deserialize;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Publish payload (npm client JSON document)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PublishDocument {
    name: String,
    #[serde(default)]
    versions: HashMap<String, serde_json::Value>,
    #[serde(default, rename = "_attachments")]
    attachments: HashMap<String, Attachment>,
}

#[derive(Debug, Deserialize)]
struct Attachment {
    data: String,
}

#[utoipa::path(
    put,
    operation_id = "npm_publish",
    tags = ["npm"],
    path = "/npm/{name}",
    params(("name" = String, Path, description = "Package name, possibly scoped")),
    request_body(content = String, content_type = "application/json"),
    responses(
        (status = 201, description = "Version published"),
        (status = 400, description = "Malformed publish document"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not an owner or maintainer"),
        (status = 409, description = "Version already exists"),
    ),
    security(("bearerAuth" = []))
)]
#[put("/{name:.*}")]
pub async fn publish(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let doc: PublishDocument = serde_json::from_slice(&body).map_err(|err| {
        ApiError(RegistryError::ValidationFailed(format!(
            "invalid publish document: {err}"
        )))
    })?;

    let Some(version) = doc.versions.keys().next().cloned() else {
        return Err(ApiError(RegistryError::ValidationFailed(
            "publish document contains no versions".to_string(),
        )));
    };
    let Some(attachment) = doc.attachments.values().next() else {
        return Err(ApiError(RegistryError::ValidationFailed(
            "publish document contains no attachment".to_string(),
        )));
    };
    let tarball_bytes = STANDARD.decode(&attachment.data).map_err(|err| {
        ApiError(RegistryError::ValidationFailed(format!(
            "attachment is not base64: {err}"
        )))
    })?;

    let ctx = OpContext::new();
    let artifact = state
        .engine
        .upload(
            &ctx,
            UploadRequest {
                registry: "npm".to_string(),
                name: doc.name,
                version,
                content: tarball_bytes,
                content_type: None,
                metadata: None,
            },
            &user.0,
        )
        .await?;
    Ok(HttpResponse::Created().json(serde_json::json!({
        "ok": true,
        "id": artifact.name,
        "rev": artifact.version,
    })))
}

// ---------------------------------------------------------------------------
// Tarball download: GET /npm/{name}/-/{file}.tgz
// ---------------------------------------------------------------------------

#[get("/{name:.*}/-/{file}")]
pub async fn tarball(
    state: web::Data<AppState>,
    user: MaybeUser,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (name, file) = path.into_inner();
    let name = name.to_lowercase();

    // File shape: <basename>-<version>.tgz, scope stripped.
    let basename = name.rsplit('/').next().unwrap_or(&name);
    let version = file
        .strip_prefix(&format!("{basename}-"))
        .and_then(|rest| rest.strip_suffix(".tgz"))
        .ok_or_else(|| ApiError(RegistryError::NotFound(format!("npm tarball {file}"))))?;

    let ctx = OpContext::new();
    let (artifact, handle) = state
        .engine
        .download(&ctx, "npm", &name, version, user.0.as_ref().map(|u| u.id.as_str()))
        .await?;
    let bytes = read_file(handle)
        .await
        .map_err(|err| ApiError(RegistryError::Io(err.to_string())))?;

    Ok(HttpResponse::Ok()
        .content_type(artifact.content_type)
        .body(bytes))
}

// ---------------------------------------------------------------------------
// Packument: GET /npm/{name}
// ---------------------------------------------------------------------------

#[get("/{name:.*}")]
pub async fn packument(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let name = path.into_inner().to_lowercase();
    let artifacts = state.engine.db().artifact_versions("npm", &name).await?;
    if artifacts.is_empty() {
        return Err(ApiError(RegistryError::NotFound(format!("npm package {name}"))));
    }

    let info = req.connection_info();
    let base = format!("{}://{}", info.scheme(), info.host());
    let basename = name.rsplit('/').next().unwrap_or(&name).to_string();

    let mut versions = serde_json::Map::new();
    let mut dist_tags: HashMap<String, String> = HashMap::new();
    let mut time: HashMap<String, String> = HashMap::new();
    let mut description = None;

    for artifact in &artifacts {
        let mut entry = serde_json::json!({
            "name": artifact.name,
            "version": artifact.version,
            "dist": {
                "tarball": format!("{base}/npm/{name}/-/{basename}-{}.tgz", artifact.version),
                "shasum": artifact.sha256,
            },
        });
        if let ArtifactMetadata::Npm(meta) = &artifact.metadata {
            if let Some(desc) = &meta.description {
                entry["description"] = serde_json::json!(desc);
                description.get_or_insert_with(|| desc.clone());
            }
            if !meta.dependencies.is_empty() {
                entry["dependencies"] = serde_json::json!(meta.dependencies);
            }
            dist_tags.extend(meta.dist_tags.clone());
            time.extend(meta.time.clone());
        }
        versions.insert(artifact.version.clone(), entry);
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "name": name,
        "description": description,
        "dist-tags": dist_tags,
        "versions": versions,
        "time": time,
    })))
}

pub fn scope() -> impl HttpServiceFactory {
    // Tarball first: its pattern embeds "/-/" and must win over the greedy
    // packument match.
    web::scope("/npm")
        .service(tarball)
        .service(publish)
        .service(packument)
}
