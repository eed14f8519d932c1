use crate::extractors::{AuthUser, MaybeUser};
use crate::shared::http_error::{ApiError, ApiResult};
use crate::shared::read_file;
use crate::state::AppState;
use actix_web::dev::HttpServiceFactory;
use actix_web::{HttpRequest, HttpResponse, get, put, web};
use depot_core::OpContext;
use depot_core::RegistryError;
use depot_core::adapters::ArtifactMetadata;
use depot_core::adapters::cargo::CrateMetadata;
use depot_core::engine::UploadRequest;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// Wire-format structs (cargo publish binary payload → metadata JSON)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PublishMetadata {
    name: String,
    vers: String,
    #[serde(default)]
    deps: Vec<serde_json::Value>,
    #[serde(default)]
    features: HashMap<String, Vec<String>>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    links: Option<String>,
    #[serde(default)]
    rust_version: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct PublishWarnings {
    invalid_categories: Vec<String>,
    invalid_badges: Vec<String>,
    other: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct PublishResponse {
    warnings: PublishWarnings,
}

// ---------------------------------------------------------------------------
// Publish
// ---------------------------------------------------------------------------

#[utoipa::path(
    put,
    operation_id = "cargo_publish",
    tags = ["cargo"],
    path = "/cargo/api/v1/crates/new",
    request_body(
        content = Vec<u8>,
        content_type = "application/octet-stream",
        description = "Cargo publish binary payload: u32LE metadata-len, JSON metadata, u32LE crate-len, .crate tarball",
    ),
    responses(
        (status = 200, description = "Crate published", body = PublishResponse),
        (status = 400, description = "Malformed payload"),
        (status = 401, description = "Authentication required"),
        (status = 409, description = "Version already exists"),
    ),
    security(("bearerAuth" = []))
)]
#[put("/api/v1/crates/new")]
pub async fn publish(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let (meta, crate_bytes) = parse_publish_body(&body)
        .map_err(|msg| ApiError(RegistryError::ValidationFailed(msg)))?;

    let metadata = ArtifactMetadata::Cargo(CrateMetadata {
        description: meta.description,
        keywords: meta.keywords,
        deps: meta.deps,
        features: meta.features,
        links: meta.links,
        rust_version: meta.rust_version,
    });

    let ctx = OpContext::new();
    state
        .engine
        .upload(
            &ctx,
            UploadRequest {
                registry: "cargo".to_string(),
                name: meta.name,
                version: meta.vers,
                content: crate_bytes.to_vec(),
                content_type: None,
                metadata: Some(metadata),
            },
            &user.0,
        )
        .await?;

    Ok(HttpResponse::Ok().json(PublishResponse {
        warnings: PublishWarnings {
            invalid_categories: vec![],
            invalid_badges: vec![],
            other: vec![],
        },
    }))
}

/// Cargo publish wire format:
/// `[ u32LE json_len ][ json bytes ][ u32LE crate_len ][ crate bytes ]`
fn parse_publish_body(body: &[u8]) -> Result<(PublishMetadata, &[u8]), String> {
    if body.len() < 4 {
        return Err("payload too short".into());
    }
    let json_len = u32::from_le_bytes(body[..4].try_into().unwrap()) as usize;
    if body.len() < 4 + json_len + 4 {
        return Err("payload truncated (metadata)".into());
    }
    let json_bytes = &body[4..4 + json_len];
    let meta: PublishMetadata =
        serde_json::from_slice(json_bytes).map_err(|e| format!("invalid metadata JSON: {e}"))?;

    let crate_offset = 4 + json_len;
    let crate_len =
        u32::from_le_bytes(body[crate_offset..crate_offset + 4].try_into().unwrap()) as usize;
    let crate_start = crate_offset + 4;

    if body.len() < crate_start + crate_len {
        return Err("payload truncated (crate tarball)".into());
    }
    Ok((meta, &body[crate_start..crate_start + crate_len]))
}

// ---------------------------------------------------------------------------
// Sparse index
// ---------------------------------------------------------------------------

#[get("/config.json")]
pub async fn index_config(req: HttpRequest) -> HttpResponse {
    let info = req.connection_info();
    let base = format!("{}://{}/cargo", info.scheme(), info.host());
    HttpResponse::Ok().json(serde_json::json!({
        "dl": format!("{base}/crates/{{crate}}/{{crate}}-{{version}}.crate"),
        "api": base,
    }))
}

/// Newline-delimited JSON records, rebuilt from stored crate metadata. The
/// final path segment is the crate name; the prefix directories follow the
/// crates.io convention and are ignored here.
#[get("/index/{tail:.*}")]
pub async fn index_records(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let tail = path.into_inner();
    let Some(name) = tail.rsplit('/').next().filter(|s| !s.is_empty()) else {
        return Err(ApiError(RegistryError::NotFound(format!("index path {tail}"))));
    };
    let name = name.to_lowercase();

    let artifacts = state.engine.db().artifact_versions("cargo", &name).await?;
    if artifacts.is_empty() {
        return Err(ApiError(RegistryError::NotFound(format!("crate {name}"))));
    }

    let mut lines = String::new();
    for artifact in &artifacts {
        let meta = match &artifact.metadata {
            ArtifactMetadata::Cargo(meta) => meta.clone(),
            _ => CrateMetadata::default(),
        };
        let record = serde_json::json!({
            "name": artifact.name,
            "vers": artifact.version,
            "deps": meta.deps,
            "cksum": artifact.sha256,
            "features": meta.features,
            "yanked": false,
            "links": meta.links,
            "rust_version": meta.rust_version,
            "v": 1,
        });
        lines.push_str(&record.to_string());
        lines.push('\n');
    }

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(lines))
}

// ---------------------------------------------------------------------------
// Crate download
// ---------------------------------------------------------------------------

#[get("/crates/{name}/{file}")]
pub async fn download(
    state: web::Data<AppState>,
    user: MaybeUser,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (name, file) = path.into_inner();
    let version = file
        .strip_prefix(&format!("{name}-"))
        .and_then(|rest| rest.strip_suffix(".crate"))
        .ok_or_else(|| ApiError(RegistryError::NotFound(format!("crate file {file}"))))?;

    let ctx = OpContext::new();
    let (artifact, handle) = state
        .engine
        .download(&ctx, "cargo", &name, version, user.0.as_ref().map(|u| u.id.as_str()))
        .await?;
    let bytes = read_file(handle)
        .await
        .map_err(|err| ApiError(RegistryError::Io(err.to_string())))?;
    Ok(HttpResponse::Ok()
        .content_type(artifact.content_type)
        .body(bytes))
}

pub fn scope() -> impl HttpServiceFactory {
    web::scope("/cargo")
        .service(publish)
        .service(index_config)
        .service(index_records)
        .service(download)
}
