use crate::extractors::{AuthUser, MaybeUser};
use crate::shared::http_error::{ApiError, ApiResult};
use crate::shared::read_file;
use crate::state::AppState;
use actix_web::dev::HttpServiceFactory;
use actix_web::{HttpRequest, HttpResponse, get, put, web};
use depot_core::OpContext;
use depot_core::RegistryError;
use depot_core::adapters::FormatAdapter;
use depot_core::adapters::nuget::{SYMBOL_CONTENT_TYPE, package_identity, symbol_storage_path};
use depot_core::engine::UploadRequest;

// ---------------------------------------------------------------------------
// Service index (v3 protocol discovery document)
// ---------------------------------------------------------------------------

#[get("/v3/index.json")]
pub async fn service_index(req: HttpRequest) -> HttpResponse {
    let info = req.connection_info();
    let base = format!("{}://{}/nuget", info.scheme(), info.host());
    HttpResponse::Ok().json(serde_json::json!({
        "version": "3.0.0",
        "resources": [
            {
                "@id": format!("{base}/v3/flatcontainer/"),
                "@type": "PackageBaseAddress/3.0.0",
            },
            {
                "@id": format!("{base}/v3/search"),
                "@type": "SearchQueryService",
            },
            {
                "@id": format!("{base}/v3/registrations/"),
                "@type": "RegistrationsBaseUrl",
            },
            {
                "@id": format!("{base}/v2/package"),
                "@type": "PackagePublish/2.0.0",
            },
        ],
    }))
}

// ---------------------------------------------------------------------------
// Push (single-file PUT) and symbol push
// ---------------------------------------------------------------------------

async fn push_package(
    state: &AppState,
    user: &AuthUser,
    body: web::Bytes,
    content_type: Option<String>,
) -> ApiResult<HttpResponse> {
    let (id, version) = package_identity(&body)?;

    let ctx = OpContext::new();
    state
        .engine
        .upload(
            &ctx,
            UploadRequest {
                registry: "nuget".to_string(),
                name: id,
                version,
                content: body.to_vec(),
                content_type,
                metadata: None,
            },
            &user.0,
        )
        .await?;
    Ok(HttpResponse::Created().finish())
}

#[utoipa::path(
    put,
    operation_id = "nuget_push",
    tags = ["nuget"],
    path = "/nuget/v2/package",
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 201, description = "Package pushed"),
        (status = 400, description = "Invalid package"),
        (status = 401, description = "Authentication required"),
        (status = 409, description = "Version already exists"),
    ),
    security(("bearerAuth" = []))
)]
#[put("/v2/package")]
pub async fn push(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    push_package(state.get_ref(), &user, body, None).await
}

/// Symbol packages ride alongside the main artifact row: same identity, own
/// storage path. A second row would collide with the (registry, name,
/// version) key, so the validated bytes land as a blob-store companion.
#[put("/v2/symbolpackage")]
pub async fn push_symbols(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let (id, version) = package_identity(&body)?;

    if !state.engine.settings().is_registry_enabled("nuget").await? {
        return Err(ApiError(RegistryError::RegistryDisabled("nuget".to_string())));
    }
    let id = id.to_lowercase();
    if !state
        .engine
        .ownership()
        .can_user_publish("nuget", &id, &user.0)
        .await?
    {
        return Err(ApiError(RegistryError::InsufficientPermissions));
    }

    validate_symbol_package(state.get_ref(), &id, &version, &body)?;

    let ctx = OpContext::new();
    state
        .engine
        .blobs()
        .store(
            &ctx,
            &symbol_storage_path(&id, &version),
            &body,
            SYMBOL_CONTENT_TYPE,
        )
        .await?;
    Ok(HttpResponse::Created().finish())
}

fn validate_symbol_package(
    state: &AppState,
    id: &str,
    version: &str,
    content: &[u8],
) -> Result<(), ApiError> {
    let adapter = state.engine.adapters().get("nuget")?;
    let now = chrono::Utc::now();
    let probe = depot_core::db::models::Artifact {
        id: String::new(),
        name: id.to_string(),
        version: version.to_string(),
        registry: "nuget".to_string(),
        content_type: SYMBOL_CONTENT_TYPE.to_string(),
        size: content.len() as i64,
        sha256: String::new(),
        storage_path: String::new(),
        metadata: Default::default(),
        downloads: 0,
        published_by: String::new(),
        is_public: false,
        created_at: now,
        updated_at: now,
        publisher: None,
    };
    adapter.validate(&probe, content)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Flat container
// ---------------------------------------------------------------------------

#[get("/v3/flatcontainer/{id}/index.json")]
pub async fn version_index(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner().to_lowercase();
    let artifacts = state.engine.db().artifact_versions("nuget", &id).await?;
    if artifacts.is_empty() {
        return Err(ApiError(RegistryError::NotFound(format!("nuget package {id}"))));
    }
    let versions: Vec<String> = artifacts
        .iter()
        .map(|a| a.version.to_lowercase())
        .collect();
    Ok(HttpResponse::Ok().json(serde_json::json!({ "versions": versions })))
}

#[get("/v3/flatcontainer/{id}/{version}/{file}")]
pub async fn flat_download(
    state: web::Data<AppState>,
    user: MaybeUser,
    path: web::Path<(String, String, String)>,
) -> ApiResult<HttpResponse> {
    let (id, version, _file) = path.into_inner();

    let ctx = OpContext::new();
    let (artifact, handle) = state
        .engine
        .download(
            &ctx,
            "nuget",
            &id.to_lowercase(),
            &version,
            user.0.as_ref().map(|u| u.id.as_str()),
        )
        .await?;
    let bytes = read_file(handle)
        .await
        .map_err(|err| ApiError(RegistryError::Io(err.to_string())))?;

    Ok(HttpResponse::Ok()
        .content_type(artifact.content_type)
        .body(bytes))
}

pub fn scope() -> impl HttpServiceFactory {
    web::scope("/nuget")
        .service(service_index)
        .service(push)
        .service(push_symbols)
        .service(version_index)
        .service(flat_download)
}
