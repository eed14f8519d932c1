use crate::extractors::{AuthUser, MaybeUser};
use crate::shared::http_error::{ApiError, ApiResult};
use crate::shared::read_file;
use crate::state::AppState;
use actix_web::dev::HttpServiceFactory;
use actix_web::{HttpResponse, get, put, web};
use depot_core::OpContext;
use depot_core::RegistryError;
use depot_core::engine::UploadRequest;

/// A Maven repository path:
/// `<group as slashes>/<artifactId>/<version>/<artifactId>-<version>.<ext>`.
struct Coordinates {
    name: String,
    version: String,
    extension: String,
}

fn parse_repository_path(tail: &str) -> Option<Coordinates> {
    let segments: Vec<&str> = tail.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() < 4 {
        return None;
    }
    let file = segments[segments.len() - 1];
    let version = segments[segments.len() - 2];
    let artifact_id = segments[segments.len() - 3];
    let group_id = segments[..segments.len() - 3].join(".");

    let expected_stem = format!("{artifact_id}-{version}.");
    let extension = file.strip_prefix(&expected_stem)?;

    Some(Coordinates {
        name: format!("{group_id}:{artifact_id}"),
        version: version.to_string(),
        extension: extension.to_string(),
    })
}

fn is_archive(extension: &str) -> bool {
    matches!(extension, "jar" | "war" | "aar")
}

#[put("/{tail:.*}")]
pub async fn deploy(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let tail = path.into_inner();
    let Some(coords) = parse_repository_path(&tail) else {
        return Err(ApiError(RegistryError::ValidationFailed(format!(
            "not a maven repository path: {tail}"
        ))));
    };

    let ctx = OpContext::new();
    if is_archive(&coords.extension) {
        state
            .engine
            .upload(
                &ctx,
                UploadRequest {
                    registry: "maven".to_string(),
                    name: coords.name,
                    version: coords.version,
                    content: body.to_vec(),
                    content_type: None,
                    metadata: None,
                },
                &user.0,
            )
            .await?;
        return Ok(HttpResponse::Created().finish());
    }

    // POMs and checksum files ride alongside the archive artifact; they are
    // blob-store sidecars, gated by the same publish permission.
    if !state.engine.settings().is_registry_enabled("maven").await? {
        return Err(ApiError(RegistryError::RegistryDisabled("maven".to_string())));
    }
    if !state
        .engine
        .ownership()
        .can_user_publish("maven", &coords.name, &user.0)
        .await?
    {
        return Err(ApiError(RegistryError::InsufficientPermissions));
    }
    let content_type = if coords.extension == "pom" {
        "application/xml"
    } else {
        "text/plain"
    };
    state
        .engine
        .blobs()
        .store(&ctx, &format!("maven/{tail}"), &body, content_type)
        .await?;
    Ok(HttpResponse::Created().finish())
}

#[get("/{tail:.*}")]
pub async fn fetch(
    state: web::Data<AppState>,
    user: MaybeUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let tail = path.into_inner();
    let Some(coords) = parse_repository_path(&tail) else {
        return Err(ApiError(RegistryError::NotFound(format!("maven path {tail}"))));
    };

    let ctx = OpContext::new();
    if is_archive(&coords.extension) {
        let (artifact, handle) = state
            .engine
            .download(
                &ctx,
                "maven",
                &coords.name,
                &coords.version,
                user.0.as_ref().map(|u| u.id.as_str()),
            )
            .await?;
        let bytes = read_file(handle)
            .await
            .map_err(|err| ApiError(RegistryError::Io(err.to_string())))?;
        return Ok(HttpResponse::Ok()
            .content_type(artifact.content_type)
            .body(bytes));
    }

    let handle = state
        .engine
        .blobs()
        .retrieve(&ctx, &format!("maven/{tail}"))
        .await?;
    let bytes = read_file(handle)
        .await
        .map_err(|err| ApiError(RegistryError::Io(err.to_string())))?;
    let content_type = if coords.extension == "pom" {
        "application/xml"
    } else {
        "text/plain"
    };
    Ok(HttpResponse::Ok().content_type(content_type).body(bytes))
}

pub fn scope() -> impl HttpServiceFactory {
    web::scope("/maven").service(deploy).service(fetch)
}
