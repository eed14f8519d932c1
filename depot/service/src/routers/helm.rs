use crate::extractors::{AuthUser, MaybeUser};
use crate::shared::http_error::{ApiError, ApiResult};
use crate::shared::read_file;
use crate::state::AppState;
use actix_web::dev::HttpServiceFactory;
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use depot_core::OpContext;
use depot_core::RegistryError;
use depot_core::adapters::ArtifactMetadata;
use depot_core::adapters::helm::chart_identity;
use depot_core::db::artifacts::ArtifactFilter;
use depot_core::engine::UploadRequest;
use serde::Serialize;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Repository index (index.yaml)
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct IndexEntry {
    name: String,
    version: String,
    urls: Vec<String>,
    created: String,
    digest: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "apiVersion", skip_serializing_if = "Option::is_none")]
    api_version: Option<String>,
    #[serde(rename = "appVersion", skip_serializing_if = "Option::is_none")]
    app_version: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    keywords: Vec<String>,
}

#[derive(Serialize)]
struct RepositoryIndex {
    #[serde(rename = "apiVersion")]
    api_version: String,
    entries: BTreeMap<String, Vec<IndexEntry>>,
    generated: String,
}

#[get("/index.yaml")]
pub async fn index(state: web::Data<AppState>, req: HttpRequest) -> ApiResult<HttpResponse> {
    let ctx = OpContext::new();
    let filter = ArtifactFilter {
        registry: Some("helm".to_string()),
        ..Default::default()
    };
    let (artifacts, _) = state.engine.list(&ctx, &filter).await?;

    let info = req.connection_info();
    let base = format!("{}://{}", info.scheme(), info.host());

    let mut entries: BTreeMap<String, Vec<IndexEntry>> = BTreeMap::new();
    for artifact in artifacts {
        let (description, api_version, app_version, keywords) = match &artifact.metadata {
            ArtifactMetadata::Helm(meta) => (
                meta.description.clone(),
                meta.api_version.clone(),
                meta.app_version.clone(),
                meta.keywords.clone(),
            ),
            _ => (None, None, None, Vec::new()),
        };
        entries.entry(artifact.name.clone()).or_default().push(IndexEntry {
            urls: vec![format!(
                "{base}/helm/charts/{}-{}.tgz",
                artifact.name, artifact.version
            )],
            created: artifact.created_at.to_rfc3339(),
            digest: artifact.sha256.clone(),
            description,
            api_version,
            app_version,
            keywords,
            name: artifact.name,
            version: artifact.version,
        });
    }

    let index = RepositoryIndex {
        api_version: "v1".to_string(),
        entries,
        generated: chrono::Utc::now().to_rfc3339(),
    };
    let yaml = serde_yaml::to_string(&index)
        .map_err(|err| ApiError(RegistryError::Io(err.to_string())))?;
    Ok(HttpResponse::Ok()
        .content_type("application/x-yaml")
        .body(yaml))
}

// ---------------------------------------------------------------------------
// Chart push and fetch
// ---------------------------------------------------------------------------

#[post("/api/charts")]
pub async fn push(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let (name, version) = chart_identity(&body)?;

    let ctx = OpContext::new();
    state
        .engine
        .upload(
            &ctx,
            UploadRequest {
                registry: "helm".to_string(),
                name,
                version,
                content: body.to_vec(),
                content_type: None,
                metadata: None,
            },
            &user.0,
        )
        .await?;
    Ok(HttpResponse::Created().json(serde_json::json!({ "saved": true })))
}

#[get("/charts/{file}")]
pub async fn fetch(
    state: web::Data<AppState>,
    user: MaybeUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let file = path.into_inner();
    let Some(stem) = file.strip_suffix(".tgz") else {
        return Err(ApiError(RegistryError::NotFound(format!("chart {file}"))));
    };
    // `<name>-<version>`: the version starts at the last hyphen that is
    // followed by a digit.
    let Some((name, version)) = split_chart_filename(stem) else {
        return Err(ApiError(RegistryError::NotFound(format!("chart {file}"))));
    };

    let ctx = OpContext::new();
    let (artifact, handle) = state
        .engine
        .download(&ctx, "helm", name, version, user.0.as_ref().map(|u| u.id.as_str()))
        .await?;
    let bytes = read_file(handle)
        .await
        .map_err(|err| ApiError(RegistryError::Io(err.to_string())))?;
    Ok(HttpResponse::Ok()
        .content_type(artifact.content_type)
        .body(bytes))
}

fn split_chart_filename(stem: &str) -> Option<(&str, &str)> {
    for (idx, _) in stem.match_indices('-') {
        let candidate = &stem[idx + 1..];
        if candidate.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return Some((&stem[..idx], candidate));
        }
    }
    None
}

pub fn scope() -> impl HttpServiceFactory {
    web::scope("/helm")
        .service(index)
        .service(push)
        .service(fetch)
}
