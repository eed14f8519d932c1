use crate::extractors::{AuthUser, MaybeUser};
use crate::shared::http_error::{ApiError, ApiResult};
use crate::shared::read_file;
use crate::state::AppState;
use actix_web::dev::HttpServiceFactory;
use actix_web::{HttpResponse, get, post, web};
use depot_core::OpContext;
use depot_core::RegistryError;
use depot_core::adapters::rubygems::gem_identity;
use depot_core::engine::UploadRequest;

#[post("/api/v1/gems")]
pub async fn push(
    state: web::Data<AppState>,
    user: AuthUser,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let (name, version) = gem_identity(&body)?;

    let ctx = OpContext::new();
    state
        .engine
        .upload(
            &ctx,
            UploadRequest {
                registry: "rubygems".to_string(),
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

#[get("/gems/{file}")]
pub async fn fetch(
    state: web::Data<AppState>,
    user: MaybeUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let file = path.into_inner();
    let Some(stem) = file.strip_suffix(".gem") else {
        return Err(ApiError(RegistryError::NotFound(format!("gem {file}"))));
    };
    let Some((name, version)) = split_gem_filename(stem) else {
        return Err(ApiError(RegistryError::NotFound(format!("gem {file}"))));
    };

    let ctx = OpContext::new();
    let (artifact, handle) = state
        .engine
        .download(&ctx, "rubygems", name, version, user.0.as_ref().map(|u| u.id.as_str()))
        .await?;
    let bytes = read_file(handle)
        .await
        .map_err(|err| ApiError(RegistryError::Io(err.to_string())))?;
    Ok(HttpResponse::Ok()
        .content_type(artifact.content_type)
        .body(bytes))
}

/// `<name>-<version>`: the version starts at the last hyphen followed by a
/// digit (gem names may contain hyphens themselves).
fn split_gem_filename(stem: &str) -> Option<(&str, &str)> {
    for (idx, _) in stem.match_indices('-').collect::<Vec<_>>().into_iter().rev() {
        let candidate = &stem[idx + 1..];
        if candidate.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return Some((&stem[..idx], candidate));
        }
    }
    None
}

pub fn scope() -> impl HttpServiceFactory {
    web::scope("/rubygems").service(push).service(fetch)
}
