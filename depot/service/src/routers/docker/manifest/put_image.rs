use crate::extractors::AuthUser;
use crate::shared::docker_error;
use crate::state::AppState;
use actix_web::{HttpRequest, HttpResponse, Responder, put, web};
use depot_core::OpContext;
use depot_core::adapters::ArtifactMetadata;
use depot_core::engine::UploadRequest;

#[put("/{name:.*}/manifests/{reference}")]
pub async fn handle(
    state: web::Data<AppState>,
    user: AuthUser,
    req: HttpRequest,
    path: web::Path<(String, String)>,
    body: web::Bytes,
) -> impl Responder {
    let (name, reference) = path.into_inner();

    let content_type = req
        .headers()
        .get("Content-Type")
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    let ctx = OpContext::new();
    let artifact = match state
        .engine
        .upload(
            &ctx,
            UploadRequest {
                registry: "oci".to_string(),
                name: name.clone(),
                version: reference,
                content: body.to_vec(),
                content_type,
                metadata: None,
            },
            &user.0,
        )
        .await
    {
        Ok(artifact) => artifact,
        Err(err) => return docker_error::from_registry_error(&err),
    };

    let digest = match &artifact.metadata {
        ArtifactMetadata::Oci(meta) => meta.digest.clone().unwrap_or_default(),
        _ => String::new(),
    };

    HttpResponse::Created()
        .append_header(("Location", format!("/v2/{name}/manifests/{digest}")))
        .append_header(("Docker-Content-Digest", digest))
        .finish()
}
