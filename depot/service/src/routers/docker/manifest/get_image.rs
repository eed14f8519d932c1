use crate::shared::docker_error;
use crate::shared::read_file;
use crate::state::AppState;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, get, web};
use depot_core::OpContext;
use depot_core::adapters::oci::{DEFAULT_MANIFEST_TYPE, compute_digest, manifest_path};

#[get("/{name:.*}/manifests/{reference}")]
pub async fn handle(state: web::Data<AppState>, path: web::Path<(String, String)>) -> impl Responder {
    let (name, reference) = path.into_inner();
    let ctx = OpContext::new();

    let handle = match state
        .engine
        .blobs()
        .retrieve(&ctx, &manifest_path(&name, &reference))
        .await
    {
        Ok(handle) => handle,
        Err(_) => {
            return docker_error::response(
                StatusCode::NOT_FOUND,
                docker_error::MANIFEST_UNKNOWN,
                "manifest unknown to registry",
            );
        }
    };
    let bytes = match read_file(handle).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return docker_error::response(
                StatusCode::INTERNAL_SERVER_ERROR,
                docker_error::UNSUPPORTED,
                "internal server error",
            );
        }
    };

    let content_type = state
        .engine
        .db()
        .artifact_by_identity("oci", &name, &reference)
        .await
        .ok()
        .flatten()
        .map(|artifact| artifact.content_type)
        .unwrap_or_else(|| DEFAULT_MANIFEST_TYPE.to_string());

    HttpResponse::Ok()
        .content_type(content_type)
        .append_header(("Docker-Content-Digest", compute_digest(&bytes)))
        .body(bytes)
}
