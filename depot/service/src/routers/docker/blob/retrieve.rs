use crate::routers::docker::blob_path_candidates;
use crate::shared::docker_error;
use crate::shared::read_file;
use crate::state::AppState;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, get, web};
use depot_core::OpContext;
use depot_core::adapters::oci::is_digest;

#[get("/{name:.*}/blobs/{digest}")]
pub async fn handle(state: web::Data<AppState>, path: web::Path<(String, String)>) -> impl Responder {
    let (name, digest) = path.into_inner();
    if !is_digest(&digest) {
        return docker_error::response(
            StatusCode::BAD_REQUEST,
            docker_error::DIGEST_INVALID,
            "invalid digest",
        );
    }

    let ctx = OpContext::new();
    for candidate in blob_path_candidates(&name, &digest) {
        if let Ok(handle) = state.engine.blobs().retrieve(&ctx, &candidate).await {
            return match read_file(handle).await {
                Ok(bytes) => HttpResponse::Ok()
                    .content_type("application/octet-stream")
                    .append_header(("Docker-Content-Digest", digest))
                    .body(bytes),
                Err(_) => docker_error::response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    docker_error::UNSUPPORTED,
                    "internal server error",
                ),
            };
        }
    }
    docker_error::response(
        StatusCode::NOT_FOUND,
        docker_error::BLOB_UNKNOWN,
        "blob unknown to registry",
    )
}
