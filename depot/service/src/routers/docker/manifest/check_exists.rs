use crate::shared::read_file;
use crate::state::AppState;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use depot_core::OpContext;
use depot_core::adapters::oci::{compute_digest, manifest_path};

#[actix_web::head("/{name:.*}/manifests/{reference}")]
pub async fn handle(state: web::Data<AppState>, path: web::Path<(String, String)>) -> impl Responder {
    let (name, reference) = path.into_inner();
    let ctx = OpContext::new();

    let Ok(handle) = state
        .engine
        .blobs()
        .retrieve(&ctx, &manifest_path(&name, &reference))
        .await
    else {
        return HttpResponse::new(StatusCode::NOT_FOUND);
    };
    match read_file(handle).await {
        Ok(bytes) => HttpResponse::Ok()
            .append_header(("Docker-Content-Digest", compute_digest(&bytes)))
            .append_header(("Content-Length", bytes.len().to_string()))
            .finish(),
        Err(_) => HttpResponse::new(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
