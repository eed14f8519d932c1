use crate::routers::docker::blob_path_candidates;
use crate::state::AppState;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use depot_core::OpContext;
use depot_core::adapters::oci::is_digest;

#[actix_web::head("/{name:.*}/blobs/{digest}")]
pub async fn handle(state: web::Data<AppState>, path: web::Path<(String, String)>) -> impl Responder {
    let (name, digest) = path.into_inner();
    if !is_digest(&digest) {
        return HttpResponse::new(StatusCode::BAD_REQUEST);
    }

    let ctx = OpContext::new();
    for candidate in blob_path_candidates(&name, &digest) {
        if let Ok(size) = state.engine.blobs().size(&ctx, &candidate).await {
            return HttpResponse::Ok()
                .append_header(("Content-Length", size.to_string()))
                .append_header(("Docker-Content-Digest", digest))
                .finish();
        }
    }
    HttpResponse::new(StatusCode::NOT_FOUND)
}
