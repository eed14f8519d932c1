use crate::extractors::AuthUser;
use crate::shared::docker_error;
use crate::state::AppState;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, delete, web};
use depot_core::OpContext;

#[delete("/{name:.*}/blobs/uploads/{uuid}")]
pub async fn handle(
    state: web::Data<AppState>,
    _user: AuthUser,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (_name, uuid) = path.into_inner();

    let ctx = OpContext::new();
    match state.sessions.cancel_upload(&ctx, &uuid).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(_) => docker_error::response(
            StatusCode::NOT_FOUND,
            docker_error::BLOB_UPLOAD_UNKNOWN,
            "blob upload unknown to registry",
        ),
    }
}
