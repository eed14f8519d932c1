use crate::extractors::AuthUser;
use crate::shared::docker_error;
use crate::state::AppState;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, patch, web};
use depot_core::OpContext;
use depot_core::RegistryError;

#[patch("/{name:.*}/blobs/uploads/{uuid}")]
pub async fn handle(
    state: web::Data<AppState>,
    _user: AuthUser,
    path: web::Path<(String, String)>,
    body: web::Bytes,
) -> impl Responder {
    let (_name, uuid) = path.into_inner();

    if body.is_empty() {
        return docker_error::response(
            StatusCode::BAD_REQUEST,
            docker_error::UNSUPPORTED,
            "empty upload chunk",
        );
    }

    let ctx = OpContext::new();
    match state.sessions.append_chunk(&ctx, &uuid, &body).await {
        Ok(size) => HttpResponse::Accepted()
            .append_header(("Range", format!("0-{}", size - 1)))
            .append_header(("Docker-Upload-UUID", uuid))
            .finish(),
        Err(RegistryError::NotFound(_)) => docker_error::response(
            StatusCode::NOT_FOUND,
            docker_error::BLOB_UPLOAD_UNKNOWN,
            "blob upload unknown to registry",
        ),
        Err(err) => docker_error::from_registry_error(&err),
    }
}
