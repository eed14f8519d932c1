use crate::shared::docker_error;
use crate::state::AppState;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, get, web};

#[get("/{name:.*}/blobs/uploads/{uuid}")]
pub async fn handle(state: web::Data<AppState>, path: web::Path<(String, String)>) -> impl Responder {
    let (_name, uuid) = path.into_inner();

    match state.sessions.get_session(&uuid).await {
        Some(session) => HttpResponse::NoContent()
            .append_header(("Docker-Upload-UUID", session.id))
            .append_header(("Range", format!("0-{}", session.size.max(1) - 1)))
            .finish(),
        None => docker_error::response(
            StatusCode::NOT_FOUND,
            docker_error::BLOB_UPLOAD_UNKNOWN,
            "blob upload unknown to registry",
        ),
    }
}
