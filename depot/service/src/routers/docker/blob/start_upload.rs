use crate::extractors::AuthUser;
use crate::shared::docker_error;
use crate::state::AppState;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, post, web};

#[post("/{name:.*}/blobs/uploads/")]
pub async fn handle(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<String>,
) -> impl Responder {
    let name = path.into_inner();

    match state.sessions.start_upload(&name, &user.0.id).await {
        Ok(session) => HttpResponse::Accepted()
            .append_header((
                "Location",
                format!("/v2/{name}/blobs/uploads/{}", session.id),
            ))
            .append_header(("Docker-Upload-UUID", session.id))
            .append_header(("Range", "0-0"))
            .finish(),
        Err(err) => {
            let _ = err;
            docker_error::response(
                StatusCode::BAD_REQUEST,
                docker_error::NAME_UNKNOWN,
                "invalid repository name",
            )
        }
    }
}
