use crate::extractors::AuthUser;
use crate::routers::docker::DigestQuery;
use crate::shared::docker_error;
use crate::state::AppState;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, put, web};
use depot_core::OpContext;
use depot_core::RegistryError;
use depot_core::adapters::oci::is_digest;

#[put("/{name:.*}/blobs/uploads/{uuid}")]
pub async fn handle(
    state: web::Data<AppState>,
    _user: AuthUser,
    path: web::Path<(String, String)>,
    query: web::Query<DigestQuery>,
    body: web::Bytes,
) -> impl Responder {
    let (name, uuid) = path.into_inner();

    let expected = query.digest.clone().unwrap_or_default();
    if !expected.is_empty() && !is_digest(&expected) {
        return docker_error::response(
            StatusCode::BAD_REQUEST,
            docker_error::DIGEST_INVALID,
            "invalid digest",
        );
    }

    let ctx = OpContext::new();

    // Optional final chunk rides on the PUT itself.
    if !body.is_empty()
        && let Err(err) = state.sessions.append_chunk(&ctx, &uuid, &body).await
    {
        return docker_error::from_registry_error(&err);
    }

    match state
        .sessions
        .complete_upload(&ctx, &uuid, (!expected.is_empty()).then_some(expected.as_str()))
        .await
    {
        Ok(completed) => HttpResponse::Created()
            .append_header((
                "Location",
                format!("/v2/{name}/blobs/{}", completed.digest),
            ))
            .append_header(("Docker-Content-Digest", completed.digest))
            .finish(),
        Err(RegistryError::NotFound(_)) => docker_error::response(
            StatusCode::NOT_FOUND,
            docker_error::BLOB_UPLOAD_UNKNOWN,
            "blob upload unknown to registry",
        ),
        Err(err) => docker_error::from_registry_error(&err),
    }
}
