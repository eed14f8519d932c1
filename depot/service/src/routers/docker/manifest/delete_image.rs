use crate::extractors::AuthUser;
use crate::shared::docker_error;
use crate::state::AppState;
use actix_web::{HttpResponse, Responder, delete, web};
use depot_core::OpContext;

#[delete("/{name:.*}/manifests/{reference}")]
pub async fn handle(
    state: web::Data<AppState>,
    user: AuthUser,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (name, reference) = path.into_inner();

    let ctx = OpContext::new();
    match state
        .engine
        .delete(&ctx, "oci", &name, &reference, &user.0)
        .await
    {
        Ok(()) => HttpResponse::Accepted().finish(),
        Err(err) => docker_error::from_registry_error(&err),
    }
}
