use crate::shared::docker_error;
use crate::state::AppState;
use actix_web::{HttpResponse, Responder, get, web};
use depot_core::OpContext;

#[get("/{name:.*}/tags/list")]
pub async fn handle(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let name = path.into_inner();
    let ctx = OpContext::new();

    match depot_core::oci::list_tags(&ctx, state.engine.blobs().as_ref(), &name).await {
        Ok(tags) => HttpResponse::Ok().json(serde_json::json!({
            "name": name,
            "tags": tags,
        })),
        Err(err) => docker_error::from_registry_error(&err),
    }
}
