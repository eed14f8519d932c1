use crate::shared::docker_error;
use crate::state::AppState;
use actix_web::{HttpResponse, Responder, get, web};
use depot_core::OpContext;
use depot_core::db::artifacts::ArtifactFilter;

#[get("/_catalog")]
pub async fn handle(state: web::Data<AppState>) -> impl Responder {
    let ctx = OpContext::new();
    let filter = ArtifactFilter {
        registry: Some("oci".to_string()),
        ..Default::default()
    };
    let artifacts = match state.engine.list(&ctx, &filter).await {
        Ok((artifacts, _)) => artifacts,
        Err(err) => return docker_error::from_registry_error(&err),
    };

    let mut repositories: Vec<String> = artifacts.into_iter().map(|a| a.name).collect();
    repositories.sort();
    repositories.dedup();

    HttpResponse::Ok().json(serde_json::json!({ "repositories": repositories }))
}
