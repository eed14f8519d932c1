use crate::extractors::MaybeUser;
use crate::shared::http_error::ApiResult;
use crate::state::AppState;
use actix_web::dev::HttpServiceFactory;
use actix_web::{HttpResponse, get, web};
use depot_core::OpContext;
use depot_core::db::artifacts::ArtifactFilter;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub name: Option<String>,
    pub registry: Option<String>,
    /// Comma-separated tag list; all must match.
    pub tags: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[utoipa::path(
    get,
    operation_id = "list_artifacts",
    tags = ["artifacts"],
    path = "/api/v1/artifacts",
    params(
        ("name" = Option<String>, Query, description = "Case-insensitive name substring"),
        ("registry" = Option<String>, Query, description = "Format tag"),
        ("tags" = Option<String>, Query, description = "Comma-separated tags"),
        ("limit" = Option<i64>, Query, description = "Page size"),
        ("offset" = Option<i64>, Query, description = "Page offset"),
    ),
    responses(
        (status = 200, description = "Requested page and total count"),
    )
)]
#[get("")]
pub async fn list(
    state: web::Data<AppState>,
    _user: MaybeUser,
    query: web::Query<ListQuery>,
) -> ApiResult<HttpResponse> {
    let query = query.into_inner();
    let filter = ArtifactFilter {
        name: query.name,
        registry: query.registry,
        tags: query
            .tags
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        limit: query.limit.unwrap_or(50).clamp(1, 500),
        offset: query.offset.unwrap_or(0).max(0),
    };

    let ctx = OpContext::new();
    let (artifacts, total) = state.engine.list(&ctx, &filter).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "artifacts": artifacts,
        "total": total,
    })))
}

pub fn scope() -> impl HttpServiceFactory {
    web::scope("/api/v1/artifacts").service(list)
}
