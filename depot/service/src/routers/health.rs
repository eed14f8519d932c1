use actix_web::dev::HttpServiceFactory;
use actix_web::{HttpResponse, Responder, get, web};

#[utoipa::path(
    get,
    operation_id = "health",
    tags = ["health"],
    path = "/health",
    responses(
        (status = 200, description = "Service is up"),
    )
)]
#[get("")]
pub async fn handle() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "depot",
    }))
}

pub fn scope() -> impl HttpServiceFactory {
    web::scope("/health").service(handle)
}
