use actix_web::{HttpResponse, Responder, get};

// The distribution spec wants both /v2 and /v2/ answered.

#[get("")]
pub async fn handle_get() -> impl Responder {
    base_response()
}

#[get("/")]
pub async fn handle_get_slash() -> impl Responder {
    base_response()
}

fn base_response() -> HttpResponse {
    HttpResponse::Ok()
        .append_header(("Docker-Distribution-Api-Version", "registry/2.0"))
        .json(serde_json::json!({}))
}
