use crate::shared::http_error::ApiResult;
use crate::state::AppState;
use actix_web::dev::HttpServiceFactory;
use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub user_id: String,
}

#[utoipa::path(
    post,
    operation_id = "register_user",
    tags = ["accounts"],
    path = "/api/v1/users",
    request_body(content = RegisterRequest, content_type = "application/json"),
    responses(
        (status = 201, description = "Account created"),
        (status = 400, description = "Invalid registration data"),
        (status = 409, description = "Username or email already taken"),
    )
)]
#[post("")]
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let user = state
        .accounts
        .register(&body.username, &body.email, &body.password, false)
        .await?;
    Ok(HttpResponse::Created().json(user))
}

#[utoipa::path(
    post,
    operation_id = "login",
    tags = ["accounts"],
    path = "/api/v1/users/login",
    request_body(content = LoginRequest, content_type = "application/json"),
    responses(
        (status = 200, description = "Bearer token issued", body = LoginResponse),
        (status = 400, description = "Invalid credentials"),
    )
)]
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let (user, token) = state.accounts.login(&body.username, &body.password).await?;
    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        username: user.username,
        user_id: user.id,
    }))
}

pub fn scope() -> impl HttpServiceFactory {
    web::scope("/api/v1/users").service(register).service(login)
}
