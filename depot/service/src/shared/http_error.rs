use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use depot_core::RegistryError;

/// HTTP-facing wrapper for the core error taxonomy.
#[derive(Debug)]
pub struct ApiError(pub RegistryError);

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        Self(err)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            RegistryError::NotFound(_) => StatusCode::NOT_FOUND,
            RegistryError::AlreadyExists(_) | RegistryError::LastOwner(_) => StatusCode::CONFLICT,
            RegistryError::ValidationFailed(_)
            | RegistryError::DigestMismatch { .. }
            | RegistryError::UnsupportedRegistry(_) => StatusCode::BAD_REQUEST,
            RegistryError::Unauthorized
            | RegistryError::InvalidToken
            | RegistryError::ExpiredToken
            | RegistryError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            RegistryError::InsufficientPermissions => StatusCode::FORBIDDEN,
            RegistryError::RegistryDisabled(_) => StatusCode::SERVICE_UNAVAILABLE,
            RegistryError::Cancelled | RegistryError::Io(_) | RegistryError::Db(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "errors": [{ "detail": self.0.to_string() }]
        }))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
