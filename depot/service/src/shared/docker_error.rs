use actix_web::{HttpResponse, http::StatusCode};
use serde::Serialize;
use serde_json::{Value, json};

pub const BLOB_UNKNOWN: &str = "BLOB_UNKNOWN";
pub const BLOB_UPLOAD_UNKNOWN: &str = "BLOB_UPLOAD_UNKNOWN";
pub const DIGEST_INVALID: &str = "DIGEST_INVALID";
pub const MANIFEST_UNKNOWN: &str = "MANIFEST_UNKNOWN";
pub const NAME_UNKNOWN: &str = "NAME_UNKNOWN";
pub const DENIED: &str = "DENIED";
pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
pub const UNSUPPORTED: &str = "UNSUPPORTED";

#[derive(Serialize)]
struct DockerErrorBody {
    errors: Vec<DockerErrorEntry>,
}

#[derive(Serialize)]
struct DockerErrorEntry {
    code: &'static str,
    message: String,
    detail: Value,
}

pub fn response(status: StatusCode, code: &'static str, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(DockerErrorBody {
        errors: vec![DockerErrorEntry {
            code,
            message: message.into(),
            detail: json!({}),
        }],
    })
}

/// Maps a core error onto the OCI error body shape.
pub fn from_registry_error(err: &depot_core::RegistryError) -> HttpResponse {
    use depot_core::RegistryError;
    match err {
        RegistryError::NotFound(_) => {
            response(StatusCode::NOT_FOUND, MANIFEST_UNKNOWN, err.to_string())
        }
        RegistryError::AlreadyExists(_) => {
            response(StatusCode::CONFLICT, UNSUPPORTED, err.to_string())
        }
        RegistryError::ValidationFailed(_) => {
            response(StatusCode::BAD_REQUEST, UNSUPPORTED, err.to_string())
        }
        RegistryError::DigestMismatch { .. } => {
            response(StatusCode::BAD_REQUEST, DIGEST_INVALID, err.to_string())
        }
        RegistryError::Unauthorized
        | RegistryError::InvalidToken
        | RegistryError::ExpiredToken
        | RegistryError::InvalidApiKey => {
            response(StatusCode::UNAUTHORIZED, UNAUTHORIZED, err.to_string())
        }
        RegistryError::InsufficientPermissions => {
            response(StatusCode::FORBIDDEN, DENIED, err.to_string())
        }
        RegistryError::RegistryDisabled(_) => {
            response(StatusCode::SERVICE_UNAVAILABLE, UNSUPPORTED, err.to_string())
        }
        _ => response(
            StatusCode::INTERNAL_SERVER_ERROR,
            UNSUPPORTED,
            "internal server error",
        ),
    }
}
