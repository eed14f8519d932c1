use actix_web::dev::HttpServiceFactory;
use actix_web::web;
use serde::Deserialize;

pub mod blob;
pub mod manifest;
pub mod registry;

/// Chunked sessions finalize under `blobs/<digest>`, engine-pushed
/// digest-referenced content under `blobs/sha256/<hex>`; lookups accept
/// both.
pub(crate) fn blob_path_candidates(name: &str, digest: &str) -> Vec<String> {
    let mut candidates = vec![format!("oci/{name}/blobs/{digest}")];
    if let Some(hex) = digest.strip_prefix("sha256:") {
        candidates.push(format!("oci/{name}/blobs/sha256/{hex}"));
    }
    candidates
}

#[derive(Deserialize)]
pub struct DigestQuery {
    pub digest: Option<String>,
}

pub fn scope() -> impl HttpServiceFactory {
    web::scope("/v2")
        // Registry endpoints
        .service(registry::check::handle_get)
        .service(registry::check::handle_get_slash)
        .service(registry::catalog::handle)
        .service(registry::tags::handle)
        // Blob upload endpoints (before the digest routes: both live under
        // /blobs/)
        .service(blob::start_upload::handle)
        .service(blob::get_upload_status::handle)
        .service(blob::upload_chunk::handle)
        .service(blob::complete_upload::handle)
        .service(blob::cancel_upload::handle)
        // Blob endpoints
        .service(blob::check_exists::handle)
        .service(blob::retrieve::handle)
        // Manifest endpoints
        .service(manifest::check_exists::handle)
        .service(manifest::get_image::handle)
        .service(manifest::put_image::handle)
        .service(manifest::delete_image::handle)
}
