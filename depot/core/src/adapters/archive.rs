//! Shared archive plumbing for the tarball-shaped formats.

use crate::error::{RegistryError, Result};
use flate2::read::GzDecoder;
use std::io::Read;
use tar::Archive;

/// Gunzips `bytes` fully into memory.
pub(super) fn gunzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|err| RegistryError::ValidationFailed(format!("not a gzip stream: {err}")))?;
    Ok(out)
}

/// Walks a tar stream and returns the first entry whose path satisfies
/// `matches`, as (entry path, contents).
pub(super) fn find_tar_entry(
    tar_bytes: &[u8],
    matches: impl Fn(&str) -> bool,
) -> Result<Option<(String, Vec<u8>)>> {
    let mut archive = Archive::new(tar_bytes);
    let entries = archive
        .entries()
        .map_err(|err| RegistryError::ValidationFailed(format!("not a tar archive: {err}")))?;

    for entry in entries {
        let mut entry =
            entry.map_err(|err| RegistryError::ValidationFailed(format!("bad tar entry: {err}")))?;
        let path = entry
            .path()
            .map_err(|err| RegistryError::ValidationFailed(format!("bad tar path: {err}")))?
            .to_string_lossy()
            .into_owned();
        if matches(&path) {
            let mut contents = Vec::new();
            entry
                .read_to_end(&mut contents)
                .map_err(|err| RegistryError::ValidationFailed(format!("bad tar entry: {err}")))?;
            return Ok(Some((path, contents)));
        }
    }
    Ok(None)
}

/// Basename of a tar entry path.
pub(super) fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
