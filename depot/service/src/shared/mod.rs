pub mod docker_error;
pub mod http_error;

/// Drains an engine blob handle into memory for the response body.
pub async fn read_file(mut file: tokio::fs::File) -> std::io::Result<Vec<u8>> {
    use tokio::io::AsyncReadExt;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf).await?;
    Ok(buf)
}
