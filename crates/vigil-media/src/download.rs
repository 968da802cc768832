//! Source footage download over HTTP.

use std::path::Path;

use futures::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};

/// Download `url` into `dest`, returning the number of bytes written.
///
/// The body is streamed to disk. A non-success status or an empty body is a
/// download failure.
pub async fn download_source(client: &Client, url: &str, dest: &Path) -> MediaResult<u64> {
    debug!(url = %url, dest = %dest.display(), "Downloading source footage");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| {
            if e.is_redirect() {
                MediaError::download_failed(format!("Redirect refused: {}", e))
            } else {
                MediaError::download_failed(format!("Request failed: {}", e))
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(MediaError::download_failed(format!(
            "Source responded with HTTP {}",
            status.as_u16()
        )));
    }

    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk =
            chunk.map_err(|e| MediaError::download_failed(format!("Body read failed: {}", e)))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    if written == 0 {
        return Err(MediaError::download_failed("Source returned an empty body"));
    }

    info!(bytes = written, dest = %dest.display(), "Source footage downloaded");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_download_writes_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/footage.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 4096]))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("input.mp4");
        let url = format!("{}/footage.mp4", server.uri());

        let written = download_source(&Client::new(), &url, &dest).await.unwrap();

        assert_eq!(written, 4096);
        assert_eq!(tokio::fs::read(&dest).await.unwrap().len(), 4096);
    }

    #[tokio::test]
    async fn test_download_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let url = format!("{}/missing.mp4", server.uri());

        let err = download_source(&Client::new(), &url, &dir.path().join("input.mp4"))
            .await
            .unwrap_err();

        match err {
            MediaError::DownloadFailed { message } => assert!(message.contains("404")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_download_rejects_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let url = format!("{}/empty.mp4", server.uri());

        let err = download_source(&Client::new(), &url, &dir.path().join("input.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::DownloadFailed { .. }));
    }
}
