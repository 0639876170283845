use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::{Client, StatusCode, header};
use std::io::Cursor;
use std::time::{Duration, SystemTime};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::io::StreamReader;

use super::{TransferSession, TransferStream};
use crate::error::{FileError, Result};

/// Transfer session over HTTP using Range requests
///
/// Reads use `GET` with `Range: bytes=<offset>-` and stream the body, so a
/// short read only pulls what it consumes before the stream is dropped.
/// Metadata comes from `HEAD`. Writes check the path with `HEAD`, then
/// `PUT` the bytes in place with a `Content-Range` header. Failures are
/// never retried at this layer.
pub struct HttpSession {
    client: Client,
    base_url: String,
}

impl HttpSession {
    /// Create a new HTTP session rooted at `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn head(&self, path: &str) -> Result<reqwest::Response> {
        let resp = self.client.head(self.url(path)).send().await?;
        check_status(path, resp.status())?;
        Ok(resp)
    }
}

fn check_status(path: &str, status: StatusCode) -> Result<()> {
    if status == StatusCode::NOT_FOUND {
        return Err(FileError::NotFound(path.to_string()));
    }
    if !status.is_success() {
        return Err(FileError::transport(anyhow::anyhow!(
            "HTTP request for {path} failed with status: {status}"
        )));
    }
    Ok(())
}

#[async_trait]
impl TransferSession for HttpSession {
    async fn retrieve_from(&self, path: &str, offset: u64) -> Result<TransferStream> {
        let resp = self
            .client
            .get(self.url(path))
            .header(header::RANGE, format!("bytes={offset}-"))
            .send()
            .await?;

        match resp.status() {
            // Offset sits exactly at the end of the object
            StatusCode::RANGE_NOT_SATISFIABLE => return Ok(Box::new(Cursor::new(Vec::new()))),
            StatusCode::OK if offset > 0 => {
                return Err(FileError::transport(anyhow::anyhow!(
                    "Remote server does not support Range requests"
                )));
            }
            status => check_status(path, status)?,
        }

        tracing::debug!("Streaming {} from offset {}", path, offset);
        // Dropping the reader drops the response and ends the transfer
        let body = resp.bytes_stream().map_err(std::io::Error::other);
        Ok(Box::new(StreamReader::new(Box::pin(body))))
    }

    async fn store_from(
        &self,
        path: &str,
        data: &mut (dyn AsyncRead + Send + Unpin),
        offset: u64,
    ) -> Result<()> {
        let mut body = Vec::new();
        data.read_to_end(&mut body).await?;

        // An empty store still has to report a missing path
        self.head(path).await?;
        if body.is_empty() {
            return Ok(());
        }

        let end = offset + body.len() as u64 - 1;
        let resp = self
            .client
            .put(self.url(path))
            .header(header::CONTENT_RANGE, format!("bytes {offset}-{end}/*"))
            .body(body)
            .send()
            .await?;
        check_status(path, resp.status())
    }

    async fn file_size(&self, path: &str) -> Result<u64> {
        let resp = self.head(path).await?;
        resp.headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                FileError::transport(anyhow::anyhow!(
                    "Remote server did not return Content-Length for {path}"
                ))
            })
    }

    async fn modification_time(&self, path: &str) -> Result<SystemTime> {
        let resp = self.head(path).await?;
        let value = resp
            .headers()
            .get(header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                FileError::transport(anyhow::anyhow!(
                    "Remote server did not return Last-Modified for {path}"
                ))
            })?;
        parse_http_date(value)
    }

    async fn create(&self, path: &str) -> Result<()> {
        let resp = self.client.put(self.url(path)).body(Vec::new()).send().await?;
        check_status(path, resp.status())
    }
}

fn parse_http_date(value: &str) -> Result<SystemTime> {
    let parsed = chrono::DateTime::parse_from_rfc2822(value).map_err(|e| {
        FileError::transport(anyhow::anyhow!("invalid Last-Modified header {value:?}: {e}"))
    })?;
    Ok(SystemTime::from(parsed))
}
