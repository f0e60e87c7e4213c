//! HTTP transport to the collector

use crate::error::UplinkError;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Upper bound on a single delivery
pub const DEFAULT_TRANSMIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Something that can carry one encoded batch to the collector
pub trait Transport: Send + Sync {
    /// Deliver `body`, returning the success status code
    fn post(&self, body: String) -> impl Future<Output = Result<u16, UplinkError>> + Send;
}

/// `POST text/plain` to a fixed endpoint
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport for `endpoint` with a per-request timeout
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, UplinkError> {
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(UplinkError::InvalidEndpoint(endpoint.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UplinkError::Http(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    /// Target endpoint
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    async fn post(&self, body: String) -> Result<u16, UplinkError> {
        debug!("POST {} ({} bytes)", self.endpoint, body.len());

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "text/plain")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    UplinkError::Timeout(self.timeout.as_millis() as u64)
                } else {
                    UplinkError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(status.as_u16())
        } else {
            Err(UplinkError::Status(status.as_u16()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_http_endpoint() {
        let url = Url::parse("ftp://collector.local/co2_data").unwrap();
        assert!(matches!(
            HttpTransport::new(url, DEFAULT_TRANSMIT_TIMEOUT),
            Err(UplinkError::InvalidEndpoint(_))
        ));
    }

    async fn serve_once(response: &'static [u8]) -> (Url, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            // Bodies in these tests always end with a newline-terminated record
            let body_complete = |request: &[u8]| {
                request
                    .windows(4)
                    .position(|w| w == b"\r\n\r\n")
                    .map(|end| &request[end + 4..])
                    .is_some_and(|body| body.ends_with(b"\n"))
            };
            while !body_complete(&request) {
                let n = socket.read(&mut buf).await.unwrap();
                assert!(n > 0);
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response).await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        let url = Url::parse(&format!("http://{}/co2_data", addr)).unwrap();
        (url, server)
    }

    #[tokio::test]
    async fn test_posts_plain_text_body() {
        let (url, server) =
            serve_once(b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{}").await;

        let transport = HttpTransport::new(url, DEFAULT_TRANSMIT_TIMEOUT).unwrap();
        let status = transport.post("Z 1\nZ 2\n".to_string()).await.unwrap();
        assert_eq!(status, 200);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /co2_data HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("content-type: text/plain"));
        assert!(request.ends_with("Z 1\nZ 2\n"));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let (url, _server) = serve_once(
            b"HTTP/1.1 400 Bad Request\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        )
        .await;

        let transport = HttpTransport::new(url, DEFAULT_TRANSMIT_TIMEOUT).unwrap();
        assert!(matches!(
            transport.post("Z 1\n".to_string()).await,
            Err(UplinkError::Status(400))
        ));
    }
}
