//! HTTP fetch pipeline behind the cache manager's `Fetcher` seam.
//!
//! ### Contract
//! - Any HTTP status, including 4xx/5xx, is returned as a response.
//! - Only transport failures (connect, timeout, oversize body) are errors;
//!   those are what trigger the manager's offline fallback.
//!
//! ### Safety limits
//! - Max redirects: 5
//! - Max body bytes: 5MB (configurable)
//! - Request timeout: 20s (configurable)

use reqwest::{Client, Method};
use std::time::{Duration, Instant};

use tripshell_core::{AppConfig, AssetRequest, AssetResponse, Error, Fetcher};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "tripshell/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "tripshell/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// HTTP client used for manifest pre-caching, cache misses and passthrough.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Perform the request, returning whatever status the server answered with.
    pub async fn execute(&self, request: &AssetRequest) -> Result<AssetResponse, Error> {
        let start = Instant::now();
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| Error::InvalidInput(format!("invalid method {}: {}", request.method, e)))?;

        let response = self
            .http
            .request(method, request.url.as_str())
            .send()
            .await
            .map_err(|e| transport_error(&request.url, e))?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                len, self.config.max_bytes
            )));
        }

        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(&request.url, e))?;

        if body.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                body.len(),
                self.config.max_bytes
            )));
        }

        tracing::debug!(
            "fetched {} {} -> {} in {}ms ({} bytes)",
            request.method,
            request.url,
            status.as_u16(),
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(AssetResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

fn transport_error(url: &url::Url, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(format!("{url}: {err}"))
    } else {
        Error::Network(format!("{url}: {err}"))
    }
}

#[async_trait::async_trait]
impl Fetcher for FetchClient {
    async fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, Error> {
        self.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use url::Url;

    /// Serve one canned HTTP response on a local port.
    async fn serve_once(raw: &'static str) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await;
            socket.write_all(raw.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        Url::parse(&format!("http://{addr}/app.js")).unwrap()
    }

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "tripshell/0.1");
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = AppConfig { user_agent: "trip/2".into(), max_bytes: 1024, timeout_ms: 1500, ..Default::default() };
        let config = FetchConfig::from(&app);
        assert_eq!(config.user_agent, "trip/2");
        assert_eq!(config.max_bytes, 1024);
        assert_eq!(config.timeout, Duration::from_millis(1500));
        assert_eq!(config.max_redirects, 5);
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        let client = FetchClient::new(FetchConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_success_response_is_copied() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\ncontent-type: text/javascript\r\ncontent-length: 1\r\nconnection: close\r\n\r\nX",
        )
        .await;
        let client = FetchClient::new(FetchConfig::default()).unwrap();

        let response = client.fetch(&AssetRequest::get(url)).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.status_text, "OK");
        assert_eq!(response.content_type(), Some("text/javascript"));
        assert_eq!(response.body.as_ref(), b"X");
    }

    #[tokio::test]
    async fn test_error_status_is_not_an_error() {
        let url = serve_once("HTTP/1.1 404 Not Found\r\ncontent-length: 4\r\nconnection: close\r\n\r\nnope").await;
        let client = FetchClient::new(FetchConfig::default()).unwrap();

        let response = client.fetch(&AssetRequest::get(url)).await.unwrap();

        assert_eq!(response.status, 404);
        assert!(!response.is_cacheable());
    }

    #[tokio::test]
    async fn test_oversize_body_is_rejected() {
        let url = serve_once("HTTP/1.1 200 OK\r\ncontent-length: 10\r\nconnection: close\r\n\r\n0123456789").await;
        let config = FetchConfig { max_bytes: 4, ..Default::default() };
        let client = FetchClient::new(config).unwrap();

        let err = client.fetch(&AssetRequest::get(url)).await.unwrap_err();
        assert!(matches!(err, Error::FetchTooLarge(_)));
        assert!(err.is_network_failure());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = FetchClient::new(FetchConfig::default()).unwrap();
        let url = Url::parse(&format!("http://{addr}/")).unwrap();
        let err = client.fetch(&AssetRequest::navigate(url)).await.unwrap_err();
        assert!(err.is_network_failure());
    }
}
