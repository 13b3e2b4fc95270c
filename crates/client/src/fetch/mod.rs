//! Network backend abstraction and its HTTP implementation.
//!
//! The engine talks to the network exclusively through the [`Backend`]
//! trait, so tests (and hosts with exotic transports) can substitute the
//! wire. [`HttpBackend`] is the production implementation over reqwest.
//!
//! Failure mapping matters to the orchestrator: a timed-out call and an
//! unreachable network both surface as offline (`Error::is_offline`) and
//! select the degraded-response / enqueue fallback paths.

pub mod url;

use async_trait::async_trait;
use reqwest::{Client, header};
use std::time::{Duration, Instant};

use holdfast_core::Error;

use crate::request::{BackendResponse, OutboundRequest};

pub use self::url::canonicalize;

/// Configuration for the HTTP backend.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// User agent string (default: "holdfast/0.1")
    pub user_agent: String,

    /// Request timeout (default: 20s). A timeout is reported as
    /// `Error::Timeout` and treated exactly like an unreachable network.
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "holdfast/0.1".to_string(),
            timeout: Duration::from_millis(20_000),
            max_redirects: 5,
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

impl HttpConfig {
    /// Derive the backend configuration from the loaded app config.
    pub fn from_app_config(config: &holdfast_core::AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            max_redirects: 5,
            max_bytes: config.max_bytes,
        }
    }
}

/// The engine's view of the network.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Issue the request and return the response, however the server
    /// answered. `Err` is reserved for transport-level failures:
    /// unreachable network, timeout, oversized body.
    async fn execute(&self, req: &OutboundRequest) -> Result<BackendResponse, Error>;
}

/// HTTP backend over a configured reqwest client.
pub struct HttpBackend {
    http: Client,
    config: HttpConfig,
}

impl HttpBackend {
    /// Create a new HTTP backend with the given configuration.
    pub fn new(config: HttpConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn execute(&self, req: &OutboundRequest) -> Result<BackendResponse, Error> {
        let start = Instant::now();

        let mut request = self
            .http
            .request(req.method.clone(), req.url.clone())
            .headers(req.headers.clone());

        if let Some(body) = &req.body {
            request = request.body(body.clone());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(format!("{} {}: {e}", req.method, req.url))
            } else {
                Error::Network(format!("{} {}: {e}", req.method, req.url))
            }
        })?;

        let status = response.status();
        let final_url = response.url().clone();

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::TooLarge(format!("{len} bytes exceeds {}", self.config.max_bytes)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response body: {e}")))?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::TooLarge(format!("{} bytes exceeds {}", bytes.len(), self.config.max_bytes)));
        }

        tracing::debug!(
            "{} {} -> {} in {}ms ({} bytes)",
            req.method,
            req.url,
            status.as_u16(),
            start.elapsed().as_millis(),
            bytes.len()
        );

        Ok(BackendResponse { status, final_url, content_type, body: bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_config_default() {
        let config = HttpConfig::default();
        assert_eq!(config.user_agent, "holdfast/0.1");
        assert_eq!(config.timeout, Duration::from_millis(20_000));
        assert_eq!(config.max_redirects, 5);
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_http_config_from_app_config() {
        let app = holdfast_core::AppConfig { user_agent: "reader/2.0".into(), timeout_ms: 5_000, ..Default::default() };
        let config = HttpConfig::from_app_config(&app);
        assert_eq!(config.user_agent, "reader/2.0");
        assert_eq!(config.timeout, Duration::from_millis(5_000));
        assert_eq!(config.max_bytes, app.max_bytes);
    }

    #[tokio::test]
    async fn test_http_backend_new() {
        let backend = HttpBackend::new(HttpConfig::default());
        assert!(backend.is_ok());
    }
}
