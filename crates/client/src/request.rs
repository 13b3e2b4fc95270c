//! Request and response values routed through the engine.
//!
//! Bodies are `bytes::Bytes`, so handing one copy to the cache and one to
//! the caller shares a single immutable buffer; consuming either side
//! cannot exhaust the other.

use bytes::Bytes;
use holdfast_core::Error;
use holdfast_core::store::key::cache_key;
use reqwest::header::{self, HeaderMap};
use reqwest::{Method, StatusCode};
use url::Url;

use crate::fetch::url::canonicalize;

/// An outbound request as seen by the engine.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl OutboundRequest {
    /// Build a request from a URL string, canonicalizing it so policy
    /// checks and cache keys agree.
    pub fn new(method: Method, url: &str) -> Result<Self, Error> {
        Ok(Self { method, url: canonicalize(url)?, headers: HeaderMap::new(), body: None })
    }

    /// Build a request around an already-parsed URL, bypassing
    /// canonicalization. Hosts use this to route requests with schemes
    /// the engine itself never fetches; policy classifies them as
    /// pass-through.
    pub fn from_url(method: Method, url: Url) -> Self {
        Self { method, url, headers: HeaderMap::new(), body: None }
    }

    /// Shorthand for a canonicalized GET.
    pub fn get(url: &str) -> Result<Self, Error> {
        Self::new(Method::GET, url)
    }

    /// Attach a body, consuming the builder.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// True for methods that cannot mutate remote state (GET, HEAD).
    /// Only these are ever cacheable.
    pub fn is_safe_read(&self) -> bool {
        self.method == Method::GET || self.method == Method::HEAD
    }

    /// True when the caller expects a page-like document, judged by the
    /// Accept header. Drives the offline-placeholder fallback.
    pub fn wants_document(&self) -> bool {
        self.headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|accept| accept.contains("text/html"))
    }

    /// The deterministic store key for this request.
    pub fn cache_key(&self) -> String {
        cache_key(self.method.as_str(), self.url.as_str())
    }
}

/// A response as returned by a [`crate::fetch::Backend`].
#[derive(Debug, Clone)]
pub struct BackendResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// The final URL after redirects.
    pub final_url: Url,
    /// Content-Type header, if the origin reported one.
    pub content_type: Option<String>,
    /// Response body bytes.
    pub body: Bytes,
}

impl BackendResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// True when the response still comes from the request's own origin.
    /// A redirect that lands elsewhere makes the payload uncacheable,
    /// since its integrity cannot be tied to the requested origin.
    pub fn same_origin_as(&self, req: &OutboundRequest) -> bool {
        self.final_url.origin() == req.url.origin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_new_canonicalizes() {
        let req = OutboundRequest::get("HTTPS://Example.COM/page#frag").unwrap();
        assert_eq!(req.url.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_safe_read_methods() {
        assert!(OutboundRequest::get("https://example.com/").unwrap().is_safe_read());
        assert!(OutboundRequest::new(Method::HEAD, "https://example.com/").unwrap().is_safe_read());
        assert!(!OutboundRequest::new(Method::POST, "https://example.com/").unwrap().is_safe_read());
        assert!(!OutboundRequest::new(Method::DELETE, "https://example.com/").unwrap().is_safe_read());
    }

    #[test]
    fn test_wants_document() {
        let mut req = OutboundRequest::get("https://example.com/reader").unwrap();
        assert!(!req.wants_document());

        req.headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9"),
        );
        assert!(req.wants_document());

        req.headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        assert!(!req.wants_document());
    }

    #[test]
    fn test_cache_key_ignores_body() {
        let bare = OutboundRequest::get("https://example.com/data").unwrap();
        let with_body = OutboundRequest::get("https://example.com/data").unwrap().with_body("x");
        assert_eq!(bare.cache_key(), with_body.cache_key());
    }

    #[test]
    fn test_same_origin_detection() {
        let req = OutboundRequest::get("https://example.com/data").unwrap();
        let same = BackendResponse {
            status: StatusCode::OK,
            final_url: Url::parse("https://example.com/data/v2").unwrap(),
            content_type: None,
            body: Bytes::new(),
        };
        let cross = BackendResponse {
            status: StatusCode::OK,
            final_url: Url::parse("https://cdn.example.net/data").unwrap(),
            content_type: None,
            body: Bytes::new(),
        };
        assert!(same.same_origin_as(&req));
        assert!(!cross.same_origin_as(&req));
    }
}
