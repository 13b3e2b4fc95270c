//! Pure request classification.
//!
//! No I/O, no side effects: given a request and the configured origin
//! allowlist, decide how the orchestrator routes it. Rules apply in
//! order:
//!
//! 1. Non-safe methods are never cached; they go straight to the network
//!    and are queued for replay if it fails.
//! 2. Non-http(s) schemes and origins outside a non-empty allowlist pass
//!    through untouched; their failures are neither cached nor queued.
//! 3. Everything else is served cache-first: an existing entry is
//!    returned without touching the network, and staleness is accepted
//!    until an explicit generation purge.

use url::Url;

use crate::request::OutboundRequest;

/// How the orchestrator should route a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Serve from the store when an entry exists; otherwise fetch and
    /// populate.
    CacheFirst,
    /// Forward to the network; on failure, queue for later replay.
    Mutation,
    /// Forward to the network untouched.
    Passthrough,
}

/// Classify a request. Pure function of its arguments.
pub fn classify(req: &OutboundRequest, allowed_origins: &[String]) -> RouteClass {
    if !req.is_safe_read() {
        return RouteClass::Mutation;
    }

    if !origin_allowed(&req.url, allowed_origins) {
        return RouteClass::Passthrough;
    }

    RouteClass::CacheFirst
}

/// Whether a URL's origin is eligible for caching.
///
/// An empty allowlist admits every http(s) origin; non-http(s) schemes
/// are never eligible.
pub fn origin_allowed(url: &Url, allowed_origins: &[String]) -> bool {
    match url.scheme() {
        "http" | "https" => {}
        _ => return false,
    }

    if allowed_origins.is_empty() {
        return true;
    }

    let origin = url.origin().ascii_serialization();
    allowed_origins.iter().any(|allowed| allowed.trim_end_matches('/') == origin)
}
