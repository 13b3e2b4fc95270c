//! Request orchestration: policy, store, network, degraded fallback.
//!
//! `handle_impl` is deliberately infallible. Whether the store or the
//! network breaks, the caller gets a well-formed response back or the
//! mutation lands in the durable queue; no error escapes upward.

use bytes::Bytes;

use holdfast_client::{BackendResponse, OutboundRequest, RouteClass, StatusCode, classify};
use holdfast_core::store::NewOperation;
use holdfast_core::{CacheEntry, Error};

use crate::engine::Engine;
use crate::headers::headers_to_json;

/// Fixed placeholder served to document requests when neither cache nor
/// network can answer.
pub const OFFLINE_PAGE: &str = "<!doctype html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"utf-8\">\n  <title>Offline</title>\n</head>\n<body>\n  <h1>You are offline</h1>\n  <p>This page is not available offline yet. It will load once you are back on the network.</p>\n</body>\n</html>\n";

const DEGRADED_BODY: &str = "service unavailable: network unreachable and no cached copy exists\n";

/// Where a response came from.
///
/// Callers that care (diagnostics, UI hints) can tell a cache hit from a
/// synthesized fallback without inspecting bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    /// Served from the versioned store without a network attempt.
    Cache,
    /// Fresh from the network.
    Network,
    /// The fixed offline placeholder document.
    Placeholder,
    /// Generic service-unavailable fallback.
    Degraded,
    /// Mutation accepted into the durable queue for later replay.
    Accepted,
}

/// What the engine hands back for every routed request.
#[derive(Debug, Clone)]
pub struct EngineResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Bytes,
    pub source: ResponseSource,
}

impl EngineResponse {
    fn from_cache(entry: CacheEntry) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: entry.kind,
            body: Bytes::from(entry.payload),
            source: ResponseSource::Cache,
        }
    }

    fn from_network(resp: BackendResponse) -> Self {
        Self {
            status: resp.status,
            content_type: resp.content_type,
            body: resp.body,
            source: ResponseSource::Network,
        }
    }

    fn placeholder() -> Self {
        Self {
            status: StatusCode::OK,
            content_type: Some("text/html".into()),
            body: Bytes::from_static(OFFLINE_PAGE.as_bytes()),
            source: ResponseSource::Placeholder,
        }
    }

    fn degraded() -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            content_type: Some("text/plain".into()),
            body: Bytes::from_static(DEGRADED_BODY.as_bytes()),
            source: ResponseSource::Degraded,
        }
    }

    fn accepted(op_id: i64) -> Self {
        Self {
            status: StatusCode::ACCEPTED,
            content_type: Some("text/plain".into()),
            body: Bytes::from(format!("accepted: queued for sync as operation {op_id}\n")),
            source: ResponseSource::Accepted,
        }
    }
}

pub(crate) async fn handle_impl(engine: &Engine, req: OutboundRequest) -> EngineResponse {
    match classify(&req, &engine.config.allowed_origins) {
        RouteClass::CacheFirst => serve_cache_first(engine, &req).await,
        RouteClass::Mutation => serve_mutation(engine, &req).await,
        RouteClass::Passthrough => forward(engine, &req).await,
    }
}

/// Cache hit wins outright; a miss fetches, fills the store, and falls
/// back degraded when the network is gone.
async fn serve_cache_first(engine: &Engine, req: &OutboundRequest) -> EngineResponse {
    let key = req.cache_key();

    match engine.store.get_entry(&key).await {
        Ok(Some(entry)) => {
            tracing::debug!("cache hit for {}", req.url);
            EngineResponse::from_cache(entry)
        }
        Ok(None) => fetch_and_fill(engine, req, &key).await,
        Err(e) => {
            // store down: degrade to network-only for this request
            tracing::warn!("store unavailable for {}: {e}", req.url);
            match engine.backend.execute(req).await {
                Ok(resp) => EngineResponse::from_network(resp),
                Err(e) => offline_fallback(req, &e),
            }
        }
    }
}

async fn fetch_and_fill(engine: &Engine, req: &OutboundRequest, key: &str) -> EngineResponse {
    match engine.backend.execute(req).await {
        Ok(resp) => {
            if resp.is_success() && resp.same_origin_as(req) {
                // the stored payload is its own copy; the caller keeps
                // the original buffer
                let entry = CacheEntry {
                    key: key.to_string(),
                    url: req.url.to_string(),
                    kind: resp.content_type.clone(),
                    payload: resp.body.to_vec(),
                    generation: engine.config.generation.clone(),
                    stored_at: chrono::Utc::now().to_rfc3339(),
                };
                if let Err(e) = engine.store.put_entry(&entry).await {
                    tracing::warn!("cache write for {} failed: {e}", req.url);
                }
            }
            EngineResponse::from_network(resp)
        }
        Err(e) => offline_fallback(req, &e),
    }
}

/// Mutations go straight to the network; an unreachable network defers
/// them into the durable queue instead of dropping them.
async fn serve_mutation(engine: &Engine, req: &OutboundRequest) -> EngineResponse {
    match engine.backend.execute(req).await {
        Ok(resp) => EngineResponse::from_network(resp),
        Err(e) if e.is_offline() => {
            let op = NewOperation {
                url: req.url.to_string(),
                method: req.method.to_string(),
                headers: headers_to_json(&req.headers),
                body: req.body.as_ref().map(|b| b.to_vec()),
            };
            match engine.store.enqueue_op(op).await {
                Ok(id) => {
                    tracing::info!("deferred {} {} as operation {id}", req.method, req.url);
                    EngineResponse::accepted(id)
                }
                Err(store_err) => {
                    tracing::warn!("could not defer {} {}: {store_err}", req.method, req.url);
                    EngineResponse::degraded()
                }
            }
        }
        Err(e) => {
            tracing::debug!("{} {} failed without deferral: {e}", req.method, req.url);
            EngineResponse::degraded()
        }
    }
}

/// Pass-through requests are forwarded untouched; their failures are
/// neither cached, queued, nor counted.
async fn forward(engine: &Engine, req: &OutboundRequest) -> EngineResponse {
    match engine.backend.execute(req).await {
        Ok(resp) => EngineResponse::from_network(resp),
        Err(e) => {
            tracing::debug!("pass-through {} {}: {e}", req.method, req.url);
            EngineResponse::degraded()
        }
    }
}

/// The three-way fallback's read half: a document request gets the fixed
/// offline page, everything else a plain 503.
fn offline_fallback(req: &OutboundRequest, err: &Error) -> EngineResponse {
    tracing::debug!("{} {} unreachable: {err}", req.method, req.url);
    if req.wants_document() { EngineResponse::placeholder() } else { EngineResponse::degraded() }
}
