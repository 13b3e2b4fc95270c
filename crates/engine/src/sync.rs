//! Queue drain: ordered replay of deferred writes.
//!
//! Replay order is the ordering guarantee: an update must never reach
//! the server before the create it depended on. The drain therefore
//! walks the queue strictly one operation at a time and halts on the
//! first failure, leaving the remainder queued; the next
//! connectivity-restored or periodic trigger retries the whole drain.
//! There is no hidden backoff.

use holdfast_client::{Method, OutboundRequest, Url};
use holdfast_core::store::QueuedOperation;
use holdfast_core::Error;

use crate::engine::Engine;
use crate::headers::headers_from_json;

/// How a drain ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every queued operation was replayed and removed.
    Drained { replayed: u64 },
    /// A replay failed; the failing operation and everything behind it
    /// remain queued in order.
    Halted { replayed: u64, remaining: u64 },
    /// Another drain was already running; this trigger coalesced into it.
    InFlight,
}

pub(crate) async fn drain_impl(engine: &Engine) -> Result<DrainOutcome, Error> {
    let Ok(_guard) = engine.drain_lock.try_lock() else {
        tracing::debug!("drain already in flight, coalescing trigger");
        return Ok(DrainOutcome::InFlight);
    };

    let ops = engine.store.list_ops().await?;
    let total = ops.len() as u64;
    let mut replayed = 0u64;

    for op in ops {
        match replay(engine, &op).await {
            Ok(()) => {
                engine.store.remove_op(op.id).await?;
                replayed += 1;
            }
            Err(e) => {
                tracing::info!("drain halted at operation {} ({} {}): {e}", op.id, op.method, op.url);
                return Ok(DrainOutcome::Halted { replayed, remaining: total - replayed });
            }
        }
    }

    if replayed > 0 {
        tracing::info!("drained {replayed} queued operations");
    }

    Ok(DrainOutcome::Drained { replayed })
}

/// Reissue one queued operation. Success means the server confirmed it
/// with a 2xx; anything else leaves the operation queued.
async fn replay(engine: &Engine, op: &QueuedOperation) -> Result<(), Error> {
    let req = rebuild(op)?;
    let resp = engine.backend.execute(&req).await?;

    if !resp.is_success() {
        return Err(Error::Network(format!("server answered {}", resp.status)));
    }

    Ok(())
}

/// Reconstruct the original mutating call from its persisted record.
fn rebuild(op: &QueuedOperation) -> Result<OutboundRequest, Error> {
    let method = Method::from_bytes(op.method.as_bytes())
        .map_err(|_| Error::MalformedOperation { id: op.id, reason: format!("unknown method '{}'", op.method) })?;

    let url = Url::parse(&op.url).map_err(|e| Error::MalformedOperation { id: op.id, reason: e.to_string() })?;

    let mut req = OutboundRequest::from_url(method, url);

    if let Some(json) = &op.headers {
        req.headers = headers_from_json(json).map_err(|e| Error::MalformedOperation { id: op.id, reason: e.to_string() })?;
    }

    if let Some(body) = &op.body {
        req = req.with_body(body.clone());
    }

    Ok(req)
}
