//! The engine facade and its lifecycle entry points.
//!
//! One `Engine` is constructed per process, holding the store, the
//! network backend, and the configuration. Every trigger the host
//! raises (a request to route, a connectivity-restored signal, a push
//! arrival, a notification click) funnels through a named method here.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use holdfast_client::{Backend, HttpBackend, HttpConfig, OutboundRequest};
use holdfast_core::{AppConfig, CacheEntry, Error, StoreDb};

use crate::fetch::{self, EngineResponse};
use crate::push::{self, Navigation, NotificationIntent};
use crate::sync::{self, DrainOutcome};

/// Offline-first caching and deferred-sync engine.
pub struct Engine {
    pub(crate) store: StoreDb,
    pub(crate) backend: Arc<dyn Backend>,
    pub(crate) config: AppConfig,
    /// Serializes drains; a re-entrant trigger coalesces into a no-op.
    pub(crate) drain_lock: Mutex<()>,
}

/// Result of a successful `install`.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub generation: String,
    /// Number of manifest resources written to the store.
    pub populated: u64,
}

/// Snapshot of the engine's stores for inspection.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub generation: String,
    pub entries: u64,
    pub queued: u64,
    pub offline_ready: bool,
}

impl Engine {
    /// Wire up an engine. The store and backend are injected so tests
    /// and embedding hosts control both sides.
    pub fn new(config: AppConfig, store: StoreDb, backend: Arc<dyn Backend>) -> Self {
        Self { store, backend, config, drain_lock: Mutex::new(()) }
    }

    /// Open the store at the configured path and wire the HTTP backend.
    /// The usual production constructor.
    pub async fn from_config(config: AppConfig) -> Result<Self, Error> {
        let store = StoreDb::open(&config.db_path).await?;
        let backend = Arc::new(HttpBackend::new(HttpConfig::from_app_config(&config))?);
        Ok(Self::new(config, store, backend))
    }

    /// The current cache generation label.
    pub fn generation(&self) -> &str {
        &self.config.generation
    }

    /// Pre-populate the store with every manifest resource.
    ///
    /// All-or-nothing: if any resource fails to fetch, nothing is
    /// written and the error names the failing resource. The store write
    /// itself is a single transaction, so a crash mid-install cannot
    /// leave a generation that half-claims readiness.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let mut batch = Vec::with_capacity(self.config.precache_manifest.len());

        for resource in &self.config.precache_manifest {
            let req = OutboundRequest::get(resource)?;
            let resp = match self.backend.execute(&req).await {
                Ok(resp) if resp.is_success() => resp,
                Ok(resp) => {
                    tracing::warn!("install: {} answered {}", resource, resp.status);
                    return Err(Error::PrecacheIncomplete(resource.clone()));
                }
                Err(e) => {
                    tracing::warn!("install: fetching {} failed: {e}", resource);
                    return Err(Error::PrecacheIncomplete(resource.clone()));
                }
            };

            batch.push(CacheEntry {
                key: req.cache_key(),
                url: req.url.to_string(),
                kind: resp.content_type,
                payload: resp.body.to_vec(),
                generation: self.config.generation.clone(),
                stored_at: chrono::Utc::now().to_rfc3339(),
            });
        }

        let populated = self.store.bulk_populate(batch).await?;
        tracing::info!("installed generation {} ({populated} resources precached)", self.config.generation);

        Ok(InstallReport { generation: self.config.generation.clone(), populated })
    }

    /// Purge every cache entry tagged with a non-current generation.
    ///
    /// Queue contents are untouched; the two stores are independently
    /// lifecycled. Returns the number of purged entries.
    pub async fn activate(&self) -> Result<u64, Error> {
        let purged = self.store.purge_other_generations(&self.config.generation).await?;
        tracing::info!("activated generation {} (purged {purged} stale entries)", self.config.generation);
        Ok(purged)
    }

    /// Route one outbound request. Never fails: every path yields a
    /// well-formed response or completes an enqueue (see [`fetch`]).
    pub async fn handle_fetch(&self, req: OutboundRequest) -> EngineResponse {
        fetch::handle_impl(self, req).await
    }

    /// Connectivity-restored signal from the host. Replays the queue in
    /// order; see [`sync`] for the halt-on-failure contract.
    pub async fn on_online(&self) -> Result<DrainOutcome, Error> {
        self.drain().await
    }

    /// Periodic-trigger entry point; identical to [`Engine::on_online`].
    pub async fn drain(&self) -> Result<DrainOutcome, Error> {
        sync::drain_impl(self).await
    }

    /// Inbound push payload. Malformed payloads yield `None`.
    pub fn on_push(&self, payload: &[u8]) -> Option<NotificationIntent> {
        push::on_push(payload)
    }

    /// A user interacted with a displayed notification.
    pub fn on_notification_click(&self, action: Option<&str>, correlation: &str) -> Option<Navigation> {
        push::on_interaction(action, correlation)
    }

    /// True when every manifest resource is present under the current
    /// generation. An empty manifest never reports ready.
    pub async fn offline_ready(&self) -> Result<bool, Error> {
        if self.config.precache_manifest.is_empty() {
            return Ok(false);
        }

        for resource in &self.config.precache_manifest {
            let req = OutboundRequest::get(resource)?;
            if !self.store.contains(&req.cache_key(), &self.config.generation).await? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Inspect the engine's stores.
    pub async fn status(&self) -> Result<EngineStatus, Error> {
        Ok(EngineStatus {
            generation: self.config.generation.clone(),
            entries: self.store.entry_count().await?,
            queued: self.store.queue_len().await?,
            offline_ready: self.offline_ready().await?,
        })
    }
}
