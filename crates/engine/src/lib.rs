//! The holdfast engine: offline-first caching and deferred synchronization.
//!
//! The engine sits between a client application and its remote service.
//! Safe reads are served cache-first from a versioned store; mutations
//! that fail while offline are queued durably and replayed in order when
//! the host signals that connectivity is back. Push payloads are turned
//! into display intents and notification clicks into navigation intents.
//!
//! Construct one [`Engine`] per process and drive it through its named
//! entry points: `install`, `activate`, `handle_fetch`, `on_online`,
//! `on_push`, `on_notification_click`.

pub mod engine;
pub mod fetch;
pub mod push;
pub mod sync;

mod headers;

#[cfg(test)]
pub(crate) mod testutil;

pub use engine::{Engine, EngineStatus, InstallReport};
pub use fetch::{EngineResponse, ResponseSource};
pub use push::{Navigation, NotificationAction, NotificationIntent};
pub use sync::DrainOutcome;
