//! Test support: a scripted network backend and engine constructors.

use std::collections::VecDeque;
use std::ops::Deref;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use holdfast_client::{Backend, BackendResponse, OutboundRequest, StatusCode, Url};
use holdfast_core::{AppConfig, Error, StoreDb};

use crate::engine::Engine;

/// Route engine tracing to the test harness when RUST_LOG is set.
#[allow(dead_code)]
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// One scripted network interaction, consumed in order.
pub(crate) enum Script {
    Respond { status: u16, final_url: Option<String>, content_type: Option<String>, body: Vec<u8> },
    Offline,
    TimedOut,
}

impl Script {
    /// A 200 response from the requested URL.
    pub(crate) fn ok(content_type: &str, body: &[u8]) -> Self {
        Script::Respond {
            status: 200,
            final_url: None,
            content_type: Some(content_type.to_string()),
            body: body.to_vec(),
        }
    }

    /// An empty response with the given status from the requested URL.
    pub(crate) fn status(status: u16) -> Self {
        Script::Respond { status, final_url: None, content_type: None, body: Vec::new() }
    }

    /// A 200 response whose final URL differs from the requested one.
    pub(crate) fn redirected(final_url: &str, content_type: &str, body: &[u8]) -> Self {
        Script::Respond {
            status: 200,
            final_url: Some(final_url.to_string()),
            content_type: Some(content_type.to_string()),
            body: body.to_vec(),
        }
    }

    pub(crate) fn offline() -> Self {
        Script::Offline
    }

    pub(crate) fn timed_out() -> Self {
        Script::TimedOut
    }
}

/// Backend that replays a fixed script and records every call.
pub(crate) struct StubBackend {
    script: Mutex<VecDeque<Script>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl StubBackend {
    pub(crate) fn scripted(script: Vec<Script>) -> Self {
        Self { script: Mutex::new(script.into()), calls: Mutex::new(Vec::new()) }
    }

    /// (method, url) pairs in call order.
    pub(crate) fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for StubBackend {
    async fn execute(&self, req: &OutboundRequest) -> Result<BackendResponse, Error> {
        self.calls.lock().unwrap().push((req.method.to_string(), req.url.to_string()));

        match self.script.lock().unwrap().pop_front() {
            Some(Script::Respond { status, final_url, content_type, body }) => Ok(BackendResponse {
                status: StatusCode::from_u16(status).unwrap(),
                final_url: final_url.map(|u| Url::parse(&u).unwrap()).unwrap_or_else(|| req.url.clone()),
                content_type,
                body: Bytes::from(body),
            }),
            Some(Script::Offline) => Err(Error::Network("stub: connection refused".into())),
            Some(Script::TimedOut) => Err(Error::Timeout("stub: deadline elapsed".into())),
            None => Err(Error::Network("stub: script exhausted".into())),
        }
    }
}

/// An engine over an in-memory store, keeping the stub reachable for
/// call assertions.
pub(crate) struct TestEngine {
    engine: Engine,
    backend: Arc<StubBackend>,
}

impl TestEngine {
    pub(crate) fn backend_calls(&self) -> Vec<(String, String)> {
        self.backend.calls()
    }
}

impl Deref for TestEngine {
    type Target = Engine;

    fn deref(&self) -> &Engine {
        &self.engine
    }
}

pub(crate) async fn test_engine(backend: StubBackend) -> TestEngine {
    let config = AppConfig { generation: "gen-1".into(), ..Default::default() };
    test_engine_with_config(config, backend).await
}

pub(crate) async fn test_engine_with_config(config: AppConfig, backend: StubBackend) -> TestEngine {
    let store = StoreDb::open_in_memory().await.unwrap();
    let backend = Arc::new(backend);
    let engine = Engine::new(config, store, backend.clone());
    TestEngine { engine, backend }
}
