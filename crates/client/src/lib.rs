//! Outbound request model and network access for the holdfast engine.
//!
//! This crate provides the request/response types the engine routes, the
//! pure interception policy that classifies them, and the `Backend`
//! abstraction over the actual network with its reqwest implementation.

pub mod fetch;
pub mod policy;
pub mod request;

pub use fetch::{Backend, HttpBackend, HttpConfig};
pub use policy::{RouteClass, classify, origin_allowed};
pub use request::{BackendResponse, OutboundRequest};

// The wire types callers build requests with.
pub use reqwest::{Method, StatusCode, header};
pub use url::Url;
