//! Unified error types for the holdfast engine.
//!
//! One enum is shared across the workspace so the orchestrator can match
//! on failure classes (store vs. network vs. timeout) without converting
//! between per-crate error types.

use tokio_rusqlite::rusqlite;

/// Unified error type for the engine and its stores.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The local store could not be reached or a statement failed.
    #[error("store unavailable: {0}")]
    Database(tokio_rusqlite::Error),

    /// A schema migration failed to apply.
    #[error("migration failed: {0}")]
    MigrationFailed(String),

    /// A request URL could not be parsed or canonicalized.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The network was unreachable or the connection failed mid-flight.
    #[error("network unreachable: {0}")]
    Network(String),

    /// The network call exceeded the configured timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The response body exceeded the configured size cap.
    #[error("response too large: {0}")]
    TooLarge(String),

    /// Startup pre-population could not fetch every manifest resource.
    #[error("precache incomplete: failed to fetch {0}")]
    PrecacheIncomplete(String),

    /// A queued operation could not be reconstructed from its record.
    #[error("queued operation {id} is malformed: {reason}")]
    MalformedOperation { id: i64, reason: String },

    /// JSON encoding or decoding failed.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// True for failures the orchestrator treats as "the network is gone":
    /// the trigger for the degraded-response / enqueue fallback paths.
    pub fn is_offline(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Timeout(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
