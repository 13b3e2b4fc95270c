//! Durable queue of deferred write operations.
//!
//! Each record holds enough to fully reconstruct the original mutating
//! call. Append and remove are single statements, so an operation is
//! visible to enumeration from the moment it is durably appended until
//! the moment it is durably removed, never partially. Records are never
//! mutated in place.

use super::connection::StoreDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// A mutating request awaiting replay, as passed to [`StoreDb::enqueue_op`].
#[derive(Debug, Clone)]
pub struct NewOperation {
    pub url: String,
    pub method: String,
    /// Header map serialized as a JSON object, if the request carried any.
    pub headers: Option<String>,
    pub body: Option<Vec<u8>>,
}

/// A queued operation as persisted, with its assigned id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedOperation {
    /// Unique for the lifetime of the queue; ids are never reused.
    pub id: i64,
    pub url: String,
    pub method: String,
    pub headers: Option<String>,
    pub body: Option<Vec<u8>>,
    /// RFC 3339 timestamp of the append.
    pub enqueued_at: String,
}

impl StoreDb {
    /// Durably append an operation and return its assigned id.
    ///
    /// AUTOINCREMENT guarantees the id is unique and strictly greater
    /// than any id the queue has ever handed out.
    pub async fn enqueue_op(&self, op: NewOperation) -> Result<i64, Error> {
        let enqueued_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<i64, Error> {
                conn.execute(
                    "INSERT INTO pending_ops (url, method, headers, body, enqueued_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![&op.url, &op.method, &op.headers, &op.body, &enqueued_at],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(Error::from)
    }

    /// Enumerate all pending operations in enqueue order.
    pub async fn list_ops(&self) -> Result<Vec<QueuedOperation>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<QueuedOperation>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, url, method, headers, body, enqueued_at
                     FROM pending_ops ORDER BY id",
                )?;

                let ops = stmt
                    .query_map([], |row| {
                        Ok(QueuedOperation {
                            id: row.get(0)?,
                            url: row.get(1)?,
                            method: row.get(2)?,
                            headers: row.get(3)?,
                            body: row.get(4)?,
                            enqueued_at: row.get(5)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(ops)
            })
            .await
            .map_err(Error::from)
    }

    /// Durably remove a replayed operation.
    ///
    /// Returns false if the id was not present (already removed).
    pub async fn remove_op(&self, id: i64) -> Result<bool, Error> {
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM pending_ops WHERE id = ?1", params![id])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of operations currently queued.
    pub async fn queue_len(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM pending_ops", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
