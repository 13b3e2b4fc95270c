//! Versioned cache entry operations.
//!
//! Entries are key-addressed byte objects tagged with the generation that
//! wrote them. There is no size- or age-based eviction; the only way an
//! entry leaves the store is a wholesale purge of non-current generations.

use super::connection::StoreDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A cached response body with the metadata needed to serve it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Deterministic key, see [`super::key::cache_key`].
    pub key: String,
    /// The URL the payload was fetched from, kept for inspection.
    pub url: String,
    /// Content type of the payload, if the origin reported one.
    pub kind: Option<String>,
    /// Response body bytes.
    pub payload: Vec<u8>,
    /// Generation label that wrote this entry.
    pub generation: String,
    /// RFC 3339 timestamp of the write.
    pub stored_at: String,
}

impl StoreDb {
    /// Look up an entry by key.
    ///
    /// Matches regardless of generation: a stale-generation entry is
    /// still servable until an explicit purge removes it.
    pub async fn get_entry(&self, key: &str) -> Result<Option<CacheEntry>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key, url, kind, payload, generation, stored_at
                     FROM cache_entries WHERE key = ?1",
                )?;

                let result = stmt.query_row(params![key], |row| {
                    Ok(CacheEntry {
                        key: row.get(0)?,
                        url: row.get(1)?,
                        kind: row.get(2)?,
                        payload: row.get(3)?,
                        generation: row.get(4)?,
                        stored_at: row.get(5)?,
                    })
                });

                match result {
                    Ok(e) => Ok(Some(e)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or overwrite the entry for a key.
    ///
    /// Uses UPSERT semantics; every successful refetch of a key lands
    /// here, so the row always carries the most recent payload and the
    /// generation that produced it.
    pub async fn put_entry(&self, entry: &CacheEntry) -> Result<(), Error> {
        let entry = entry.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO cache_entries (key, url, kind, payload, generation, stored_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(key) DO UPDATE SET
                        url = excluded.url,
                        kind = excluded.kind,
                        payload = excluded.payload,
                        generation = excluded.generation,
                        stored_at = excluded.stored_at",
                    params![
                        &entry.key,
                        &entry.url,
                        &entry.kind,
                        &entry.payload,
                        &entry.generation,
                        &entry.stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Write a batch of entries in one transaction.
    ///
    /// All-or-nothing: if any insert fails the transaction rolls back and
    /// no entry from the batch is visible. Returns the number written.
    pub async fn bulk_populate(&self, entries: Vec<CacheEntry>) -> Result<u64, Error> {
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let tx = conn.transaction()?;
                for entry in &entries {
                    tx.execute(
                        "INSERT INTO cache_entries (key, url, kind, payload, generation, stored_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                         ON CONFLICT(key) DO UPDATE SET
                            url = excluded.url,
                            kind = excluded.kind,
                            payload = excluded.payload,
                            generation = excluded.generation,
                            stored_at = excluded.stored_at",
                        params![
                            &entry.key,
                            &entry.url,
                            &entry.kind,
                            &entry.payload,
                            &entry.generation,
                            &entry.stored_at,
                        ],
                    )?;
                }
                tx.commit()?;
                Ok(entries.len() as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every entry whose generation differs from `current`.
    ///
    /// Returns the number of deleted entries. Idempotent: a second call
    /// with the same label deletes nothing.
    pub async fn purge_other_generations(&self, current: &str) -> Result<u64, Error> {
        let current = current.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM cache_entries WHERE generation != ?1", params![current])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Check whether a key is present under the given generation.
    pub async fn contains(&self, key: &str, generation: &str) -> Result<bool, Error> {
        let key = key.to_string();
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let present: bool = conn
                    .query_row(
                        "SELECT EXISTS(
                        SELECT 1 FROM cache_entries
                        WHERE key = ?1 AND generation = ?2
                    )",
                        params![key, generation],
                        |row| row.get(0),
                    )
                    .map_err(Error::from)?;

                Ok(present)
            })
            .await
            .map_err(Error::from)
    }

    /// Total number of entries across all generations.
    pub async fn entry_count(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::key::cache_key;

    fn make_entry(url: &str, generation: &str) -> CacheEntry {
        CacheEntry {
            key: cache_key("GET", url),
            url: url.to_string(),
            kind: Some("text/css".to_string()),
            payload: format!("body for {url}").into_bytes(),
            generation: generation.to_string(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[tokio::test]
    async fn test_put_then_get_round_trips_bytes() {
        let db = StoreDb::open_in_memory().await.unwrap();
        let entry = make_entry("https://example.com/shell.css", "gen-1");

        db.put_entry(&entry).await.unwrap();

        let retrieved = db.get_entry(&entry.key).await.unwrap().unwrap();
        assert_eq!(retrieved.payload, entry.payload);
        assert_eq!(retrieved.generation, "gen-1");
        assert_eq!(retrieved.kind, Some("text/css".to_string()));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = StoreDb::open_in_memory().await.unwrap();
        let result = db.get_entry("nonexistent").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites_payload_and_generation() {
        let db = StoreDb::open_in_memory().await.unwrap();
        let mut entry = make_entry("https://example.com/app.js", "gen-1");
        db.put_entry(&entry).await.unwrap();

        entry.payload = b"updated".to_vec();
        entry.generation = "gen-2".to_string();
        db.put_entry(&entry).await.unwrap();

        let retrieved = db.get_entry(&entry.key).await.unwrap().unwrap();
        assert_eq!(retrieved.payload, b"updated");
        assert_eq!(retrieved.generation, "gen-2");
        assert_eq!(db.entry_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_purge_removes_only_other_generations() {
        let db = StoreDb::open_in_memory().await.unwrap();
        db.put_entry(&make_entry("https://example.com/old.css", "gen-1")).await.unwrap();
        db.put_entry(&make_entry("https://example.com/new.css", "gen-2")).await.unwrap();

        let deleted = db.purge_other_generations("gen-2").await.unwrap();
        assert_eq!(deleted, 1);

        let old = db.get_entry(&cache_key("GET", "https://example.com/old.css")).await.unwrap();
        assert!(old.is_none());

        let new = db.get_entry(&cache_key("GET", "https://example.com/new.css")).await.unwrap();
        assert!(new.is_some());
    }

    #[tokio::test]
    async fn test_purge_twice_is_noop() {
        let db = StoreDb::open_in_memory().await.unwrap();
        db.put_entry(&make_entry("https://example.com/a", "gen-1")).await.unwrap();
        db.put_entry(&make_entry("https://example.com/b", "gen-2")).await.unwrap();

        assert_eq!(db.purge_other_generations("gen-2").await.unwrap(), 1);
        assert_eq!(db.purge_other_generations("gen-2").await.unwrap(), 0);
        assert_eq!(db.entry_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_bulk_populate_all_visible() {
        let db = StoreDb::open_in_memory().await.unwrap();
        let batch = vec![
            make_entry("https://example.com/", "gen-1"),
            make_entry("https://example.com/shell.css", "gen-1"),
            make_entry("https://example.com/app.js", "gen-1"),
        ];

        let written = db.bulk_populate(batch.clone()).await.unwrap();
        assert_eq!(written, 3);

        for entry in &batch {
            assert!(db.contains(&entry.key, "gen-1").await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_contains_respects_generation() {
        let db = StoreDb::open_in_memory().await.unwrap();
        let entry = make_entry("https://example.com/shell.css", "gen-1");
        db.put_entry(&entry).await.unwrap();

        assert!(db.contains(&entry.key, "gen-1").await.unwrap());
        assert!(!db.contains(&entry.key, "gen-2").await.unwrap());
    }
}
