//! Bucket and entry operations on the SQLite store.
//!
//! Buckets are rows in `buckets`; entries cascade with their bucket, so
//! deleting a bucket never leaves orphaned responses behind.

use bytes::Bytes;
use tokio_rusqlite::{params, rusqlite};

use super::connection::CacheDb;
use super::hash::request_key;
use super::store::{BucketInfo, BucketStore, CacheEntry, EntryInfo};
use crate::Error;
use crate::http::{AssetRequest, AssetResponse};

fn insert_entry(conn: &rusqlite::Connection, bucket: &str, entry: &CacheEntry, now: &str) -> Result<(), Error> {
    let headers_json =
        serde_json::to_string(&entry.response.headers).map_err(|e| Error::CorruptEntry(e.to_string()))?;
    conn.execute(
        "INSERT INTO entries (
            bucket, key_hash, method, url, status, status_text, headers_json, body, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(bucket, key_hash) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            status = excluded.status,
            status_text = excluded.status_text,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            bucket,
            entry.key(),
            &entry.method,
            entry.url.as_str(),
            entry.response.status,
            &entry.response.status_text,
            headers_json,
            entry.response.body.as_ref(),
            now,
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Names of every bucket, oldest first.
    pub async fn bucket_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM buckets ORDER BY created_at ASC, name ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Every bucket with its entry count.
    pub async fn buckets(&self) -> Result<Vec<BucketInfo>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<BucketInfo>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT b.name, b.created_at, b.activated_at, COUNT(e.key_hash)
                    FROM buckets b LEFT JOIN entries e ON e.bucket = b.name
                    GROUP BY b.name
                    ORDER BY b.created_at ASC, b.name ASC",
                )?;
                let buckets = stmt
                    .query_map([], |row| {
                        Ok(BucketInfo {
                            name: row.get(0)?,
                            created_at: row.get(1)?,
                            activated_at: row.get(2)?,
                            entries: row.get::<_, i64>(3)? as u64,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(buckets)
            })
            .await
            .map_err(Error::from)
    }

    /// Most recently activated bucket, if any version ever took control.
    pub async fn latest_activated(&self) -> Result<Option<String>, Error> {
        self.conn
            .call(|conn| -> Result<Option<String>, Error> {
                let result = conn.query_row(
                    "SELECT name FROM buckets WHERE activated_at IS NOT NULL
                    ORDER BY activated_at DESC, name DESC LIMIT 1",
                    [],
                    |row| row.get(0),
                );
                match result {
                    Ok(name) => Ok(Some(name)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Create the bucket if absent and upsert all entries in one transaction.
    pub async fn seed_bucket(&self, name: &str, entries: Vec<CacheEntry>) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO buckets (name, created_at) VALUES (?1, ?2)",
                    params![&name, &now],
                )?;
                for entry in &entries {
                    insert_entry(&tx, &name, entry, &now)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a bucket and, by cascade, its entries.
    ///
    /// Returns false if no such bucket existed.
    pub async fn delete_bucket(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM buckets WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Get the stored response for a method and URL.
    ///
    /// Returns None if the bucket has no such entry.
    pub async fn match_entry(&self, name: &str, request: &AssetRequest) -> Result<Option<AssetResponse>, Error> {
        let name = name.to_string();
        let key_hash = request_key(&request.method, &request.url);
        self.conn
            .call(move |conn| -> Result<Option<AssetResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT status, status_text, headers_json, body
                    FROM entries WHERE bucket = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![name, key_hash], |row| {
                    Ok((row.get::<_, u16>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?, row.get::<_, Vec<u8>>(3)?))
                });

                let (status, status_text, headers_json, body) = match result {
                    Ok(row) => row,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                    Err(e) => return Err(e.into()),
                };

                let headers = serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(e.to_string()))?;
                Ok(Some(AssetResponse { status, status_text, headers, body: Bytes::from(body) }))
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace one entry.
    ///
    /// Fails if the bucket doesn't exist; a write never resurrects a deleted bucket.
    pub async fn put_entry(&self, name: &str, entry: CacheEntry) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> { insert_entry(conn, &name, &entry, &now) })
            .await
            .map_err(Error::from)
    }

    /// List the entries of a bucket, oldest first.
    pub async fn entries(&self, name: &str) -> Result<Vec<EntryInfo>, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<EntryInfo>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT method, url, status, LENGTH(body), stored_at
                    FROM entries WHERE bucket = ?1 ORDER BY stored_at ASC, url ASC",
                )?;
                let entries = stmt
                    .query_map(params![name], |row| {
                        Ok(EntryInfo {
                            method: row.get(0)?,
                            url: row.get(1)?,
                            status: row.get(2)?,
                            bytes: row.get::<_, i64>(3)? as u64,
                            stored_at: row.get(4)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(entries)
            })
            .await
            .map_err(Error::from)
    }

    /// Stamp `activated_at` on a bucket.
    pub async fn mark_activated(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let updated = conn.execute("UPDATE buckets SET activated_at = ?1 WHERE name = ?2", params![now, &name])?;
                if updated == 0 {
                    return Err(Error::InvalidState(format!("bucket {name} does not exist")));
                }
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Check if a bucket exists and has been activated.
    pub async fn is_activated(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let activated: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM buckets WHERE name = ?1 AND activated_at IS NOT NULL)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(activated)
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait::async_trait]
impl BucketStore for CacheDb {
    async fn bucket_names(&self) -> Result<Vec<String>, Error> {
        CacheDb::bucket_names(self).await
    }

    async fn seed_bucket(&self, name: &str, entries: Vec<CacheEntry>) -> Result<(), Error> {
        CacheDb::seed_bucket(self, name, entries).await
    }

    async fn delete_bucket(&self, name: &str) -> Result<bool, Error> {
        CacheDb::delete_bucket(self, name).await
    }

    async fn match_entry(&self, name: &str, request: &AssetRequest) -> Result<Option<AssetResponse>, Error> {
        CacheDb::match_entry(self, name, request).await
    }

    async fn put_entry(&self, name: &str, entry: CacheEntry) -> Result<(), Error> {
        CacheDb::put_entry(self, name, entry).await
    }

    async fn mark_activated(&self, name: &str) -> Result<(), Error> {
        CacheDb::mark_activated(self, name).await
    }

    async fn is_activated(&self, name: &str) -> Result<bool, Error> {
        CacheDb::is_activated(self, name).await
    }

    async fn latest_activated(&self) -> Result<Option<String>, Error> {
        CacheDb::latest_activated(self).await
    }
}
