//! Prefixed key-value preferences.
//!
//! Values are JSON text under `<prefix><key>`. Reads never fail: a missing
//! key, malformed JSON, a falsy value (`null`, `false`, `0`, `""`) or a value
//! of the wrong shape all yield the caller's default.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio_rusqlite::{params, rusqlite};

use crate::{CacheDb, Error};

/// Checklist completion map.
pub const CHECKED_KEY: &str = "ck";
/// Logged expenses.
pub const EXPENSES_KEY: &str = "ex";
/// User-added checklist items.
pub const CUSTOM_CHECKLIST_KEY: &str = "custom_ck";
/// Colour scheme choice.
pub const THEME_KEY: &str = "theme";

/// Values a stored preference can hold that count as unset.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Preference store scoped by a fixed key prefix.
#[derive(Clone, Debug)]
pub struct PrefsStore {
    db: CacheDb,
    prefix: String,
}

impl PrefsStore {
    pub fn new(db: CacheDb, prefix: impl Into<String>) -> Self {
        Self { db, prefix: prefix.into() }
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Raw JSON text stored for a key, if any.
    pub async fn get_raw(&self, key: &str) -> Result<Option<String>, Error> {
        let key = self.scoped(key);
        self.db
            .conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let result = conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0));
                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Read a value, substituting `default` for anything unusable.
    pub async fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let raw = match self.get_raw(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return default,
            Err(e) => {
                tracing::warn!(key, error = %e, "preference read failed; using default");
                return default;
            }
        };

        let value = match serde_json::from_str::<Value>(&raw) {
            Ok(value) if is_falsy(&value) => return default,
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(key, error = %e, "discarding malformed preference");
                return default;
            }
        };

        serde_json::from_value(value).unwrap_or_else(|e| {
            tracing::debug!(key, error = %e, "preference has unexpected shape");
            default
        })
    }

    /// Store a value as JSON, replacing any previous one.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), Error> {
        let json = serde_json::to_string(value).map_err(|e| Error::InvalidInput(e.to_string()))?;
        self.set_raw(key, json).await
    }

    /// Store already-encoded JSON text.
    pub async fn set_raw(&self, key: &str, json: String) -> Result<(), Error> {
        let key = self.scoped(key);
        let now = chrono::Utc::now().to_rfc3339();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                    ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                    params![key, json, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a key. Returns false if it was not set.
    pub async fn remove(&self, key: &str) -> Result<bool, Error> {
        let key = self.scoped(key);
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    async fn store() -> PrefsStore {
        PrefsStore::new(CacheDb::open_in_memory().await.unwrap(), "bj_")
    }

    #[tokio::test]
    async fn test_missing_key_returns_default() {
        let prefs = store().await;
        assert_eq!(prefs.get("nonexistent", "default".to_string()).await, "default");
        assert_eq!(prefs.get::<Vec<i32>>("nonexistent", vec![]).await, Vec::<i32>::new());
    }

    #[tokio::test]
    async fn test_round_trip_structured_value() {
        let prefs = store().await;
        let mut checked = HashMap::new();
        checked.insert("passport".to_string(), true);
        prefs.set(CHECKED_KEY, &checked).await.unwrap();

        let loaded: HashMap<String, bool> = prefs.get(CHECKED_KEY, HashMap::new()).await;
        assert_eq!(loaded, checked);
    }

    #[tokio::test]
    async fn test_values_are_prefixed() {
        let prefs = store().await;
        prefs.set("theme", &"dark").await.unwrap();

        let raw: String = prefs
            .db
            .conn
            .call(|conn| conn.query_row("SELECT value FROM kv WHERE key = 'bj_theme'", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(raw, "\"dark\"");
    }

    #[tokio::test]
    async fn test_malformed_json_returns_default() {
        let prefs = store().await;
        prefs.set_raw("bad", "{not valid json".to_string()).await.unwrap();
        assert_eq!(prefs.get("bad", "fallback".to_string()).await, "fallback");
    }

    #[tokio::test]
    async fn test_null_returns_default() {
        let prefs = store().await;
        prefs.set_raw("nul", "null".to_string()).await.unwrap();
        assert_eq!(prefs.get("nul", "default".to_string()).await, "default");
    }

    #[tokio::test]
    async fn test_falsy_values_return_default() {
        let prefs = store().await;
        prefs.set("zero", &0).await.unwrap();
        prefs.set("off", &false).await.unwrap();
        prefs.set("blank", &"").await.unwrap();
        prefs.set("empty_list", &Vec::<i32>::new()).await.unwrap();

        assert_eq!(prefs.get("zero", 5).await, 5);
        assert!(prefs.get("off", true).await);
        assert_eq!(prefs.get("blank", "auto".to_string()).await, "auto");
        assert_eq!(prefs.get("empty_list", vec![1]).await, Vec::<i32>::new());
    }

    #[tokio::test]
    async fn test_wrong_shape_returns_default() {
        let prefs = store().await;
        prefs.set(EXPENSES_KEY, &"not a list").await.unwrap();
        let expenses: Vec<serde_json::Value> = prefs.get(EXPENSES_KEY, Vec::new()).await;
        assert!(expenses.is_empty());
    }

    #[tokio::test]
    async fn test_set_overwrites_and_remove() {
        let prefs = store().await;
        prefs.set("num", &1).await.unwrap();
        prefs.set("num", &42).await.unwrap();
        assert_eq!(prefs.get("num", 0).await, 42);

        assert!(prefs.remove("num").await.unwrap());
        assert!(!prefs.remove("num").await.unwrap());
        assert_eq!(prefs.get("num", 7).await, 7);
    }
}
