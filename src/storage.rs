use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DATA_ENV_VAR: &str = "PORTAL_DATA";

/// Local key-value store holding one JSON document per key.
///
/// Reads and writes never fail from the caller's point of view: a missing or
/// unreadable entry falls back to the caller's default, and a failed write
/// only leaves the durable copy stale.
pub struct Storage {
    conn: Connection,
    path: PathBuf,
}

impl Storage {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create data directory {}", parent.display())
                })?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open store at {}", path.display()))?;
        let storage = Self { conn, path: path.to_path_buf() };
        storage.init()?;
        Ok(storage)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let storage = Self { conn, path: PathBuf::from(":memory:") };
        storage.init()?;
        Ok(storage)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// `--data` flag, then `PORTAL_DATA`, then the XDG data directory.
    pub fn resolve_path(explicit: Option<PathBuf>) -> PathBuf {
        if let Some(path) = explicit {
            return path;
        }
        if let Ok(path) = std::env::var(DATA_ENV_VAR) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }
        Self::default_path()
    }

    fn default_path() -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "portal") {
            proj_dirs.data_dir().join("portal.db")
        } else {
            PathBuf::from("portal.db")
        }
    }

    fn init(&self) -> Result<()> {
        self.conn
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS kv (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                );
                "#,
            )
            .context("Failed to initialize key-value table")?;
        Ok(())
    }

    /// Deserialized value under `key`, or `default` if absent or unreadable.
    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let raw = match self.raw(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return default,
            Err(e) => {
                warn!(key, error = %e, "failed to read stored value, using default");
                return default;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "stored value does not parse as its type, using default");
                default
            }
        }
    }

    /// Serialize `value` under `key`. Failures are logged and dropped.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                warn!(key, error = %e, "failed to serialize value, durable copy left stale");
                return;
            }
        };

        if let Err(e) = self.put_raw(key, &json) {
            warn!(key, error = %e, "failed to write value, durable copy left stale");
            return;
        }
        debug!(key, bytes = json.len(), "saved");
    }

    pub fn raw(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()
            .with_context(|| format!("Failed to read key '{}'", key))
    }

    pub fn put_raw(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list keys")
    }

    /// Make every later write fail while reads keep working.
    #[cfg(test)]
    pub fn reject_writes(&self) {
        self.conn
            .execute_batch("PRAGMA query_only = ON;")
            .expect("query_only pragma");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_load_missing_key_returns_default() {
        let storage = Storage::open_in_memory().unwrap();
        let ids: Vec<i64> = storage.load("bookmarkedJobIds", vec![99]);
        assert_eq!(ids, vec![99]);
    }

    #[test]
    fn test_save_then_load() {
        let storage = Storage::open_in_memory().unwrap();
        let mut value = HashMap::new();
        value.insert("a".to_string(), vec![1, 2, 3]);
        storage.save("thing", &value);

        let back: HashMap<String, Vec<i32>> = storage.load("thing", HashMap::new());
        assert_eq!(back, value);
    }

    #[test]
    fn test_save_overwrites_previous_value() {
        let storage = Storage::open_in_memory().unwrap();
        storage.save("appliedJobIds", &vec![1]);
        storage.save("appliedJobIds", &vec![1, 2]);
        assert_eq!(storage.raw("appliedJobIds").unwrap().as_deref(), Some("[1,2]"));
        assert_eq!(storage.keys().unwrap(), vec!["appliedJobIds".to_string()]);
    }

    #[test]
    fn test_corrupt_value_falls_back_to_default() {
        let storage = Storage::open_in_memory().unwrap();
        storage.put_raw("bookmarkedJobIds", "{not json").unwrap();
        let ids: Vec<i64> = storage.load("bookmarkedJobIds", Vec::new());
        assert!(ids.is_empty());

        // Valid JSON of the wrong shape is treated the same way
        storage.put_raw("bookmarkedJobIds", r#"{"a":1}"#).unwrap();
        let ids: Vec<i64> = storage.load("bookmarkedJobIds", Vec::new());
        assert!(ids.is_empty());
    }

    #[test]
    fn test_failed_write_leaves_previous_value() {
        let storage = Storage::open_in_memory().unwrap();
        storage.save("appliedJobIds", &vec![1]);
        storage.reject_writes();

        assert!(storage.put_raw("appliedJobIds", "[1,2]").is_err());
        // save swallows the error
        storage.save("appliedJobIds", &vec![1, 2]);
        let ids: Vec<i64> = storage.load("appliedJobIds", Vec::new());
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_resolve_path_prefers_explicit() {
        let explicit = PathBuf::from("/tmp/explicit.db");
        assert_eq!(Storage::resolve_path(Some(explicit.clone())), explicit);
    }
}
