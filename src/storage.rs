// Local key-value storage backends
//
// Synchronous, string-keyed, string-valued. The persistence bridge only ever
// touches one key, but the backends don't care which.

use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;

use crate::error::Result;

pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing whatever was there.
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;
}

// ============================================================================
// SQLITE BACKEND
// ============================================================================

/// Key-value table in a single SQLite file.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        setup_store(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        setup_store(&conn)?;
        Ok(Self { conn })
    }
}

fn setup_store(conn: &Connection) -> Result<()> {
    // WAL for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    Ok(())
}

impl KeyValueStore for SqliteStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            params![key, value],
        )?;
        Ok(())
    }
}

// ============================================================================
// IN-MEMORY BACKEND
// ============================================================================

/// HashMap-backed store for tests and throwaway sessions.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    items: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.items.insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_set_get_overwrite() {
        let mut store = SqliteStore::open_in_memory().unwrap();

        assert_eq!(store.get_item("expenses").unwrap(), None);

        store.set_item("expenses", "[1]").unwrap();
        assert_eq!(store.get_item("expenses").unwrap().as_deref(), Some("[1]"));

        store.set_item("expenses", "[2]").unwrap();
        assert_eq!(
            store.get_item("expenses").unwrap().as_deref(),
            Some("[2]"),
            "Second write should fully replace the first"
        );
        assert_eq!(store.get_item("other").unwrap(), None, "Keys are independent");
    }

    #[test]
    fn test_sqlite_survives_reopen() {
        let path = std::env::temp_dir().join(format!(
            "expense-ledger-test-{}.db",
            uuid::Uuid::new_v4()
        ));

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.set_item("expenses", "[]").unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get_item("expenses").unwrap().as_deref(), Some("[]"));

        drop(store);
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::with_item("a", "1");
        assert_eq!(store.get_item("a").unwrap().as_deref(), Some("1"));
        assert_eq!(store.get_item("b").unwrap(), None);

        store.set_item("a", "2").unwrap();
        assert_eq!(store.get_item("a").unwrap().as_deref(), Some("2"));
    }
}
