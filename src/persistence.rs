// Persistence bridge - mirrors the ledger into a key-value store
//
// Every save is a full overwrite of one fixed key, every load a full read.
// No partial updates, no versioning.

use serde::Deserialize;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::error::Result;
use crate::model::ExpenseRecord;
use crate::storage::KeyValueStore;

/// Key holding the whole serialized ledger.
pub const STORAGE_KEY: &str = "expenses";

pub trait Persistence {
    /// Read the saved sequence. Absent or malformed data loads as empty.
    fn load(&self) -> Result<Vec<ExpenseRecord>>;

    fn save(&mut self, records: &[ExpenseRecord]) -> Result<()>;
}

/// Whether an empty ledger is written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavePolicy {
    /// Every mutation is persisted, so deleting the last record clears storage.
    #[default]
    Always,
    /// Empty sequences are never written; the last non-empty snapshot stays.
    SkipEmpty,
}

/// Persistence over a [`KeyValueStore`] at [`STORAGE_KEY`].
pub struct LocalStorage<S: KeyValueStore> {
    store: S,
    policy: SavePolicy,
}

impl<S: KeyValueStore> LocalStorage<S> {
    pub fn new(store: S) -> Self {
        Self::with_policy(store, SavePolicy::default())
    }

    pub fn with_policy(store: S, policy: SavePolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> SavePolicy {
        self.policy
    }
}

impl<S: KeyValueStore> Persistence for LocalStorage<S> {
    fn load(&self) -> Result<Vec<ExpenseRecord>> {
        let raw = match self.store.get_item(STORAGE_KEY)? {
            Some(raw) => raw,
            None => {
                info!("No saved expenses, starting empty");
                return Ok(Vec::new());
            }
        };

        match decode(&raw) {
            Ok(records) => {
                info!(count = records.len(), "Loaded saved expenses");
                Ok(records)
            }
            Err(reason) => {
                warn!(%reason, "Discarding malformed saved expenses");
                Ok(Vec::new())
            }
        }
    }

    fn save(&mut self, records: &[ExpenseRecord]) -> Result<()> {
        if records.is_empty() && self.policy == SavePolicy::SkipEmpty {
            return Ok(());
        }

        let json = serde_json::to_string(records)?;
        self.store.set_item(STORAGE_KEY, &json)?;
        info!(count = records.len(), "Saved expenses");
        Ok(())
    }
}

/// Parse a stored snapshot and check the ledger invariants on it.
fn decode(raw: &str) -> std::result::Result<Vec<ExpenseRecord>, String> {
    let records: Vec<ExpenseRecord> = serde_json::from_str(raw).map_err(|e| e.to_string())?;

    if let Some(bad) = records.iter().find(|r| !r.is_valid()) {
        return Err(format!("record {} violates amount/description rules", bad.id));
    }

    let mut seen = HashSet::new();
    if let Some(dup) = records.iter().find(|r| !seen.insert(r.id.as_str())) {
        return Err(format!("duplicate id {}", dup.id));
    }

    Ok(records)
}
