// Expense Ledger - Core Library
// Exposes the ledger, its storage and derived views for the CLI/TUI and tests

pub mod error;
pub mod model;
pub mod storage;      // Key-value backends (SQLite file, in-memory)
pub mod persistence;  // Ledger <-> key-value bridge
pub mod ledger;       // State manager: add / delete
pub mod summary;      // Derived views: total, per-category
pub mod settings;

// Re-export commonly used types
pub use error::{InputError, LedgerError};
pub use model::{Category, ExpenseRecord};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use persistence::{LocalStorage, Persistence, SavePolicy, STORAGE_KEY};
pub use ledger::{parse_amount, ExpenseInput, Ledger};
pub use summary::{format_amount, total, totals_by_category, CategoryTotals};
pub use settings::Settings;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
