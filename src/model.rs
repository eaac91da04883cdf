// Expense model - the record the ledger tracks and its fixed category set
//
// Identity: `id` (assigned once, never displayed)
// Values: description, amount, category, date (immutable after creation)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::InputError;

// ============================================================================
// CATEGORY
// ============================================================================

/// Classification label applied to an expense.
///
/// Serialized as the bare label (`"Food"`, `"Transport"`, ...) so stored
/// snapshots stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    #[default]
    Food,
    Transport,
    Entertainment,
    Bills,
    Shopping,
    Other,
}

impl Category {
    /// Selector order.
    pub const ALL: [Category; 6] = [
        Category::Food,
        Category::Transport,
        Category::Entertainment,
        Category::Bills,
        Category::Shopping,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Entertainment => "Entertainment",
            Category::Bills => "Bills",
            Category::Shopping => "Shopping",
            Category::Other => "Other",
        }
    }

    fn position(&self) -> usize {
        Category::ALL
            .iter()
            .position(|c| c == self)
            .unwrap_or_default()
    }

    /// Next label in selector order, wrapping around.
    pub fn next(&self) -> Self {
        Category::ALL[(self.position() + 1) % Category::ALL.len()]
    }

    /// Previous label in selector order, wrapping around.
    pub fn previous(&self) -> Self {
        let len = Category::ALL.len();
        Category::ALL[(self.position() + len - 1) % len]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Category {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| InputError::UnknownCategory(wanted.to_string()))
    }
}

// ============================================================================
// EXPENSE RECORD
// ============================================================================

/// One user-entered expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Stable identity, only used for deletion
    pub id: String,

    pub description: String,

    /// Monetary value, finite and non-negative
    pub amount: f64,

    pub category: Category,

    /// Creation day, serialized as `YYYY-MM-DD`
    pub date: NaiveDate,
}

impl ExpenseRecord {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        amount: f64,
        category: Category,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            amount,
            category,
            date,
        }
    }

    /// Check the record invariants: non-empty description, finite amount >= 0.
    pub fn is_valid(&self) -> bool {
        !self.description.trim().is_empty() && self.amount.is_finite() && self.amount >= 0.0
    }
}
