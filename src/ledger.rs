// Ledger state manager - owns the canonical record sequence
//
// Records are newest-first: every add prepends. The only mutations are add
// and delete, and each one is written through to persistence before returning.

use chrono::{NaiveDate, Utc};
use tracing::debug;

use crate::error::{InputError, Result};
use crate::model::{Category, ExpenseRecord};
use crate::persistence::Persistence;
use crate::summary::{self, CategoryTotals};

/// Raw form values, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseInput {
    pub description: String,
    pub amount: String,
    pub category: Category,
}

impl ExpenseInput {
    pub fn new(
        description: impl Into<String>,
        amount: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            description: description.into(),
            amount: amount.into(),
            category,
        }
    }

    /// Trimmed description and parsed amount, or the first problem found.
    pub fn validate(&self) -> std::result::Result<(String, f64), InputError> {
        let description = self.description.trim();
        if description.is_empty() {
            return Err(InputError::EmptyDescription);
        }
        let amount = parse_amount(&self.amount)?;
        Ok((description.to_string(), amount))
    }
}

/// Parse user-supplied amount text into a finite, non-negative number.
pub fn parse_amount(text: &str) -> std::result::Result<f64, InputError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(InputError::MissingAmount);
    }

    let amount: f64 = text
        .parse()
        .map_err(|_| InputError::InvalidAmount(text.to_string()))?;

    if !amount.is_finite() || amount < 0.0 {
        return Err(InputError::InvalidAmount(text.to_string()));
    }

    // "-0" parses to negative zero, which would print as "-0.00"
    Ok(if amount == 0.0 { 0.0 } else { amount })
}

pub struct Ledger<P: Persistence> {
    records: Vec<ExpenseRecord>,
    persistence: P,
}

impl<P: Persistence> Ledger<P> {
    /// Restore the saved sequence. This is the only read from persistence.
    pub fn open(persistence: P) -> Result<Self> {
        let records = persistence.load()?;
        Ok(Self {
            records,
            persistence,
        })
    }

    /// Newest first.
    pub fn records(&self) -> &[ExpenseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// Record an expense dated today (UTC).
    pub fn add_expense(&mut self, input: &ExpenseInput) -> Result<&ExpenseRecord> {
        self.add_expense_on(input, Utc::now().date_naive())
    }

    /// Record an expense with an explicit date.
    ///
    /// Invalid input leaves the ledger and storage untouched and returns the
    /// reason as [`LedgerError::Input`](crate::error::LedgerError::Input).
    pub fn add_expense_on(&mut self, input: &ExpenseInput, date: NaiveDate) -> Result<&ExpenseRecord> {
        let (description, amount) = input.validate()?;

        let record = ExpenseRecord::new(self.fresh_id(), description, amount, input.category, date);
        debug!(id = %record.id, amount, category = %record.category, "Adding expense");
        self.records.insert(0, record);

        if let Err(err) = self.persistence.save(&self.records) {
            self.records.remove(0);
            return Err(err);
        }

        Ok(&self.records[0])
    }

    /// Remove the record with `id`. Unknown ids are ignored.
    pub fn delete_expense(&mut self, id: &str) -> Result<Option<ExpenseRecord>> {
        let removed = self
            .records
            .iter()
            .position(|r| r.id == id)
            .map(|index| (index, self.records.remove(index)));

        match &removed {
            Some((_, record)) => debug!(id, description = %record.description, "Deleted expense"),
            None => debug!(id, "Delete ignored, no such expense"),
        }

        if let Err(err) = self.persistence.save(&self.records) {
            if let Some((index, record)) = removed {
                self.records.insert(index, record);
            }
            return Err(err);
        }

        Ok(removed.map(|(_, record)| record))
    }

    pub fn total(&self) -> f64 {
        summary::total(&self.records)
    }

    pub fn totals_by_category(&self) -> CategoryTotals {
        summary::totals_by_category(&self.records)
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = uuid::Uuid::new_v4().to_string();
            if !self.records.iter().any(|r| r.id == id) {
                return id;
            }
        }
    }
}
