use thiserror::Error;

/// Why a form submission was rejected. The ledger is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("description is required")]
    EmptyDescription,
    #[error("amount is required")]
    MissingAmount,
    #[error("'{0}' is not a valid amount")]
    InvalidAmount(String),
    #[error("unknown category '{0}'")]
    UnknownCategory(String),
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
    #[error(transparent)]
    Encoding(#[from] serde_json::Error),
}

pub type Result<T> = ::std::result::Result<T, LedgerError>;
