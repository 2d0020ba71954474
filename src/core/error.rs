use std::{io, path::PathBuf};

use thiserror::Error;

use crate::core::record::CODE_LENGTH;

/// Input rejected before anything is written to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The code does not have the required number of characters
    #[error("code must be exactly {} characters long, got {actual}", CODE_LENGTH)]
    CodeLength { actual: usize },
    #[error("code must contain only letters and digits: {0:?}")]
    CodeNotAlphanumeric(String),
    #[error("code must contain only digits: {0:?}")]
    CodeNotNumeric(String),
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    /// `quantity * unit_price` does not fit in a total
    #[error("total of {quantity} x {unit_price} is too large")]
    TotalOverflow { quantity: u32, unit_price: u64 },
    #[error("field {0} cannot be edited, only code can")]
    FieldNotEditable(String),
    #[error("no such field: {0}")]
    UnknownField(String),
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
    /// Occurs when a row is addressed by a position outside the table
    #[error("no row at index {index}, the ledger has {len} rows")]
    Index { index: usize, len: usize },
    #[error("unable to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The ledger file exists but does not hold a valid table
    #[error("ledger file {} is corrupt: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, LedgerError>;
