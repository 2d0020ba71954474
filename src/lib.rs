pub mod core;
pub mod backend;
pub mod config;

pub use crate::core::{CodePolicy, ExpenseRecord, Field, LedgerStore, LedgerTable, NewExpense, Summary};
pub use crate::core::{LedgerError, ValidationError};
pub use crate::core::{ledger, record, summary, table};
pub use crate::config::AppConfig;
