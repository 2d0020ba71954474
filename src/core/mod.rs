pub mod error;
pub mod record;
pub mod table;
pub mod summary;
pub mod ledger;

pub use error::{LedgerError, ValidationError, Result};
pub use record::{CodePolicy, ExpenseRecord, Field, NewExpense};
pub use table::LedgerTable;
pub use summary::Summary;
pub use ledger::LedgerStore;
