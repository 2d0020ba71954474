use crate::core::{LedgerTable, Result};

/// Where a ledger table is kept between operations.
pub trait LedgerBackend {
    /// Returns `None` when nothing has been persisted yet.
    fn read(&self) -> Result<Option<LedgerTable>>;
    /// Replaces the persisted table with `table` as a whole.
    fn save(&self, table: &LedgerTable) -> Result<()>;
    /// The persisted table exactly as stored.
    fn export(&self) -> Result<Vec<u8>>;
}
