use std::path::Path;

use log::{info, warn};

use crate::backend::{CsvBackend, LedgerBackend};
use crate::core::error::{LedgerError, Result, ValidationError};
use crate::core::record::{CodePolicy, ExpenseRecord, Field, NewExpense};
use crate::core::summary::Summary;
use crate::core::table::LedgerTable;

/// Sole owner of the persisted ledger.
///
/// Nothing is cached between calls: every operation reads the current
/// table from the backend, applies its change and writes the whole table
/// back before returning it.
pub struct LedgerStore<B: LedgerBackend = CsvBackend> {
    backend: B,
    policy: CodePolicy
}

impl LedgerStore<CsvBackend> {
    pub fn open(path: impl AsRef<Path>, policy: CodePolicy) -> LedgerStore<CsvBackend> {
        LedgerStore::new(CsvBackend::new(path), policy)
    }
}

impl<B: LedgerBackend> LedgerStore<B> {
    pub fn new(backend: B, policy: CodePolicy) -> LedgerStore<B> {
        LedgerStore { backend, policy }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn policy(&self) -> CodePolicy {
        self.policy
    }

    /// Reads the ledger, creating an empty one on first access.
    pub fn load(&self) -> Result<LedgerTable> {
        match self.backend.read()? {
            Some(table) => Ok(table),
            None => {
                let table = LedgerTable::new();
                self.backend.save(&table)?;
                info!("created empty ledger");
                Ok(table)
            }
        }
    }

    pub fn append(&self, expense: NewExpense) -> Result<LedgerTable> {
        let record = expense.into_record(self.policy)
            .map_err(|err| rejected(err.into()))?;
        let mut table = self.load()?;

        table.push(record);
        self.backend.save(&table)?;
        info!("appended row {}", table.len() - 1);
        return Ok(table);
    }

    /// Sets one field of the row at `index`. Only the code can be changed,
    /// and the new value has to pass the code policy.
    pub fn update_field(&self, index: usize, field: Field, value: &str) -> Result<LedgerTable> {
        let mut table = self.load()?;
        table.check_index(index).map_err(rejected)?;
        if !field.is_editable() {
            return Err(rejected(ValidationError::FieldNotEditable(field.to_string()).into()));
        }
        let code = self.policy.normalize(value)
            .map_err(|err| rejected(err.into()))?;

        table.set_code(index, code)?;
        self.backend.save(&table)?;
        info!("updated {} of row {}", field, index);
        return Ok(table);
    }

    /// Removes the row at `index`. Rows after it move up by one.
    pub fn delete(&self, index: usize) -> Result<LedgerTable> {
        let mut table = self.load()?;
        let removed = table.remove(index).map_err(rejected)?;

        self.backend.save(&table)?;
        info!("deleted row {} ({})", index, removed.code);
        return Ok(table);
    }

    /// Loads the ledger and collects the matching rows. For a lazy,
    /// restartable walk over the matches use [`LedgerTable::search`] on
    /// the table returned by [`LedgerStore::load`].
    pub fn search<P>(&self, predicate: P) -> Result<Vec<ExpenseRecord>>
    where
        P: Fn(&ExpenseRecord) -> bool + Clone
    {
        let table = self.load()?;
        return Ok(table.search(predicate).cloned().collect());
    }

    pub fn summary(&self) -> Result<Summary> {
        Ok(self.load()?.summary())
    }

    /// The ledger file content as stored.
    pub fn export(&self) -> Result<Vec<u8>> {
        self.load()?;
        self.backend.export()
    }
}

fn rejected(err: LedgerError) -> LedgerError {
    warn!("rejected: {}", err);
    err
}
