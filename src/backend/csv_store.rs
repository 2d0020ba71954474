use std::{fs, io, path::{Path, PathBuf}};

use csv::{ReaderBuilder, WriterBuilder};
use log::debug;

use crate::backend::LedgerBackend;
use crate::core::{ExpenseRecord, LedgerError, LedgerTable, Result};
use crate::core::record::COLUMNS;

/// Keeps the ledger in a single UTF-8 CSV file with a fixed header row.
#[derive(Debug, Clone)]
pub struct CsvBackend {
    path: PathBuf
}

impl CsvBackend {
    pub fn new(path: impl AsRef<Path>) -> CsvBackend {
        CsvBackend { path: path.as_ref().to_owned() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the new table is written to before it replaces the ledger.
    fn staging_path(&self) -> PathBuf {
        let name = self.path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "ledger".to_owned());
        self.path.with_file_name(format!(".{}.tmp", name))
    }

    fn io_error(&self, path: &Path, source: io::Error) -> LedgerError {
        LedgerError::Io { path: path.to_owned(), source }
    }

    fn corrupt(&self, reason: impl ToString) -> LedgerError {
        LedgerError::Corrupt { path: self.path.clone(), reason: reason.to_string() }
    }

    fn decode(&self, bytes: &[u8]) -> Result<LedgerTable> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_reader(bytes);

        let headers = reader.headers().map_err(|err| self.corrupt(err))?;
        if !headers.iter().eq(COLUMNS.iter().copied()) {
            let found: Vec<&str> = headers.iter().collect();
            return Err(self.corrupt(format!("expected columns {}, found {}", COLUMNS.join(","), found.join(","))));
        }

        let mut rows = Vec::new();
        for result in reader.deserialize::<ExpenseRecord>() {
            rows.push(result.map_err(|err| self.corrupt(err))?);
        }
        return Ok(LedgerTable::from_rows(rows));
    }

    fn encode(&self, table: &LedgerTable) -> Result<Vec<u8>> {
        // header written by hand so an empty table still gets one
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());

        writer.write_record(COLUMNS)
            .map_err(|err| self.io_error(&self.path, err.into()))?;
        for row in table {
            writer.serialize(row)
                .map_err(|err| self.io_error(&self.path, err.into()))?;
        }
        writer.into_inner()
            .map_err(|err| self.io_error(&self.path, io::Error::new(err.error().kind(), err.to_string())))
    }
}

impl LedgerBackend for CsvBackend {
    fn read(&self) -> Result<Option<LedgerTable>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io_error(&self.path, err))
        };
        let table = self.decode(&bytes)?;
        debug!("read {} rows from {}", table.len(), self.path.display());
        return Ok(Some(table));
    }

    fn save(&self, table: &LedgerTable) -> Result<()> {
        let bytes = self.encode(table)?;
        let staging = self.staging_path();

        // a partly written or unplaced staging file is never left behind
        if let Err(err) = fs::write(&staging, &bytes) {
            let _ = fs::remove_file(&staging);
            return Err(self.io_error(&staging, err));
        }
        if let Err(err) = fs::rename(&staging, &self.path) {
            let _ = fs::remove_file(&staging);
            return Err(self.io_error(&self.path, err));
        }
        debug!("wrote {} rows to {}", table.len(), self.path.display());
        return Ok(());
    }

    fn export(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).map_err(|err| self.io_error(&self.path, err))
    }
}
