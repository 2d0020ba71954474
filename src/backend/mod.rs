mod csv_store;
mod interface;

pub use interface::LedgerBackend;
pub use csv_store::CsvBackend;
