use serde::{Serialize, Deserialize};

use crate::core::error::{LedgerError, Result};
use crate::core::record::ExpenseRecord;
use crate::core::summary::Summary;

/// The ledger rows in file order.
///
/// Rows are addressed by position. Removing a row shifts every later row
/// up by one, so an index read before a delete no longer points at the
/// same row afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerTable {
    rows: Vec<ExpenseRecord>
}

impl LedgerTable {
    pub fn new() -> LedgerTable {
        LedgerTable { rows: Vec::new() }
    }

    pub fn from_rows(rows: Vec<ExpenseRecord>) -> LedgerTable {
        LedgerTable { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[ExpenseRecord] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&ExpenseRecord> {
        self.rows.get(index)
    }

    pub fn push(&mut self, record: ExpenseRecord) {
        self.rows.push(record);
    }

    /// Replaces the code of the row at `index`. The code must already be
    /// normalized.
    pub fn set_code(&mut self, index: usize, code: String) -> Result<()> {
        let len = self.len();
        let row = self.rows.get_mut(index)
            .ok_or(LedgerError::Index { index, len })?;
        row.code = code;
        return Ok(());
    }

    pub fn remove(&mut self, index: usize) -> Result<ExpenseRecord> {
        self.check_index(index)?;
        return Ok(self.rows.remove(index));
    }

    pub fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.len() {
            return Err(LedgerError::Index { index, len: self.len() });
        }
        return Ok(());
    }

    /// Lazily yields the rows matching `predicate`. The iterator can be
    /// cloned to walk the matches again.
    pub fn search<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = &'a ExpenseRecord> + Clone + 'a
    where
        P: Fn(&ExpenseRecord) -> bool + Clone + 'a
    {
        self.rows.iter().filter(move |record| predicate(*record))
    }

    pub fn summary(&self) -> Summary {
        Summary::from_records(&self.rows)
    }
}

impl<'a> IntoIterator for &'a LedgerTable {
    type Item = &'a ExpenseRecord;
    type IntoIter = std::slice::Iter<'a, ExpenseRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Exact match on the code column.
pub fn by_code(code: impl Into<String>) -> impl Fn(&ExpenseRecord) -> bool + Clone {
    let code = code.into();
    move |record: &ExpenseRecord| record.code == code
}


#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use crate::core::error::LedgerError;
    use crate::core::record::ExpenseRecord;
    use crate::core::table::{by_code, LedgerTable};

    fn row(code: &str, description: &str) -> ExpenseRecord {
        ExpenseRecord {
            date: "01-06-2024".to_owned(),
            code: code.to_owned(),
            description: description.to_owned(),
            quantity: 1,
            unit_price: 100,
            total: 100
        }
    }

    #[fixture]
    fn table() -> LedgerTable {
        LedgerTable::from_rows(vec![
            row("00001", "pulpen"),
            row("00002", "map"),
            row("00001", "tinta"),
        ])
    }

    #[rstest]
    fn delete_shifts_rows_up(mut table: LedgerTable) {
        let removed = table.remove(0).unwrap();
        assert_eq!(removed.description, "pulpen");
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0).unwrap().description, "map");
        assert_eq!(table.get(1).unwrap().description, "tinta");
    }

    #[rstest]
    #[case(3)]
    #[case(4)]
    #[case(usize::MAX)]
    fn out_of_range(mut table: LedgerTable, #[case] index: usize) {
        assert!(matches!(table.remove(index), Err(LedgerError::Index { len: 3, .. })));
        assert!(matches!(table.set_code(index, "99999".into()), Err(LedgerError::Index { .. })));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn empty_table_has_no_index_zero() {
        let mut table = LedgerTable::new();
        assert!(matches!(table.remove(0), Err(LedgerError::Index { index: 0, len: 0 })));
        assert!(matches!(table.set_code(0, "12345".into()), Err(LedgerError::Index { index: 0, len: 0 })));
    }

    #[rstest]
    fn set_code_in_place(mut table: LedgerTable) {
        table.set_code(1, "55555".into()).unwrap();
        assert_eq!(table.get(1).unwrap().code, "55555");
        assert_eq!(table.get(1).unwrap().description, "map");
    }

    #[rstest]
    fn search_is_restartable(table: LedgerTable) {
        let matches = table.search(by_code("00001"));
        let first: Vec<&str> = matches.clone().map(|r| r.description.as_str()).collect();
        let second: Vec<&str> = matches.map(|r| r.description.as_str()).collect();

        assert_eq!(first, vec!["pulpen", "tinta"]);
        assert_eq!(first, second);
        assert_eq!(table.len(), 3);
    }

    #[rstest]
    fn search_without_match(table: LedgerTable) {
        assert_eq!(table.search(by_code("1")).count(), 0);
        assert_eq!(table.search(|r: &ExpenseRecord| r.total >= 100).count(), 3);
    }
}
