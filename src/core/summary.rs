use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::core::record::ExpenseRecord;

/// Aggregates shown on the dashboard.
///
/// Sums are kept as `u128`: each row total fits in a `u64`, so adding up
/// any number of rows cannot overflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total: u128,
    /// `None` for an empty ledger
    pub average: Option<f64>,
    pub count: usize,
    /// Spending per `YYYY-MM`, in calendar order
    pub monthly_totals: BTreeMap<String, u128>
}

impl Summary {
    const MONTH_FORMAT: &'static str = "%Y-%m";

    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a ExpenseRecord>) -> Summary {
        let mut total = 0u128;
        let mut count = 0usize;
        let mut monthly_totals = BTreeMap::new();

        for record in records {
            total += u128::from(record.total);
            count += 1;
            // rows with an unreadable date only drop out of the monthly view
            if let Some(date) = record.parsed_date() {
                let month = date.format(Self::MONTH_FORMAT).to_string();
                *monthly_totals.entry(month).or_insert(0) += u128::from(record.total);
            }
        }

        let average = if count == 0 { None } else { Some(total as f64 / count as f64) };
        return Summary { total, average, count, monthly_totals };
    }
}
