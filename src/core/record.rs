use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Serialize, Deserialize};

use crate::core::error::ValidationError;

/// Day-month-year, the only date layout the ledger file uses.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Length of a code under the strict policies.
pub const CODE_LENGTH: usize = 5;

/// Header row of the ledger file, in column order.
pub const COLUMNS: [&str; 6] = ["date", "code", "description", "quantity", "unit_price", "total"];

/// One row of the ledger.
///
/// `date` is kept as the text found in the file so that a row with a
/// malformed date still loads and saves unchanged; only the monthly
/// summary needs it parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub date: String,
    pub code: String,
    pub description: String,
    pub quantity: u32,
    pub unit_price: u64,
    pub total: u64
}

impl ExpenseRecord {
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, DATE_FORMAT).ok()
    }
}

impl fmt::Display for ExpenseRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}: {} x {} = {}",
            self.date, self.code, self.description, self.quantity, self.unit_price, self.total)
    }
}

/// A row as entered by the user, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExpense {
    #[serde(with = "day_month_year")]
    pub date: NaiveDate,
    pub code: String,
    #[serde(default)]
    pub description: String,
    pub quantity: u32,
    pub unit_price: u64
}

impl NewExpense {
    pub fn new(date: NaiveDate, code: &str, description: &str, quantity: u32, unit_price: u64) -> NewExpense {
        NewExpense {
            date,
            code: code.to_owned(),
            description: description.to_owned(),
            quantity,
            unit_price
        }
    }

    /// Checks the input against `policy` and builds the row to store,
    /// freezing `total` at the current unit price.
    pub fn into_record(self, policy: CodePolicy) -> Result<ExpenseRecord, ValidationError> {
        let code = policy.normalize(&self.code)?;
        if self.quantity == 0 {
            return Err(ValidationError::ZeroQuantity);
        }
        let total = u64::from(self.quantity).checked_mul(self.unit_price)
            .ok_or(ValidationError::TotalOverflow { quantity: self.quantity, unit_price: self.unit_price })?;

        return Ok(ExpenseRecord {
            date: self.date.format(DATE_FORMAT).to_string(),
            code,
            description: self.description,
            quantity: self.quantity,
            unit_price: self.unit_price,
            total
        });
    }
}

mod day_month_year {
    use chrono::NaiveDate;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use super::DATE_FORMAT;

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&text, DATE_FORMAT).map_err(D::Error::custom)
    }
}

/// Rule applied to codes on append and edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodePolicy {
    /// Any text is accepted as is
    Any,
    /// Exactly five letters or digits, stored uppercase
    Alphanumeric,
    /// Exactly five digits
    #[default]
    Numeric
}

impl CodePolicy {
    /// Validates `code` and returns the form to store.
    pub fn normalize(&self, code: &str) -> Result<String, ValidationError> {
        match self {
            Self::Any => Ok(code.to_owned()),
            Self::Alphanumeric => {
                let code = code.trim();
                check_length(code)?;
                if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
                    return Err(ValidationError::CodeNotAlphanumeric(code.to_owned()));
                }
                Ok(code.to_ascii_uppercase())
            },
            Self::Numeric => {
                let code = code.trim();
                check_length(code)?;
                if !code.chars().all(|c| c.is_ascii_digit()) {
                    return Err(ValidationError::CodeNotNumeric(code.to_owned()));
                }
                Ok(code.to_owned())
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Alphanumeric => "alphanumeric",
            Self::Numeric => "numeric"
        }
    }
}

fn check_length(code: &str) -> Result<(), ValidationError> {
    let actual = code.chars().count();
    if actual != CODE_LENGTH {
        return Err(ValidationError::CodeLength { actual });
    }
    return Ok(());
}

impl fmt::Display for CodePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for CodePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" => Ok(Self::Any),
            "alphanumeric" => Ok(Self::Alphanumeric),
            "numeric" => Ok(Self::Numeric),
            other => Err(format!("unknown code policy {:?}, expected any, alphanumeric or numeric", other))
        }
    }
}

/// A column of the ledger, as addressed by `update_field`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Date,
    Code,
    Description,
    Quantity,
    UnitPrice,
    Total
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Date => COLUMNS[0],
            Self::Code => COLUMNS[1],
            Self::Description => COLUMNS[2],
            Self::Quantity => COLUMNS[3],
            Self::UnitPrice => COLUMNS[4],
            Self::Total => COLUMNS[5]
        }
    }

    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Code)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Field {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "date" => Ok(Self::Date),
            "code" => Ok(Self::Code),
            "description" => Ok(Self::Description),
            "quantity" => Ok(Self::Quantity),
            "unit_price" => Ok(Self::UnitPrice),
            "total" => Ok(Self::Total),
            _ => Err(ValidationError::UnknownField(s.to_owned()))
        }
    }
}
