use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use super::money::Money;

/// Placeholder used when a row carries no usable text.
pub const NO_DESCRIPTION: &str = "no description";

/// Upper bound on a parsed description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Income,
    Expense,
}

impl Direction {
    /// Zero and positive values are income; negative values are expenses.
    pub fn from_sign(value: Decimal) -> Self {
        if value.is_sign_negative() && !value.is_zero() {
            Direction::Expense
        } else {
            Direction::Income
        }
    }

    /// Balance delta for a posted amount: `+amount` or `-amount`.
    pub fn apply(self, amount: Money) -> Money {
        match self {
            Direction::Income => amount.abs(),
            Direction::Expense => -amount.abs(),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Income => write!(f, "income"),
            Direction::Expense => write!(f, "expense"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Direction::Income),
            "expense" => Ok(Direction::Expense),
            other => Err(format!("Unknown direction: '{other}'")),
        }
    }
}

/// A transaction recovered from one statement row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTransaction {
    pub date: NaiveDate,
    pub description: String,
    /// Always a non-negative magnitude; the sign lives in `direction`.
    pub amount: Money,
    #[serde(rename = "type")]
    pub direction: Direction,
    /// The untouched source line, kept for auditing.
    #[serde(rename = "raw")]
    pub source_line: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementParseResult {
    #[serde(rename = "bank_detected")]
    pub institution_name: String,
    pub transactions: Vec<ParsedTransaction>,
}

impl StatementParseResult {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Sum of magnitudes per direction: `(income, expense)`.
    pub fn totals(&self) -> (Money, Money) {
        self.transactions
            .iter()
            .fold((Money::zero(), Money::zero()), |(inc, exp), tx| match tx.direction {
                Direction::Income => (inc + tx.amount, exp),
                Direction::Expense => (inc, exp + tx.amount),
            })
    }
}

/// A row coming back from the review screen, possibly edited by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewedTransaction {
    #[serde(default)]
    pub include: bool,
    #[serde(rename = "type")]
    pub direction: Direction,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub amount: Option<Decimal>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ReviewedTransaction {
    pub fn from_parsed(tx: &ParsedTransaction) -> Self {
        Self {
            include: true,
            direction: tx.direction,
            amount: Some(tx.amount.as_decimal()),
            date: Some(tx.date),
            description: Some(tx.description.clone()),
        }
    }

    /// Amount magnitude and date when the row is included and both are present.
    pub fn postable(&self) -> Option<(Money, NaiveDate)> {
        if !self.include {
            return None;
        }
        let amount = Money::from_decimal(self.amount?.abs());
        if amount.is_zero() {
            return None;
        }
        Some((amount, self.date?))
    }
}

/// Review forms send `""` for cleared fields and numbers or strings for
/// amounts; both collapse to `None` or a parsed value here.
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    use serde::de::Error;

    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let text = match raw {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(other) => return Err(D::Error::custom(format!("unexpected value: {other}"))),
    };
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<T>().map(Some).map_err(D::Error::custom)
}
