use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::amount::parse_amount;
use crate::date::parse_date;
use crate::util::re;

// Header words in Spanish and English, separator rules, blank cells, and the
// RUT/NOMBRE lines at the top of most cartolas.
re!(re_noise,
    r"(?i)^(?:fecha|date|n[uú]mero|number|descripci[oó]n|description|detalle|detail|cargo|charge|abono|credit|saldo|balance|monto|amount|cuenta|account|tipo|type|glosa|memo|documento|document|rut|nombre|-{3,}|={3,}|\s*$)");

/// Only the leading fields are searched for the row date.
pub const DATE_SEARCH_WIDTH: usize = 5;

/// A running balance can only be set aside when the row has at least this
/// many numeric columns; two columns are always read as a debit/credit pair.
pub const BALANCE_MIN_CANDIDATES: usize = 3;

/// A non-zero number found in a row, other than the date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericCandidate {
    pub index: usize,
    pub value: Decimal,
}

/// Which field plays which part in a classified row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRoles {
    pub date_index: usize,
    pub date: NaiveDate,
    /// In column order; never includes `date_index`.
    pub candidates: Vec<NumericCandidate>,
    /// Field presumed to hold the running balance.
    pub balance_index: Option<usize>,
}

impl ColumnRoles {
    pub fn is_candidate(&self, index: usize) -> bool {
        self.candidates.iter().any(|c| c.index == index)
    }

    /// Candidates left after removing the presumed balance.
    pub fn movement_candidates(&self) -> Vec<NumericCandidate> {
        self.candidates
            .iter()
            .filter(|c| Some(c.index) != self.balance_index)
            .copied()
            .collect()
    }
}

/// Outcome of classifying one tokenized row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowClass {
    /// First field is a header word, a rule line, or blank.
    Noise,
    TooFewFields,
    NoDate,
    NoNumeric,
    Classified(ColumnRoles),
}

pub fn is_noise(first_field: &str) -> bool {
    re_noise().is_match(first_field)
}

pub fn classify(fields: &[String]) -> RowClass {
    let Some(first) = fields.first() else {
        return RowClass::TooFewFields;
    };
    if is_noise(first) {
        return RowClass::Noise;
    }
    if fields.len() < 2 {
        return RowClass::TooFewFields;
    }

    let Some((date_index, date)) = fields
        .iter()
        .take(DATE_SEARCH_WIDTH)
        .enumerate()
        .find_map(|(i, f)| parse_date(f).map(|d| (i, d)))
    else {
        return RowClass::NoDate;
    };

    let candidates: Vec<NumericCandidate> = fields
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != date_index)
        .filter_map(|(index, f)| {
            parse_amount(f)
                .filter(|v| !v.is_zero())
                .map(|value| NumericCandidate { index, value })
        })
        .collect();

    if candidates.is_empty() {
        return RowClass::NoNumeric;
    }

    let balance_index = presumed_balance(&candidates);
    RowClass::Classified(ColumnRoles {
        date_index,
        date,
        candidates,
        balance_index,
    })
}

/// The largest candidate is taken for a running balance when it is the only
/// one above a tenth of its own magnitude.
fn presumed_balance(candidates: &[NumericCandidate]) -> Option<usize> {
    if candidates.len() < BALANCE_MIN_CANDIDATES {
        return None;
    }
    let largest = candidates
        .iter()
        .min_by_key(|c| std::cmp::Reverse(c.value.abs()))?;
    let threshold = largest.value.abs() / Decimal::TEN;
    let standing_out = candidates
        .iter()
        .filter(|c| c.value.abs() > threshold)
        .count();

    (standing_out == 1).then_some(largest.index)
}
