use cartola_core::{Direction, Money, ParsedTransaction, MAX_DESCRIPTION_CHARS, NO_DESCRIPTION};
use rust_decimal::Decimal;

use crate::classifier::{ColumnRoles, NumericCandidate};
use crate::util::is_digits_or_blank;

/// Separator placed between the text fields of a description.
const DESCRIPTION_JOIN: &str = " | ";

/// Build a transaction from a classified row, or `None` when the row resolves
/// to a zero amount.
pub fn assemble(fields: &[String], roles: &ColumnRoles, raw_line: &str) -> Option<ParsedTransaction> {
    let (magnitude, direction) = resolve_amount(roles)?;
    if magnitude.is_zero() {
        return None;
    }

    Some(ParsedTransaction {
        date: roles.date,
        description: describe(fields, roles),
        amount: Money::from_decimal(magnitude),
        direction,
        source_line: raw_line.to_string(),
    })
}

/// Decide the amount magnitude and its direction from the numeric columns.
pub fn resolve_amount(roles: &ColumnRoles) -> Option<(Decimal, Direction)> {
    match roles.candidates.as_slice() {
        [] => None,
        [only] => Some((only.value.abs(), Direction::from_sign(only.value))),
        all => {
            let movements = roles.movement_candidates();
            let (debit, credit) = match (roles.balance_index, movements.as_slice()) {
                (Some(_), [debit, credit, ..]) => (*debit, *credit),
                _ => (all[0], all[1]),
            };

            if let Some(resolved) = signed_amount_beside_balance(all, debit, credit) {
                return Some(resolved);
            }
            resolve_debit_credit(debit, credit).or_else(|| first_non_zero(all))
        }
    }
}

/// A signed movement followed by a positive total (`-25000;;475000`) is an
/// amount column next to a running balance, not a debit/credit pair.
fn signed_amount_beside_balance(
    all: &[NumericCandidate],
    debit: NumericCandidate,
    credit: NumericCandidate,
) -> Option<(Decimal, Direction)> {
    let is_pair_only = all.len() == 2;
    (is_pair_only && debit.value.is_sign_negative() && credit.value.is_sign_positive())
        .then(|| (debit.value.abs(), Direction::Expense))
}

fn resolve_debit_credit(
    debit: NumericCandidate,
    credit: NumericCandidate,
) -> Option<(Decimal, Direction)> {
    let d = debit.value.abs();
    let c = credit.value.abs();
    match (d.is_zero(), c.is_zero()) {
        (false, true) => Some((d, Direction::Expense)),
        (true, false) => Some((c, Direction::Income)),
        (false, false) if d > c => Some((d, Direction::Expense)),
        (false, false) => Some((c, Direction::Income)),
        (true, true) => None,
    }
}

fn first_non_zero(all: &[NumericCandidate]) -> Option<(Decimal, Direction)> {
    all.iter()
        .find(|c| !c.value.is_zero())
        .map(|c| (c.value.abs(), Direction::from_sign(c.value)))
}

/// Join the text columns of a row into a bounded description.
pub fn describe(fields: &[String], roles: &ColumnRoles) -> String {
    let joined = fields
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != roles.date_index && !roles.is_candidate(*i))
        .map(|(_, f)| f.as_str())
        .filter(|f| f.chars().count() > 1 && !is_digits_or_blank(f))
        .collect::<Vec<_>>()
        .join(DESCRIPTION_JOIN);

    let bounded: String = joined.chars().take(MAX_DESCRIPTION_CHARS).collect();
    let bounded = bounded.trim();
    if bounded.is_empty() {
        NO_DESCRIPTION.to_string()
    } else {
        bounded.to_string()
    }
}
