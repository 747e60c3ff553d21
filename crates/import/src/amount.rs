//! Locale-ambiguous amount parsing.
//!
//! Chilean exports group thousands with `.` and mark decimals with `,`, but
//! spreadsheets re-exported through other locales use `.` as the decimal
//! point. The separators in a token are read according to a [`NumberLayout`].
//! The rules are fixed, ambiguous cases included: `1.234` is always 1234 and
//! `1.23` is always a decimal.

use rust_decimal::Decimal;
use std::str::FromStr;

/// How the periods and commas of an unsigned numeric token are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberLayout {
    /// A comma is present: it is the decimal mark, every period groups thousands (`1.234,56`).
    CommaDecimal,
    /// A single period followed by exactly three digits groups thousands (`1.234`).
    PeriodThousands,
    /// A single period followed by anything else is a decimal point (`1234.56`, `1.23`).
    PeriodDecimal,
    /// No comma and zero or several periods: every period groups thousands (`1.234.567`).
    GroupedPeriods,
}

impl NumberLayout {
    pub fn classify(body: &str) -> Self {
        if body.contains(',') {
            return NumberLayout::CommaDecimal;
        }
        match body.split_once('.') {
            Some((whole, frac)) if !frac.contains('.') => {
                if !whole.is_empty() && frac.len() == 3 && frac.bytes().all(|b| b.is_ascii_digit())
                {
                    NumberLayout::PeriodThousands
                } else {
                    NumberLayout::PeriodDecimal
                }
            }
            _ => NumberLayout::GroupedPeriods,
        }
    }

    /// Rewrite `body` into plain `digits[.digits]` form.
    pub fn normalize(self, body: &str) -> String {
        match self {
            NumberLayout::CommaDecimal => body.replace('.', "").replacen(',', ".", 1),
            NumberLayout::PeriodThousands | NumberLayout::GroupedPeriods => body.replace('.', ""),
            NumberLayout::PeriodDecimal => body.to_string(),
        }
    }
}

/// Split off one leading sign character. Returns `(negative, rest)`.
fn split_sign(s: &str) -> (bool, &str) {
    if let Some(rest) = s.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = s.strip_prefix('+') {
        (false, rest)
    } else {
        (false, s)
    }
}

/// Parse a statement amount into a signed decimal.
///
/// Returns `None` for empty or blank tokens, a lone sign, or anything that is
/// not a number once separators are resolved. Whitespace inside the token is
/// ignored (`"1 234"` is 1234).
pub fn parse_amount(token: &str) -> Option<Decimal> {
    let compact: String = token.chars().filter(|c| !c.is_whitespace()).collect();
    let (negative, body) = split_sign(&compact);
    if body.is_empty() {
        return None;
    }

    let layout = NumberLayout::classify(body);
    let cleaned = layout.normalize(body);
    if !cleaned.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let value = Decimal::from_str(&cleaned).ok()?;

    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    // ── NumberLayout ──────────────────────────────────────────────────────────

    #[test]
    fn layout_comma_wins_over_periods() {
        assert_eq!(NumberLayout::classify("1.234,56"), NumberLayout::CommaDecimal);
        assert_eq!(NumberLayout::classify("12,5"), NumberLayout::CommaDecimal);
    }

    #[test]
    fn layout_single_period_three_digit_suffix_is_thousands() {
        assert_eq!(NumberLayout::classify("1.234"), NumberLayout::PeriodThousands);
        assert_eq!(NumberLayout::classify("25.000"), NumberLayout::PeriodThousands);
    }

    #[test]
    fn layout_single_period_other_suffix_is_decimal() {
        assert_eq!(NumberLayout::classify("1234.56"), NumberLayout::PeriodDecimal);
        assert_eq!(NumberLayout::classify("1.23"), NumberLayout::PeriodDecimal);
        assert_eq!(NumberLayout::classify("1.2345"), NumberLayout::PeriodDecimal);
        // Nothing before the period: read as a decimal fraction.
        assert_eq!(NumberLayout::classify(".234"), NumberLayout::PeriodDecimal);
    }

    #[test]
    fn layout_many_or_no_periods_are_grouping() {
        assert_eq!(NumberLayout::classify("1.234.567"), NumberLayout::GroupedPeriods);
        assert_eq!(NumberLayout::classify("1234567"), NumberLayout::GroupedPeriods);
    }

    #[test]
    fn normalize_each_layout() {
        assert_eq!(NumberLayout::CommaDecimal.normalize("1.234,56"), "1234.56");
        assert_eq!(NumberLayout::PeriodThousands.normalize("1.234"), "1234");
        assert_eq!(NumberLayout::PeriodDecimal.normalize("1234.56"), "1234.56");
        assert_eq!(NumberLayout::GroupedPeriods.normalize("1.234.567"), "1234567");
    }

    // ── parse_amount ──────────────────────────────────────────────────────────

    #[test]
    fn grouped_thousands() {
        assert_eq!(parse_amount("1.234.567"), Some(dec("1234567")));
    }

    #[test]
    fn chilean_decimal_comma() {
        assert_eq!(parse_amount("1.234,56"), Some(dec("1234.56")));
    }

    #[test]
    fn plain_decimal_point() {
        assert_eq!(parse_amount("1234.56"), Some(dec("1234.56")));
    }

    #[test]
    fn negative_thousands() {
        assert_eq!(parse_amount("-1.234"), Some(dec("-1234")));
    }

    #[test]
    fn two_digit_suffix_is_decimal() {
        assert_eq!(parse_amount("1.23"), Some(dec("1.23")));
    }

    #[test]
    fn explicit_plus_sign_and_padding() {
        assert_eq!(parse_amount("  +25.000 "), Some(dec("25000")));
    }

    #[test]
    fn inner_whitespace_is_ignored() {
        assert_eq!(parse_amount("1 234 567"), Some(dec("1234567")));
    }

    #[test]
    fn not_a_number() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("   "), None);
        assert_eq!(parse_amount("-"), None);
        assert_eq!(parse_amount("+"), None);
        assert_eq!(parse_amount("Compra Jumbo"), None);
        assert_eq!(parse_amount("$25.000"), None);
        assert_eq!(parse_amount("--5"), None);
    }

    #[test]
    fn zero_parses_as_zero() {
        assert_eq!(parse_amount("0"), Some(Decimal::ZERO));
        assert_eq!(parse_amount("0,00"), Some(Decimal::ZERO));
    }
}
