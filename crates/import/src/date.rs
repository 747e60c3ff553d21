use chrono::{Duration, NaiveDate};

use crate::util::re;

re!(re_iso_prefix, r"^(\d{4})-(\d{2})-(\d{2})");
re!(re_day_first, r"^(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4}|\d{2})$");
re!(re_day_month_name, r"^(\d{1,2})[/.\-]([A-Za-z]{3})[/.\-](\d{4}|\d{2})$");
re!(re_year_first, r"^(\d{4})[/.\-](\d{2})[/.\-](\d{2})$");

/// Exclusive bounds for a bare spreadsheet serial (roughly 2009..2064).
const SERIAL_MIN: i64 = 40_000;
const SERIAL_MAX: i64 = 60_000;

fn spreadsheet_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

/// Spanish month abbreviations plus the English ones that differ.
fn month_abbr_to_num(abbr: &str) -> Option<u32> {
    let month = match abbr.to_ascii_lowercase().as_str() {
        "ene" | "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "abr" | "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "ago" | "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dic" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Two-digit years are taken to be 20YY.
fn expand_year(y: &str) -> Option<i32> {
    let year: i32 = y.parse().ok()?;
    Some(if y.len() == 2 { 2000 + year } else { year })
}

/// Normalize a statement date token into a calendar date.
///
/// Formats are tried in order and the first match wins: ISO prefix,
/// day-first numeric, day-first with a month abbreviation, year-first
/// numeric, then a bare spreadsheet serial. Impossible dates (`31/02/2025`)
/// are rejected rather than rolled over.
pub fn parse_date(token: &str) -> Option<NaiveDate> {
    let s = token.trim();
    try_iso_prefix(s)
        .or_else(|| try_day_first(s))
        .or_else(|| try_day_month_name(s))
        .or_else(|| try_year_first(s))
        .or_else(|| try_serial(s))
}

fn try_iso_prefix(s: &str) -> Option<NaiveDate> {
    let c = re_iso_prefix().captures(s)?;
    let year: i32 = c.get(1)?.as_str().parse().ok()?;
    let month: u32 = c.get(2)?.as_str().parse().ok()?;
    let day: u32 = c.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn try_day_first(s: &str) -> Option<NaiveDate> {
    let c = re_day_first().captures(s)?;
    let day: u32 = c.get(1)?.as_str().parse().ok()?;
    let month: u32 = c.get(2)?.as_str().parse().ok()?;
    let year = expand_year(c.get(3)?.as_str())?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn try_day_month_name(s: &str) -> Option<NaiveDate> {
    let c = re_day_month_name().captures(s)?;
    let day: u32 = c.get(1)?.as_str().parse().ok()?;
    let month = month_abbr_to_num(c.get(2)?.as_str())?;
    let year = expand_year(c.get(3)?.as_str())?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn try_year_first(s: &str) -> Option<NaiveDate> {
    let c = re_year_first().captures(s)?;
    let year: i32 = c.get(1)?.as_str().parse().ok()?;
    let month: u32 = c.get(2)?.as_str().parse().ok()?;
    let day: u32 = c.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn try_serial(s: &str) -> Option<NaiveDate> {
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let serial: i64 = s.parse().ok()?;
    if serial <= SERIAL_MIN || serial >= SERIAL_MAX {
        return None;
    }
    spreadsheet_epoch()?.checked_add_signed(Duration::days(serial))
}
