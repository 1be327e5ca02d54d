// Utility helpers for parsing cells, deriving bucket keys and formatting.
//
// This module centralizes all the "dirty" CSV/number/date handling so the
// rest of the code can assume clean, typed values.
use chrono::{Datelike, NaiveDate};
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in CSV exports (commas, spaces, text).
///
/// - Accepts `Option<&str>` so callers can pass through optional fields.
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Strips thousands separators like `","` before parsing, but only when
///   they sit between three-digit groups (`1,234.5`); `7,50` is rejected.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if s.contains(',') && !has_thousands_groups(s) {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok()
}

/// `[+-]d{1,3}(,ddd)+(.d+)?`
fn has_thousands_groups(s: &str) -> bool {
    let unsigned = s.strip_prefix(['-', '+']).unwrap_or(s);
    let (int_part, frac) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };
    let digits = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    if frac.is_some_and(|f| !digits(f)) {
        return false;
    }
    let mut groups = int_part.split(',');
    let lead_ok = groups.next().is_some_and(|g| digits(g) && g.len() <= 3);
    lead_ok && groups.all(|g| digits(g) && g.len() == 3)
}

/// Hours worked on a row. Anything missing, unparseable or negative is 0,
/// so every consumer can sum the column directly.
pub fn parse_hours(s: Option<&str>) -> f64 {
    match parse_f64_safe(s) {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

/// Parse a UK-style date, trying `DD/MM/YYYY`, `D/M/YYYY` and `DD/MM/YY`
/// in that order.
///
/// Matching is strict: no other separators, no trailing time, no US
/// month/day swap, and impossible dates like `31/02/2024` are rejected.
/// Two-digit years pivot at 68 (`68` -> 2068, `69` -> 1969).
pub fn parse_uk_date(s: &str) -> Option<NaiveDate> {
    let mut parts = s.trim().split('/');
    let (day, month, year) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let numeric = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    if !(numeric(day) && numeric(month) && numeric(year)) {
        return None;
    }

    let year = match year.len() {
        // DD/MM/YYYY, then D/M/YYYY
        4 if day.len() <= 2 && month.len() <= 2 => year.parse::<i32>().ok()?,
        // DD/MM/YY
        2 if day.len() == 2 && month.len() == 2 => {
            let yy = year.parse::<i32>().ok()?;
            if yy <= 68 {
                2000 + yy
            } else {
                1900 + yy
            }
        }
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, month.parse().ok()?, day.parse().ok()?)
}

/// Parse an ISO `YYYY-MM-DD` date, as used for custom range bounds.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// `YYYY-MM`
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// `YYYY-Www` using ISO-8601 week numbering (the ISO year, not the calendar year).
pub fn iso_week_key(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{:04}-W{:02}", week.year(), week.week())
}

pub fn quarter_key(year: i32, month: u32) -> String {
    format!("{}-Q{}", year, (month + 2) / 3)
}

/// Fiscal years run April to March and are named after the calendar year
/// they start in.
pub fn fiscal_year_key(year: i32, month: u32) -> String {
    let start = if month >= 4 { year } else { year - 1 };
    format!("FY{:02}", start.rem_euclid(100))
}

fn split_month_key(key: &str) -> Option<(i32, u32)> {
    let (year, month) = key.split_once('-')?;
    let year = year.parse::<i32>().ok()?;
    let month = month.parse::<u32>().ok()?;
    (1..=12).contains(&month).then_some((year, month))
}

/// `YYYY-MM` -> `YYYY-Q#`
pub fn quarter_from_month_key(key: &str) -> Option<String> {
    split_month_key(key).map(|(y, m)| quarter_key(y, m))
}

/// `YYYY-MM` -> `FY{yy}`
pub fn fiscal_year_from_month_key(key: &str) -> Option<String> {
    split_month_key(key).map(|(y, m)| fiscal_year_key(y, m))
}

/// Percentage of `part` in `total`; 0 when `total` is 0 to avoid NaNs.
pub fn percent(part: f64, total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    part / total * 100.0
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimal places plus locale-aware thousands separators
    // (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
