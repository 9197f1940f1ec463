//! Indonesian calendar-date normalization
//!
//! The booking site renders dates as `Rabu, 1 Oktober 2025`. Everything that
//! compares dates goes through [`normalize_local_date`] first, so rows and the
//! operator's target are matched as [`NaiveDate`] values, never as strings.

use chrono::{Datelike, NaiveDate};

use crate::error::{Error, Result};

/// Indonesian month names and their common abbreviations
const MONTHS_ID: &[(&str, u32)] = &[
    ("januari", 1),
    ("februari", 2),
    ("maret", 3),
    ("april", 4),
    ("mei", 5),
    ("juni", 6),
    ("juli", 7),
    ("agustus", 8),
    ("september", 9),
    ("oktober", 10),
    ("november", 11),
    ("desember", 12),
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("jun", 6),
    ("jul", 7),
    ("agu", 8),
    ("agt", 8),
    ("sep", 9),
    ("okt", 10),
    ("nov", 11),
    ("des", 12),
];

/// Look up a month number by its Indonesian name (case- and accent-insensitive)
pub fn month_number(name: &str) -> Option<u32> {
    let folded = fold(name);
    MONTHS_ID
        .iter()
        .find(|(month, _)| *month == folded)
        .map(|(_, number)| *number)
}

/// Convert `"18 Oktober 2025"` (optionally prefixed by a weekday) to a date
///
/// # Errors
///
/// Returns `Error::Parse` if no `day month year` sequence is found, the month
/// name is unknown, or the date does not exist.
pub fn normalize_local_date(text: &str) -> Result<NaiveDate> {
    let tokens: Vec<&str> = text
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| !t.is_empty())
        .collect();

    for window in tokens.windows(3) {
        let (day, month, year) = (window[0], window[1], window[2]);
        if !is_day(day) || !is_year(year) || !month.chars().all(char::is_alphabetic) {
            continue;
        }

        let month_num = month_number(month)
            .ok_or_else(|| Error::parse(format!("unknown month name '{}' in '{}'", month, text)))?;
        let day_num: u32 = day
            .parse()
            .map_err(|_| Error::parse(format!("invalid day '{}' in '{}'", day, text)))?;
        let year_num: i32 = year
            .parse()
            .map_err(|_| Error::parse(format!("invalid year '{}' in '{}'", year, text)))?;

        return NaiveDate::from_ymd_opt(year_num, month_num, day_num)
            .ok_or_else(|| Error::parse(format!("'{}' is not a calendar date", text)));
    }

    Err(Error::parse(format!(
        "expected '<day> <month> <year>', got '{}'",
        text.trim()
    )))
}

/// Parse the operator's target date
///
/// Accepts ISO (`2025-10-18`), the Indonesian long form (`18 Oktober 2025`),
/// or a bare day of month (`18`) combined with an explicit `YYYY-MM`.
pub fn parse_target(text: &str, year_month: Option<&str>) -> Result<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::parse("target date is empty"));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }

    if is_day(trimmed) {
        let ym = year_month.ok_or_else(|| {
            Error::parse(format!(
                "target '{}' is only a day of month; a year-month (YYYY-MM) is required",
                trimmed
            ))
        })?;
        let first = parse_year_month(ym)?;
        return first
            .with_day(trimmed.parse().unwrap_or(0))
            .ok_or_else(|| Error::parse(format!("day {} does not exist in {}", trimmed, ym)));
    }

    normalize_local_date(trimmed)
}

/// Parse `YYYY-MM` into the first day of that month
pub fn parse_year_month(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", text.trim()), "%Y-%m-%d")
        .map_err(|_| Error::parse(format!("expected year-month as YYYY-MM, got '{}'", text)))
}

/// Format the `YYYY-MM` month a date falls in
pub fn year_month_of(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

fn is_day(token: &str) -> bool {
    (1..=2).contains(&token.len()) && token.chars().all(|c| c.is_ascii_digit())
}

fn is_year(token: &str) -> bool {
    token.len() == 4 && token.chars().all(|c| c.is_ascii_digit())
}

/// Lowercase and strip Latin diacritics
fn fold(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
            'è' | 'é' | 'ê' | 'ë' => 'e',
            'ì' | 'í' | 'î' | 'ï' => 'i',
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
            'ù' | 'ú' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}
