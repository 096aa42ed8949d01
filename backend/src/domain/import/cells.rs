//! Per-cell heuristics for roster rows: names, dates, ages, phone blobs and
//! address blobs.

use chrono::{Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use super::error::RowErrorKind;
use super::sheet::Cell;

static DAY_MONTH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4}|\d{2})$").unwrap());
static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d{1,3})(?:[.,]\d+)?\b").unwrap());

static LABELED_PHONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-zÀ-ÖØ-öø-ÿ][A-Za-zÀ-ÖØ-öø-ÿ' .\-]*?)\s*:\s*(\d{2}(?:[ .]?\d{2}){4})\b").unwrap()
});
static BARE_PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{10}\b").unwrap());
static DOTTED_PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{2}(?:\.\d{2}){4}\b").unwrap());
static SPACED_PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{2}(?: \d{2}){4}\b").unwrap());

static POSTAL_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{5}\b").unwrap());

/// Marker put in front of a phone cell nothing could be extracted from
pub const UNRECOGNISED_PHONE_PREFIX: &str = "Tél. non reconnu: ";
pub const REMARKS_SEPARATOR: &str = " | ";

/// Split "LAST First Second" on the first space. The remainder, spaces and
/// all, is the first name.
pub fn split_name(raw: &str) -> (String, String) {
    let raw = raw.trim();
    match raw.split_once(char::is_whitespace) {
        Some((last, first)) => (
            last.to_string(),
            first.split_whitespace().collect::<Vec<_>>().join(" "),
        ),
        None => (raw.to_string(), String::new()),
    }
}

/// Two-digit years above 50 belong to the previous century
pub fn expand_two_digit_year(year: i32) -> i32 {
    if year > 50 {
        1900 + year
    } else {
        2000 + year
    }
}

/// Spreadsheet serial day number to calendar date. Serial 60 is the phantom
/// 1900-02-29, so later serials line up with a 1899-12-30 epoch.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.floor() as u64))
}

/// Birth date from a serial number or `dd/mm/yy[yy]` text. Empty is `None`,
/// anything else unreadable is an error.
pub fn parse_birth_date(cell: &Cell) -> Result<Option<NaiveDate>, RowErrorKind> {
    match cell {
        Cell::Empty => Ok(None),
        Cell::Number(serial) => serial_to_date(*serial)
            .map(Some)
            .ok_or_else(|| RowErrorKind::InvalidBirthDate(cell.as_text())),
        Cell::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            parse_date_text(text)
                .map(Some)
                .ok_or_else(|| RowErrorKind::InvalidBirthDate(text.to_string()))
        }
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    if let Some(caps) = DAY_MONTH_YEAR.captures(text) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year: i32 = caps[3].parse().ok()?;
        let year = if caps[3].len() == 2 {
            expand_two_digit_year(year)
        } else {
            year
        };
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }

    // CSV exports carry serial numbers as text
    text.parse::<f64>().ok().and_then(serial_to_date)
}

/// Age from a number or text such as "12 ans". Empty is `None`.
pub fn parse_age(cell: &Cell) -> Result<Option<u32>, RowErrorKind> {
    match cell {
        Cell::Empty => Ok(None),
        Cell::Number(age) if *age >= 0.0 && *age < 150.0 => Ok(Some(age.floor() as u32)),
        Cell::Number(_) => Err(RowErrorKind::InvalidAge(cell.as_text())),
        Cell::Text(text) => {
            if text.trim().is_empty() {
                return Ok(None);
            }
            LEADING_NUMBER
                .captures(text)
                .and_then(|caps| caps[1].parse::<u32>().ok())
                .map(Some)
                .ok_or_else(|| RowErrorKind::InvalidAge(text.trim().to_string()))
        }
    }
}

/// Phone numbers found in a free-text cell
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhoneExtraction {
    /// First number found, as ten contiguous digits
    pub primary: Option<String>,
    /// Human-readable rendering of the numbers for the remarks field
    pub remarks: Option<String>,
}

/// Pull phone numbers out of a cell. Patterns are tried in order (labeled,
/// bare ten digits, dotted, spaced); the first one that matches wins and all
/// of its matches are kept. An unrecognised cell is preserved in `remarks`.
pub fn extract_phones(raw: &str) -> PhoneExtraction {
    let raw = raw.trim();
    if raw.is_empty() {
        return PhoneExtraction::default();
    }

    let labeled: Vec<(String, String)> = LABELED_PHONE
        .captures_iter(raw)
        .map(|caps| (caps[1].trim().to_string(), digits_only(&caps[2])))
        .collect();
    if let Some((_, first)) = labeled.first() {
        let remarks = labeled
            .iter()
            .map(|(label, number)| format!("{}: {}", label, format_phone(number)))
            .collect::<Vec<_>>()
            .join(", ");
        return PhoneExtraction {
            primary: Some(first.clone()),
            remarks: Some(remarks),
        };
    }

    for pattern in [&*BARE_PHONE, &*DOTTED_PHONE, &*SPACED_PHONE] {
        let numbers: Vec<String> = pattern.find_iter(raw).map(|m| digits_only(m.as_str())).collect();
        if let Some((first, others)) = numbers.split_first() {
            let remarks = (!others.is_empty()).then(|| {
                others
                    .iter()
                    .map(|number| format!("Autre tél: {}", format_phone(number)))
                    .collect::<Vec<_>>()
                    .join(", ")
            });
            return PhoneExtraction {
                primary: Some(first.clone()),
                remarks,
            };
        }
    }

    PhoneExtraction {
        primary: None,
        remarks: Some(format!("{}{}", UNRECOGNISED_PHONE_PREFIX, raw)),
    }
}

fn digits_only(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

/// "0102030405" -> "01 02 03 04 05"
pub fn format_phone(digits: &str) -> String {
    digits
        .as_bytes()
        .chunks(2)
        .map(|pair| String::from_utf8_lossy(pair).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// An address cell: kept whole, with postal code and city when found
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressParts {
    pub full: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
}

pub fn split_address(raw: &str) -> AddressParts {
    let full = raw.trim();
    if full.is_empty() {
        return AddressParts::default();
    }

    let mut parts = AddressParts {
        full: Some(full.to_string()),
        ..Default::default()
    };
    if let Some(code) = POSTAL_CODE.find_iter(full).last() {
        parts.postal_code = Some(code.as_str().to_string());
        let city = full[code.end()..].trim_matches(|c: char| c.is_whitespace() || c == ',' || c == '-');
        if !city.is_empty() {
            parts.city = Some(city.to_string());
        }
    }
    parts
}

/// Join the non-empty remark fragments
pub fn join_remarks(fragments: &[Option<String>]) -> Option<String> {
    let joined = fragments
        .iter()
        .flatten()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect::<Vec<_>>()
        .join(REMARKS_SEPARATOR);
    (!joined.is_empty()).then_some(joined)
}
