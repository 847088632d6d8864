// src/render/fields.rs
//! Display projections for individual extracted fields. All functions are
//! total: null and unparseable input produce a fallback, never a panic.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use url::{ParseError, Url};

use crate::types::ExtractionSummary;

pub const NOT_SPECIFIED: &str = "Not specified";
pub const LINK_NOT_PROVIDED: &str = "Not provided";
const CURRENCY_SYMBOL: &str = "₹";
const URGENT_WITHIN_DAYS: i64 = 7;
const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Numeric forms are read day-first (`dd/mm/yyyy`).
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%d %B, %Y",
    "%B %d, %Y",
    "%b %d, %Y",
];

/// Prefix a bare amount with the rupee symbol. Values that already name a
/// currency, and free text, are returned unchanged.
pub fn format_salary(salary: Option<&str>) -> String {
    let Some(raw) = salary.map(str::trim).filter(|s| !s.is_empty()) else {
        return NOT_SPECIFIED.to_string();
    };

    if is_bare_amount(raw) {
        format!("{}{}", CURRENCY_SYMBOL, raw)
    } else {
        raw.to_string()
    }
}

/// Digits with optional thousands separators and an optional decimal part.
fn is_bare_amount(value: &str) -> bool {
    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (value, None),
    };
    let whole_ok = !whole.is_empty()
        && whole.chars().all(|c| c.is_ascii_digit() || c == ',')
        && whole.chars().next().is_some_and(|c| c.is_ascii_digit());
    let fraction_ok = fraction.map_or(true, |f| !f.is_empty() && f.chars().all(|c| c.is_ascii_digit()));
    whole_ok && fraction_ok
}

pub fn parse_deadline(deadline: &str) -> Option<NaiveDate> {
    let trimmed = deadline.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(ts.date_naive());
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

/// Long-form date such as `10 January 2025`, or the input unchanged when it
/// is not a recognizable date.
pub fn format_deadline(deadline: Option<&str>) -> String {
    match deadline {
        None => NOT_SPECIFIED.to_string(),
        Some(raw) if raw.trim().is_empty() => NOT_SPECIFIED.to_string(),
        Some(raw) => match parse_deadline(raw) {
            Some(date) => date.format("%-d %B %Y").to_string(),
            None => raw.to_string(),
        },
    }
}

pub fn is_deadline_urgent(deadline: Option<&str>) -> bool {
    is_deadline_urgent_at(deadline, Utc::now())
}

/// The instant a deadline falls due. Timestamps keep their time and offset;
/// date-only values fall due at midnight UTC.
pub fn deadline_instant(deadline: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(deadline.trim()) {
        return Some(ts.with_timezone(&Utc));
    }
    parse_deadline(deadline)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

/// True when the deadline is between 1 and 7 whole days away, counting
/// partial days as a full day.
pub fn is_deadline_urgent_at(deadline: Option<&str>, now: DateTime<Utc>) -> bool {
    let Some(due) = deadline.and_then(deadline_instant) else {
        return false;
    };

    let millis = (due - now).num_milliseconds();
    let days = if millis > 0 {
        (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
    } else {
        millis / MILLIS_PER_DAY
    };
    days > 0 && days <= URGENT_WITHIN_DAYS
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationLink {
    Absent,
    Link { text: String, href: String },
}

impl ApplicationLink {
    pub fn text(&self) -> &str {
        match self {
            Self::Absent => LINK_NOT_PROVIDED,
            Self::Link { text, .. } => text,
        }
    }

    pub fn href(&self) -> Option<&str> {
        match self {
            Self::Absent => None,
            Self::Link { href, .. } => Some(href),
        }
    }
}

/// Host-only link text; the target keeps the full URL, gaining `https://`
/// when no scheme is present. Input that is not a URL even with the prefix
/// is shown and linked as given.
pub fn normalize_application_url(url: Option<&str>) -> ApplicationLink {
    let Some(raw) = url.map(str::trim).filter(|u| !u.is_empty()) else {
        return ApplicationLink::Absent;
    };

    match parse_link(raw) {
        Some((parsed, href)) => ApplicationLink::Link {
            text: link_text(&parsed),
            href,
        },
        None => ApplicationLink::Link {
            text: raw.to_string(),
            href: raw.to_string(),
        },
    }
}

fn parse_link(raw: &str) -> Option<(Url, String)> {
    match Url::parse(raw) {
        Ok(parsed) if parsed.host_str().is_some() => Some((parsed, raw.to_string())),
        // `host:8080/path` parses with the host as its scheme.
        Ok(parsed) if !parsed.path().starts_with(|c: char| c.is_ascii_digit()) => None,
        Ok(_) | Err(ParseError::RelativeUrlWithoutBase) => {
            let href = format!("https://{}", raw);
            Url::parse(&href)
                .ok()
                .filter(|parsed| parsed.host_str().is_some())
                .map(|parsed| (parsed, href))
        }
        Err(_) => None,
    }
}

fn link_text(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

pub fn extracted_field_count(summary: &ExtractionSummary) -> usize {
    summary.extracted_fields.values().filter(|present| **present).count()
}

/// Time of day the service finished parsing, in `tz`.
pub fn format_processed_time<Tz: TimeZone>(summary: &ExtractionSummary, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match summary.parsed_timestamp() {
        Some(ts) => ts.with_timezone(tz).format("%H:%M:%S").to_string(),
        None => summary.parsing_timestamp.clone(),
    }
}
