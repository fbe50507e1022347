use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

// ── Day-first parsing ─────────────────────────────────────────────────────────

/// Parse a day-first date such as `"01.06.2024"` or `"1.6.2024 14:30"`.
///
/// Also accepts ISO `YYYY-MM-DD`, which some exports use. Returns `None` for
/// anything else, never fails.
pub fn parse_day_first(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    const DATE_FMTS: &[&str] = &["%d.%m.%Y", "%d. %m. %Y", "%d/%m/%Y", "%Y-%m-%d"];
    for fmt in DATE_FMTS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(date);
        }
    }

    const DATETIME_FMTS: &[&str] = &[
        "%d.%m.%Y %H:%M:%S",
        "%d.%m.%Y %H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ];
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.date());
        }
    }

    None
}

/// Parse exactly `DD.MM.YYYY` (two-digit day and month, four-digit year).
pub fn parse_strict_dmy(text: &str) -> Option<NaiveDate> {
    static STRICT: OnceLock<Regex> = OnceLock::new();
    let re = STRICT.get_or_init(|| Regex::new(r"^\d{2}\.\d{2}\.\d{4}$").expect("regex is valid"));

    if !re.is_match(text) {
        return None;
    }
    NaiveDate::parse_from_str(text, "%d.%m.%Y").ok()
}

// ── Month bucketing ───────────────────────────────────────────────────────────

/// Last calendar day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}

// ── DateWindow ────────────────────────────────────────────────────────────────

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Both bounds are included.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
