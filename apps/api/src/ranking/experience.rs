#![allow(dead_code)]

//! Experience estimation — infers total years of work experience from narrative
//! date ranges such as "March 2019 to June 2021", "Jan 2020 – Dec 2022" or
//! "2015 - present".
//!
//! This is a best-effort heuristic. Overlapping or duplicated ranges are summed
//! as written, and ranges the parser cannot read are skipped rather than failed.

use chrono::{Datelike, Month, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// `<Month> <Year>` to `<Month> <Year>` | `present`
static MONTH_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\w+\s\d{4})\s*(?:to|-|–)\s*(\w+\s\d{4}|present)")
        .expect("month range pattern is valid")
});

/// `<Year>` to `<Year>` | `present`
static YEAR_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d{4})\s*(?:to|-|–)\s*(\d{4}|present)").expect("year range pattern is valid")
});

const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

/// One start/end pair read from the text. Both ends sit on the first of the month,
/// except an open-ended `present` which resolves to the reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExperienceInterval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ExperienceInterval {
    /// Whole calendar months covered by the interval.
    pub fn months(&self) -> u32 {
        months_between(self.start, self.end)
    }
}

/// Why a matched range did not produce an interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "token", rename_all = "snake_case")]
pub enum SkipReason {
    UnparseableStart(String),
    UnparseableEnd(String),
    Inverted,
}

/// Outcome of a single range match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedRange {
    Parsed(ExperienceInterval),
    Skipped(SkipReason),
}

/// Full breakdown of an estimation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExperienceEstimate {
    pub years: u32,
    pub total_months: u32,
    pub intervals: Vec<ExperienceInterval>,
    pub skipped: Vec<SkipReason>,
}

/// Lazily scans `text` for date ranges.
///
/// Month ranges are scanned first, then bare-year ranges. The two scans are
/// independent: a phrase matched by both contributes twice.
pub fn extract_ranges(text: &str, today: NaiveDate) -> impl Iterator<Item = ParsedRange> + '_ {
    let patterns: [&'static Regex; 2] = [&MONTH_RANGE_RE, &YEAR_RANGE_RE];
    patterns.into_iter().flat_map(move |pattern| {
        pattern
            .captures_iter(text)
            .map(move |caps| parse_range(&caps[1], &caps[2], today))
    })
}

/// Years of experience found in `text`, with `present` resolved to today's UTC date.
pub fn estimate_years(text: &str) -> u32 {
    estimate_years_as_of(text, Utc::now().date_naive())
}

/// Years of experience found in `text`, with `present` resolved to `today`.
/// The month total saturates at `u32::MAX`.
pub fn estimate_years_as_of(text: &str, today: NaiveDate) -> u32 {
    let total_months = extract_ranges(text, today)
        .filter_map(|range| match range {
            ParsedRange::Parsed(interval) => Some(interval.months()),
            ParsedRange::Skipped(_) => None,
        })
        .fold(0u32, u32::saturating_add);
    total_months / 12
}

/// Like [`estimate_years_as_of`], but keeps every interval and skip reason.
pub fn estimate(text: &str, today: NaiveDate) -> ExperienceEstimate {
    let mut estimate = ExperienceEstimate::default();
    for range in extract_ranges(text, today) {
        match range {
            ParsedRange::Parsed(interval) => {
                estimate.total_months = estimate.total_months.saturating_add(interval.months());
                estimate.intervals.push(interval);
            }
            ParsedRange::Skipped(reason) => estimate.skipped.push(reason),
        }
    }
    estimate.years = estimate.total_months / 12;
    estimate
}

fn parse_range(start_token: &str, end_token: &str, today: NaiveDate) -> ParsedRange {
    let Some(start) = parse_date_token(start_token) else {
        return ParsedRange::Skipped(SkipReason::UnparseableStart(start_token.trim().to_string()));
    };

    let end_token = end_token.trim();
    let end = if end_token.eq_ignore_ascii_case("present") {
        Some(today)
    } else {
        parse_date_token(end_token)
    };
    let Some(end) = end else {
        return ParsedRange::Skipped(SkipReason::UnparseableEnd(end_token.to_string()));
    };

    if end < start {
        return ParsedRange::Skipped(SkipReason::Inverted);
    }
    ParsedRange::Parsed(ExperienceInterval { start, end })
}

/// Resolves a date token, trying in order: full month name + year,
/// three-letter month abbreviation + year, bare four-digit year (January 1st).
pub fn parse_date_token(token: &str) -> Option<NaiveDate> {
    let token = token.trim();
    match token.split_once(char::is_whitespace) {
        Some((month, year)) => {
            let year = parse_year(year.trim())?;
            let month = month_from_full_name(month).or_else(|| month_from_abbreviation(month))?;
            NaiveDate::from_ymd_opt(year, month, 1)
        }
        None => NaiveDate::from_ymd_opt(parse_year(token)?, 1, 1),
    }
}

fn parse_year(token: &str) -> Option<i32> {
    if token.len() != 4 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

fn month_from_full_name(name: &str) -> Option<u32> {
    MONTHS
        .iter()
        .find(|m| m.name().eq_ignore_ascii_case(name))
        .map(|m| m.number_from_month())
}

fn month_from_abbreviation(name: &str) -> Option<u32> {
    MONTHS
        .iter()
        .find(|m| m.name()[..3].eq_ignore_ascii_case(name))
        .map(|m| m.number_from_month())
}

/// Whole months from `start` to `end`; a partial trailing month is not counted.
fn months_between(start: NaiveDate, end: NaiveDate) -> u32 {
    let mut months =
        (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    if end.day() < start.day() {
        months -= 1;
    }
    months.max(0) as u32
}
