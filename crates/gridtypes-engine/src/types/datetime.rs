//! Date/time column metadata, values and formats.
//!
//! Every granularity has one strict pattern, used to persist values, and a
//! list of flexible alternatives used to make a best-effort guess at what the
//! user typed. Alternatives that can read the same text as different values
//! (`01/04/2003`: 1 April or January 4?) share an ambiguity group, so the
//! caller can tell a genuine ambiguity from a unique reading.
//!
//! Patterns are `chrono` strftime patterns. [`DateTimeFormats`] builds all of
//! them once; consumers hold on to it instead of regenerating per call.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::InternalError;

/// The calendar granularity of a date/time column.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum DateTimeType {
    YearMonthDay,
    YearMonth,
    TimeOfDay,
    DateTime,
    DateTimeZoned,
}

impl DateTimeType {
    pub const ALL: [DateTimeType; 5] = [
        DateTimeType::YearMonthDay,
        DateTimeType::YearMonth,
        DateTimeType::TimeOfDay,
        DateTimeType::DateTime,
        DateTimeType::DateTimeZoned,
    ];

    /// Keyword used in saved type declarations.
    pub fn keyword(self) -> &'static str {
        match self {
            DateTimeType::YearMonthDay => "YEARMONTHDAY",
            DateTimeType::YearMonth => "YEARMONTH",
            DateTimeType::TimeOfDay => "TIMEOFDAY",
            DateTimeType::DateTime => "DATETIME",
            DateTimeType::DateTimeZoned => "DATETIMEZONED",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<DateTimeType> {
        DateTimeType::ALL.into_iter().find(|t| t.keyword() == keyword)
    }

    pub fn has_date(self) -> bool {
        !matches!(self, DateTimeType::TimeOfDay)
    }

    pub fn has_time(self) -> bool {
        matches!(
            self,
            DateTimeType::TimeOfDay | DateTimeType::DateTime | DateTimeType::DateTimeZoned
        )
    }

    pub fn has_zone(self) -> bool {
        matches!(self, DateTimeType::DateTimeZoned)
    }

    /// The strict pattern values of this granularity are saved with.
    pub fn strict_pattern(self) -> &'static str {
        match self {
            DateTimeType::YearMonthDay => "%Y-%m-%d",
            DateTimeType::YearMonth => "%Y-%m",
            DateTimeType::TimeOfDay => "%H:%M:%S%.f",
            DateTimeType::DateTime => "%Y-%m-%d %H:%M:%S%.f",
            DateTimeType::DateTimeZoned => "%Y-%m-%d %H:%M:%S%.f %:z",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for DateTimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DateTimeType::YearMonthDay => "Date",
            DateTimeType::YearMonth => "YearMonth",
            DateTimeType::TimeOfDay => "Time",
            DateTimeType::DateTime => "DateTime",
            DateTimeType::DateTimeZoned => "DateTimeZoned",
        })
    }
}

/// Refinement metadata for date/time columns.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct DateTimeInfo {
    pub granularity: DateTimeType,
}

impl DateTimeInfo {
    pub fn new(granularity: DateTimeType) -> DateTimeInfo {
        DateTimeInfo { granularity }
    }

    pub fn same_type(&self, other: &DateTimeInfo) -> bool {
        self.granularity == other.granularity
    }

    pub fn strict_pattern(&self) -> &'static str {
        self.granularity.strict_pattern()
    }

    /// Generate the flexible alternatives for this granularity.
    pub fn flexible_formats(&self) -> Vec<FormatAlternative> {
        let mut builder = AlternativesBuilder::default();
        match self.granularity {
            DateTimeType::YearMonthDay => {
                for group in date_groups() {
                    builder.group(group);
                }
            }
            DateTimeType::YearMonth => {
                for pattern in ["%m/%Y", "%Y-%m", "%m-%Y", "%Y/%m", "%b %Y", "%b-%Y"] {
                    builder.group(vec![pattern.to_string()]);
                }
            }
            DateTimeType::TimeOfDay => {
                for pattern in TIME_PATTERNS {
                    builder.group(vec![pattern.to_string()]);
                }
            }
            DateTimeType::DateTime => {
                for group in date_time_groups() {
                    builder.group(group);
                }
            }
            DateTimeType::DateTimeZoned => {
                for group in date_time_groups() {
                    builder.group(group.into_iter().map(|p| format!("{} %:z", p)).collect());
                }
            }
        }
        builder.finish()
    }
}

impl fmt::Display for DateTimeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.granularity, f)
    }
}

const DATE_SEPARATORS: [&str; 3] = ["/", "-", "."];
const TIME_PATTERNS: [&str; 4] = ["%H:%M:%S%.f", "%H:%M", "%I:%M:%S%.f %p", "%I:%M %p"];

fn date_groups() -> Vec<Vec<String>> {
    let mut groups = Vec::new();
    for sep in DATE_SEPARATORS {
        groups.push(vec![format!("%Y{sep}%m{sep}%d")]);
        // Day-first and month-first read the same digits differently.
        groups.push(vec![format!("%d{sep}%m{sep}%Y"), format!("%m{sep}%d{sep}%Y")]);
        groups.push(vec![format!("%d{sep}%m{sep}%y"), format!("%m{sep}%d{sep}%y")]);
    }
    for pattern in ["%d %b %Y", "%b %d %Y", "%b %d, %Y", "%Y %b %d", "%d-%b-%Y"] {
        groups.push(vec![pattern.to_string()]);
    }
    groups
}

fn date_time_groups() -> Vec<Vec<String>> {
    let mut groups = Vec::new();
    for date in date_groups() {
        for time in TIME_PATTERNS {
            groups.push(date.iter().map(|d| format!("{} {}", d, time)).collect());
        }
    }
    groups.push(vec!["%Y-%m-%dT%H:%M:%S%.f".to_string()]);
    groups
}

#[derive(Default)]
struct AlternativesBuilder {
    next_group: usize,
    alternatives: Vec<FormatAlternative>,
}

impl AlternativesBuilder {
    fn group(&mut self, patterns: Vec<String>) {
        let group = self.next_group;
        self.next_group += 1;
        self.alternatives
            .extend(patterns.into_iter().map(|pattern| FormatAlternative { group, pattern }));
    }

    fn finish(self) -> Vec<FormatAlternative> {
        self.alternatives
    }
}

/// One flexible parse pattern and the ambiguity group it belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatAlternative {
    pub group: usize,
    pub pattern: String,
}

impl FormatAlternative {
    /// A `%Y` pattern only reads full years, so `01/04/03` is not year 3.
    fn admits(&self, text: &str) -> bool {
        !self.pattern.contains("%Y") || has_digit_run(text, 4)
    }
}

fn has_digit_run(text: &str, len: usize) -> bool {
    let mut run = 0;
    for ch in text.chars() {
        if ch.is_ascii_digit() {
            run += 1;
            if run >= len {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

/// A year and month without a day.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<YearMonth> {
        (1..=12).contains(&month).then_some(YearMonth { year, month })
    }

    fn from_date(date: NaiveDate) -> YearMonth {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// A value stored in a date/time column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemporalValue {
    YearMonthDay(NaiveDate),
    YearMonth(YearMonth),
    TimeOfDay(NaiveTime),
    DateTime(NaiveDateTime),
    DateTimeZoned(DateTime<FixedOffset>),
}

impl TemporalValue {
    pub fn granularity(&self) -> DateTimeType {
        match self {
            TemporalValue::YearMonthDay(_) => DateTimeType::YearMonthDay,
            TemporalValue::YearMonth(_) => DateTimeType::YearMonth,
            TemporalValue::TimeOfDay(_) => DateTimeType::TimeOfDay,
            TemporalValue::DateTime(_) => DateTimeType::DateTime,
            TemporalValue::DateTimeZoned(_) => DateTimeType::DateTimeZoned,
        }
    }
}

impl fmt::Display for TemporalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_with(self, self.granularity().strict_pattern()))
    }
}

fn format_with(value: &TemporalValue, pattern: &str) -> String {
    match value {
        TemporalValue::YearMonthDay(date) => date.format(pattern).to_string(),
        TemporalValue::YearMonth(ym) => match NaiveDate::from_ymd_opt(ym.year, ym.month, 1) {
            Some(date) => date.format(pattern).to_string(),
            None => ym.to_string(),
        },
        TemporalValue::TimeOfDay(time) => time.format(pattern).to_string(),
        TemporalValue::DateTime(dt) => dt.format(pattern).to_string(),
        TemporalValue::DateTimeZoned(dt) => dt.format(pattern).to_string(),
    }
}

fn parse_with(granularity: DateTimeType, pattern: &str, text: &str) -> Option<TemporalValue> {
    let text = text.trim();
    match granularity {
        DateTimeType::YearMonthDay => NaiveDate::parse_from_str(text, pattern)
            .ok()
            .map(TemporalValue::YearMonthDay),
        // chrono needs a day to build a date; pin it to the first.
        DateTimeType::YearMonth => {
            NaiveDate::parse_from_str(&format!("{} 1", text), &format!("{} %d", pattern))
                .ok()
                .map(|date| TemporalValue::YearMonth(YearMonth::from_date(date)))
        }
        DateTimeType::TimeOfDay => NaiveTime::parse_from_str(text, pattern)
            .ok()
            .map(TemporalValue::TimeOfDay),
        DateTimeType::DateTime => NaiveDateTime::parse_from_str(text, pattern)
            .ok()
            .map(TemporalValue::DateTime),
        DateTimeType::DateTimeZoned => DateTime::parse_from_str(text, pattern)
            .ok()
            .map(TemporalValue::DateTimeZoned),
    }
}

/// A successful flexible reading.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub group: usize,
    pub pattern: String,
    pub value: TemporalValue,
}

/// Outcome of a best-effort parse.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlexibleParse {
    Unique(TemporalValue),
    /// Several alternatives read different values. One candidate per value.
    Ambiguous(Vec<Candidate>),
    NoMatch,
}

/// Strict and flexible formats for one granularity.
#[derive(Clone, Debug)]
pub struct GranularityFormats {
    pub granularity: DateTimeType,
    pub strict: &'static str,
    pub flexible: Vec<FormatAlternative>,
}

impl GranularityFormats {
    fn new(granularity: DateTimeType) -> GranularityFormats {
        let info = DateTimeInfo::new(granularity);
        GranularityFormats {
            granularity,
            strict: info.strict_pattern(),
            flexible: info.flexible_formats(),
        }
    }

    pub fn parse_strict(&self, text: &str) -> Option<TemporalValue> {
        parse_with(self.granularity, self.strict, text)
    }

    pub fn format_strict(&self, value: &TemporalValue) -> Result<String, InternalError> {
        if value.granularity() != self.granularity {
            return Err(InternalError::wrong_kind(
                self.granularity.to_string(),
                value.granularity().to_string(),
            ));
        }
        Ok(format_with(value, self.strict))
    }

    pub fn parse_flexible(&self, text: &str) -> FlexibleParse {
        let mut candidates: Vec<Candidate> = Vec::new();
        for alternative in &self.flexible {
            if !alternative.admits(text) {
                continue;
            }
            let Some(value) = parse_with(self.granularity, &alternative.pattern, text) else {
                continue;
            };
            if candidates.iter().any(|c| c.value == value) {
                continue;
            }
            candidates.push(Candidate {
                group: alternative.group,
                pattern: alternative.pattern.clone(),
                value,
            });
        }

        match candidates.len() {
            0 => FlexibleParse::NoMatch,
            1 => FlexibleParse::Unique(candidates.remove(0).value),
            _ => FlexibleParse::Ambiguous(candidates),
        }
    }
}

/// All date/time formats, built once and shared by whoever parses or
/// formats temporal values.
#[derive(Clone, Debug)]
pub struct DateTimeFormats {
    by_granularity: Vec<GranularityFormats>,
}

impl DateTimeFormats {
    pub fn new() -> Self {
        DateTimeFormats {
            by_granularity: DateTimeType::ALL.into_iter().map(GranularityFormats::new).collect(),
        }
    }

    pub fn for_type(&self, granularity: DateTimeType) -> &GranularityFormats {
        &self.by_granularity[granularity.index()]
    }
}

impl Default for DateTimeFormats {
    fn default() -> Self {
        Self::new()
    }
}
