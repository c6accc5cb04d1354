use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{AnalyzerError, RejectedRow, Result};
use crate::models::{DatedVisit, VisitRecord};

const MAX_REPORTED_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Layout {
    Date(&'static str),
    DateTime(&'static str),
    Rfc3339,
}

// Two-digit years come before four-digit ones so `01/01/24` lands in 2024.
const KNOWN_LAYOUTS: [Layout; 9] = [
    Layout::Date("%Y-%m-%d"),
    Layout::DateTime("%Y-%m-%d %H:%M:%S"),
    Layout::Rfc3339,
    Layout::Date("%m/%d/%y"),
    Layout::Date("%m/%d/%Y"),
    Layout::Date("%Y/%m/%d"),
    Layout::Date("%d-%b-%Y"),
    Layout::Date("%b %d, %Y"),
    Layout::Date("%B %d, %Y"),
];

// Only considered when a whole batch is inferred from its first value; day-first
// layouts would shadow the US ones if `Mixed` tried them per value.
const INFERRED_ONLY_LAYOUTS: [Layout; 5] = [
    Layout::Date("%d/%m/%y"),
    Layout::Date("%d/%m/%Y"),
    Layout::Date("%d.%m.%Y"),
    Layout::Date("%d %B %Y"),
    Layout::Date("%Y.%m.%d"),
];

impl Layout {
    pub fn parse(self, value: &str) -> Option<NaiveDate> {
        let date = match self {
            Layout::Date(fmt) => NaiveDate::parse_from_str(value, fmt).ok()?,
            Layout::DateTime(fmt) => NaiveDateTime::parse_from_str(value, fmt).ok()?.date(),
            Layout::Rfc3339 => DateTime::parse_from_rfc3339(value).ok()?.date_naive(),
        };

        // %Y happily reads "24" as year 24.
        if self.wants_full_year() && date.year() < 1000 {
            return None;
        }
        Some(date)
    }

    fn wants_full_year(self) -> bool {
        match self {
            Layout::Date(fmt) | Layout::DateTime(fmt) => fmt.contains("%Y"),
            Layout::Rfc3339 => true,
        }
    }
}

impl std::fmt::Display for Layout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Layout::Date(fmt) | Layout::DateTime(fmt) => f.write_str(fmt),
            Layout::Rfc3339 => f.write_str("rfc3339"),
        }
    }
}

/// Strategy that normalized a batch of date strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DateFormat {
    /// Each value matched independently against every known layout.
    Mixed,
    /// `%m/%d/%y` for every value, with `-` or `.` accepted as separators.
    ShortUs,
    /// `%m/%d/%Y` for every value, with `-` or `.` accepted as separators.
    LongUs,
    /// The layout of the first non-blank value, applied to every value.
    Inferred(Layout),
}

impl std::fmt::Display for DateFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateFormat::Mixed => f.write_str("mixed"),
            DateFormat::ShortUs => f.write_str("%m/%d/%y"),
            DateFormat::LongUs => f.write_str("%m/%d/%Y"),
            DateFormat::Inferred(layout) => write!(f, "inferred {layout}"),
        }
    }
}

impl DateFormat {
    fn parse(self, value: &str) -> Option<NaiveDate> {
        match self {
            DateFormat::Mixed => parse_any(value).map(|(date, _)| date),
            DateFormat::ShortUs => Layout::Date("%m/%d/%y").parse(&slashed(value)),
            DateFormat::LongUs => Layout::Date("%m/%d/%Y").parse(&slashed(value)),
            DateFormat::Inferred(layout) => layout.parse(value),
        }
    }
}

fn parse_any(value: &str) -> Option<(NaiveDate, Layout)> {
    KNOWN_LAYOUTS
        .iter()
        .find_map(|layout| layout.parse(value).map(|date| (date, *layout)))
}

fn slashed(value: &str) -> String {
    value.replace(['-', '.'], "/")
}

fn try_format(
    format: DateFormat,
    records: &[VisitRecord],
) -> std::result::Result<Vec<Option<NaiveDate>>, Vec<RejectedRow>> {
    let mut dates = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();

    for (idx, record) in records.iter().enumerate() {
        let value = record.date.trim();
        if value.is_empty() {
            dates.push(None);
            continue;
        }
        match format.parse(value) {
            Some(date) => dates.push(Some(date)),
            None => rejected.push(RejectedRow {
                row: idx + 1,
                value: record.date.clone(),
            }),
        }
    }

    if rejected.is_empty() {
        Ok(dates)
    } else {
        Err(rejected)
    }
}

fn infer_format(records: &[VisitRecord]) -> Option<DateFormat> {
    let first = records
        .iter()
        .map(|record| record.date.trim())
        .find(|value| !value.is_empty())?;
    KNOWN_LAYOUTS
        .iter()
        .chain(INFERRED_ONLY_LAYOUTS.iter())
        .find(|layout| layout.parse(first).is_some())
        .map(|layout| DateFormat::Inferred(*layout))
}

/// Parses every record's date with the first strategy that accepts the whole batch.
///
/// Strategies are tried in order: mixed, `%m/%d/%y`, `%m/%d/%Y` (both tolerant of `-`
/// and `.` separators), then the layout inferred from the first non-blank value, which
/// may be a day-first layout. A single bad row fails a strategy for the entire batch.
pub fn normalize_batch(records: &[VisitRecord]) -> Result<(Vec<DatedVisit>, DateFormat)> {
    let mut attempted = Vec::new();
    let mut unreadable = Vec::new();

    let mut candidates = vec![DateFormat::Mixed, DateFormat::ShortUs, DateFormat::LongUs];
    if let Some(inferred) = infer_format(records) {
        candidates.push(inferred);
    }

    for format in candidates {
        attempted.push(format.to_string());
        match try_format(format, records) {
            Ok(dates) => {
                debug!(%format, rows = records.len(), "date strategy accepted batch");
                let visits = records
                    .iter()
                    .zip(dates)
                    .map(|(record, date)| DatedVisit {
                        site: record.site.trim().to_string(),
                        date,
                    })
                    .collect();
                return Ok((visits, format));
            }
            Err(rejected) => {
                debug!(%format, rejected = rejected.len(), "date strategy rejected batch");
                if format == DateFormat::Mixed {
                    unreadable = rejected;
                }
            }
        }
    }

    warn!(rows = unreadable.len(), "no date strategy accepted the batch");
    unreadable.truncate(MAX_REPORTED_ROWS);
    Err(AnalyzerError::Parse {
        attempted,
        rows: unreadable,
    })
}
