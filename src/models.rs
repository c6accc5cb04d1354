use chrono::NaiveDate;
use serde::Serialize;

use crate::dates::DateFormat;

/// Raw row from a record source; the date is still text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitRecord {
    pub site: String,
    pub date: String,
}

impl VisitRecord {
    pub fn new(site: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            date: date.into(),
        }
    }
}

/// A visit record after date normalization. Blank dates stay `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatedVisit {
    pub site: String,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteStatus {
    pub site: String,
    pub last_visit: Option<NaiveDate>,
    pub days_since_visit: Option<i64>,
    pub priority: Priority,
    pub visit_required: bool,
}

impl SiteStatus {
    /// Days since the last visit, or `sentinel` when the site has no records.
    pub fn days_or_sentinel(&self, sentinel: i64) -> i64 {
        self.days_since_visit.unwrap_or(sentinel)
    }

    pub fn has_data(&self) -> bool {
        self.days_since_visit.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub total_sites: usize,
    pub sites_requiring_visit: usize,
    pub sites_ok: usize,
    pub high_priority: usize,
    pub medium_priority: usize,
    pub low_priority: usize,
    pub average_days: Option<f64>,
    pub maximum_days: Option<i64>,
    pub sites_without_data: usize,
}

/// Display value for one summary metric.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Count(usize),
    Days(i64),
    Average(f64),
    Missing,
}

impl SummaryStatistics {
    /// Flattened `(label, value)` pairs in report order.
    pub fn metrics(&self) -> Vec<(&'static str, MetricValue)> {
        vec![
            ("Total Target Sites", MetricValue::Count(self.total_sites)),
            (
                "Sites Requiring Visit (>180 days)",
                MetricValue::Count(self.sites_requiring_visit),
            ),
            ("Sites OK (≤180 days)", MetricValue::Count(self.sites_ok)),
            (
                "High Priority (>180 days)",
                MetricValue::Count(self.high_priority),
            ),
            (
                "Medium Priority (120-180 days)",
                MetricValue::Count(self.medium_priority),
            ),
            (
                "Low Priority (<120 days)",
                MetricValue::Count(self.low_priority),
            ),
            (
                "Average Days Since Visit",
                self.average_days
                    .map(MetricValue::Average)
                    .unwrap_or(MetricValue::Missing),
            ),
            (
                "Maximum Days Since Visit",
                self.maximum_days
                    .map(MetricValue::Days)
                    .unwrap_or(MetricValue::Missing),
            ),
            (
                "Sites with No Data",
                MetricValue::Count(self.sites_without_data),
            ),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityBreakdown {
    pub priority: Priority,
    pub sites: Vec<String>,
    pub count: usize,
    pub avg_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub statuses: Vec<SiteStatus>,
    pub summary: SummaryStatistics,
    pub date_format: DateFormat,
}
