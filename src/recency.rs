use std::cmp::Reverse;
use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::config::AnalyzerConfig;
use crate::dates;
use crate::error::Result;
use crate::models::{Analysis, DatedVisit, Priority, SiteStatus, SummaryStatistics, VisitRecord};

/// Sites unvisited for longer than this need a visit.
pub const VISIT_THRESHOLD_DAYS: i64 = 180;
pub const MEDIUM_THRESHOLD_DAYS: i64 = 120;

pub fn classify_priority(days: i64) -> Priority {
    match days {
        d if d > VISIT_THRESHOLD_DAYS => Priority::High,
        d if d > MEDIUM_THRESHOLD_DAYS => Priority::Medium,
        _ => Priority::Low,
    }
}

pub fn days_since(today: NaiveDate, last_visit: NaiveDate) -> i64 {
    (today - last_visit).num_days()
}

/// Most recent visit per target site. Sites without a dated record are absent.
pub fn latest_visits<'a>(
    visits: &'a [DatedVisit],
    config: &AnalyzerConfig,
) -> HashMap<&'a str, NaiveDate> {
    let mut latest: HashMap<&str, NaiveDate> = HashMap::new();

    for visit in visits {
        let Some(date) = visit.date else {
            continue;
        };
        if !config.is_target(&visit.site) {
            continue;
        }

        let entry = latest.entry(visit.site.as_str()).or_insert(date);
        if date > *entry {
            *entry = date;
        }
    }

    latest
}

pub fn site_status(site: &str, last_visit: Option<NaiveDate>, today: NaiveDate) -> SiteStatus {
    match last_visit {
        Some(date) => {
            let days = days_since(today, date);
            SiteStatus {
                site: site.to_string(),
                last_visit: Some(date),
                days_since_visit: Some(days),
                priority: classify_priority(days),
                visit_required: days > VISIT_THRESHOLD_DAYS,
            }
        }
        None => SiteStatus {
            site: site.to_string(),
            last_visit: None,
            days_since_visit: None,
            priority: Priority::High,
            visit_required: true,
        },
    }
}

/// Orders by tier, then most overdue first. Sites without data outrank any day count.
pub fn sort_statuses(statuses: &mut [SiteStatus]) {
    statuses.sort_by_key(|status| {
        (
            status.priority.rank(),
            Reverse(status.days_or_sentinel(i64::MAX)),
        )
    });
}

pub fn summarize(statuses: &[SiteStatus]) -> SummaryStatistics {
    let count_tier = |tier: Priority| statuses.iter().filter(|s| s.priority == tier).count();
    let known_days: Vec<i64> = statuses.iter().filter_map(|s| s.days_since_visit).collect();
    let sites_requiring_visit = statuses.iter().filter(|s| s.visit_required).count();

    SummaryStatistics {
        total_sites: statuses.len(),
        sites_requiring_visit,
        sites_ok: statuses.len() - sites_requiring_visit,
        high_priority: count_tier(Priority::High),
        medium_priority: count_tier(Priority::Medium),
        low_priority: count_tier(Priority::Low),
        average_days: mean(&known_days),
        maximum_days: known_days.iter().copied().max(),
        sites_without_data: statuses.len() - known_days.len(),
    }
}

pub fn mean(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<i64>() as f64 / values.len() as f64)
    }
}

/// Runs the whole pipeline: normalize dates, keep target sites, take the latest visit per
/// site, classify, backfill sites without records, sort and summarize.
pub fn analyze(
    records: &[VisitRecord],
    config: &AnalyzerConfig,
    today: NaiveDate,
) -> Result<Analysis> {
    let (visits, date_format) = dates::normalize_batch(records)?;

    let known: Vec<NaiveDate> = visits.iter().filter_map(|v| v.date).collect();
    if let (Some(first), Some(last)) = (known.iter().min(), known.iter().max()) {
        info!(%date_format, %first, %last, "dates normalized");
    }

    let target_records = visits.iter().filter(|v| config.is_target(&v.site)).count();
    info!(target_records, "records matched target sites");

    let latest = latest_visits(&visits, config);
    let mut statuses: Vec<SiteStatus> = config
        .target_sites()
        .iter()
        .map(|site| site_status(site, latest.get(site.as_str()).copied(), today))
        .collect();

    let missing: Vec<&str> = statuses
        .iter()
        .filter(|s| !s.has_data())
        .map(|s| s.site.as_str())
        .collect();
    if !missing.is_empty() {
        warn!(sites = ?missing, "target sites with no visit records");
    }

    sort_statuses(&mut statuses);
    let summary = summarize(&statuses);

    Ok(Analysis {
        statuses,
        summary,
        date_format,
    })
}
