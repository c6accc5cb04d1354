use std::fmt::Write;

use crate::models::{Analysis, MetricValue, Priority, PriorityBreakdown, SiteStatus};
use crate::recency;

const RULE_WIDTH: usize = 60;

/// Groups the sorted statuses by tier. Tiers with no sites are left out.
pub fn priority_breakdown(statuses: &[SiteStatus]) -> Vec<PriorityBreakdown> {
    Priority::ALL
        .iter()
        .filter_map(|tier| {
            let members: Vec<&SiteStatus> =
                statuses.iter().filter(|s| s.priority == *tier).collect();
            if members.is_empty() {
                return None;
            }

            let known: Vec<i64> = members.iter().filter_map(|s| s.days_since_visit).collect();
            let avg_days = recency::mean(&known)
                .map(|avg| (avg * 10.0).round() / 10.0)
                .unwrap_or(0.0);

            Some(PriorityBreakdown {
                priority: *tier,
                sites: members.iter().map(|s| s.site.clone()).collect(),
                count: members.len(),
                avg_days,
            })
        })
        .collect()
}

pub fn format_metric(value: &MetricValue) -> String {
    match value {
        MetricValue::Count(count) => count.to_string(),
        MetricValue::Days(days) => days.to_string(),
        MetricValue::Average(avg) => format!("{avg:.1}"),
        MetricValue::Missing => "No Data".to_string(),
    }
}

fn tier_heading(tier: Priority) -> &'static str {
    match tier {
        Priority::High => "HIGH PRIORITY SITES (>180 days):",
        Priority::Medium => "MEDIUM PRIORITY SITES (120-180 days):",
        Priority::Low => "LOW PRIORITY SITES (<120 days):",
    }
}

/// Human-readable run summary: the metrics, then each tier's sites.
pub fn console_summary(analysis: &Analysis) -> String {
    let mut output = String::new();
    let rule = "=".repeat(RULE_WIDTH);

    let _ = writeln!(output);
    let _ = writeln!(output, "{rule}");
    let _ = writeln!(output, "SITE VISIT ANALYSIS SUMMARY");
    let _ = writeln!(output, "{rule}");

    for (label, value) in analysis.summary.metrics() {
        let _ = writeln!(output, "{}: {}", label, format_metric(&value));
    }

    for tier in Priority::ALL {
        let _ = writeln!(output);
        let _ = writeln!(output, "{}", tier_heading(tier));
        for status in analysis.statuses.iter().filter(|s| s.priority == tier) {
            match status.days_since_visit {
                Some(days) => {
                    let _ = writeln!(output, "   {}: {} days", status.site, days);
                }
                None => {
                    let _ = writeln!(output, "   {}: No data", status.site);
                }
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use crate::models::VisitRecord;
    use chrono::NaiveDate;

    fn sample_analysis() -> Analysis {
        let records = vec![
            VisitRecord::new("NANT", "2024-07-02"),
            VisitRecord::new("BLCK", "2024-03-01"),
            VisitRecord::new("HOOK", "2024-01-01"),
            VisitRecord::new("WOOD", "2023-12-01"),
        ];
        let config = AnalyzerConfig::with_sites(["NANT", "BLCK", "HOOK", "WOOD", "AMAG"]).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
        recency::analyze(&records, &config, today).unwrap()
    }

    #[test]
    fn breakdown_follows_tier_order_and_skips_empty_tiers() {
        let analysis = sample_analysis();
        let breakdown = priority_breakdown(&analysis.statuses);

        let tiers: Vec<Priority> = breakdown.iter().map(|b| b.priority).collect();
        assert_eq!(tiers, vec![Priority::High, Priority::Medium, Priority::Low]);

        let high = &breakdown[0];
        assert_eq!(high.sites, vec!["AMAG", "WOOD", "HOOK"]);
        assert_eq!(high.count, 3);
        // (244 + 213) / 2, the no-data site excluded
        assert_eq!(high.avg_days, 228.5);
    }

    #[test]
    fn breakdown_average_is_zero_without_data() {
        let config = AnalyzerConfig::with_sites(["AMAG"]).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
        let analysis = recency::analyze(&[], &config, today).unwrap();
        let breakdown = priority_breakdown(&analysis.statuses);
        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[0].avg_days, 0.0);
    }

    #[test]
    fn breakdown_average_rounds_to_one_decimal() {
        let records = vec![
            VisitRecord::new("NANT", "2024-07-31"),
            VisitRecord::new("BLCK", "2024-07-30"),
            VisitRecord::new("HOOK", "2024-07-30"),
        ];
        let config = AnalyzerConfig::with_sites(["NANT", "BLCK", "HOOK"]).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
        let analysis = recency::analyze(&records, &config, today).unwrap();
        let breakdown = priority_breakdown(&analysis.statuses);
        assert_eq!(breakdown[0].avg_days, 1.7);
    }

    #[test]
    fn console_summary_lists_metrics_and_sites() {
        let text = console_summary(&sample_analysis());
        assert!(text.contains("SITE VISIT ANALYSIS SUMMARY"));
        assert!(text.contains("Total Target Sites: 5"));
        assert!(text.contains("Sites with No Data: 1"));
        assert!(text.contains("   AMAG: No data"));
        assert!(text.contains("   NANT: 30 days"));
        assert!(text.contains("MEDIUM PRIORITY SITES (120-180 days):\n   BLCK: 153 days"));
    }

    #[test]
    fn missing_metrics_render_as_no_data() {
        assert_eq!(format_metric(&MetricValue::Missing), "No Data");
        assert_eq!(format_metric(&MetricValue::Average(121.24)), "121.2");
        assert_eq!(format_metric(&MetricValue::Count(4)), "4");
    }
}
