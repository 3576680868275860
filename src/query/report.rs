//! Dashboard reports assembled from bucketed series.

use crate::core::Result;
use crate::metrics::periodic::{count_key, sum_key, PeriodicStats};
use crate::metrics::resolution::Resolution;
use crate::metrics::statistics::{names, Statistics};
use crate::query::range::{extract_range, history_range, BucketRange};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Hourly buckets folded into the summary.
pub const SUMMARY_PERIODS: usize = 24;

/// Label reported alongside the summary.
pub const SUMMARY_PERIOD_LABEL: &str = "24 hours";

/// Per-bucket series, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistoryReport {
    pub dns_queries: Vec<f64>,
    pub blocked_filtering: Vec<f64>,
    pub replaced_safebrowsing: Vec<f64>,
    pub replaced_safesearch: Vec<f64>,
    pub replaced_parental: Vec<f64>,
    /// Milliseconds
    pub avg_processing_time: Vec<f64>,
}

/// Scalar totals over the last [`SUMMARY_PERIODS`] hours.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSummary {
    pub dns_queries: f64,
    pub blocked_filtering: f64,
    pub replaced_safebrowsing: f64,
    pub replaced_safesearch: f64,
    pub replaced_parental: f64,
    /// Milliseconds
    pub avg_processing_time: f64,
    pub stats_period: &'static str,
}

impl HistoryReport {
    /// Buckets per series
    pub fn len(&self) -> usize {
        self.dns_queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dns_queries.is_empty()
    }
}

/// Collect every dashboard series over `range` of one resolution.
///
/// All series are read under a single lock acquisition.
pub fn build_report(series: &PeriodicStats, range: BucketRange) -> HistoryReport {
    let count_name = count_key(names::REQUEST_DURATION);
    let sum_name = sum_key(names::REQUEST_DURATION);

    series.read(|reader| {
        let extract = |name: &str| extract_range(reader.buckets(name), range);

        let count = extract(count_name.as_str());
        let sum = extract(sum_name.as_str());
        let avg_processing_time = count
            .iter()
            .zip(&sum)
            .map(|(count, sum)| average_millis(*sum, *count))
            .collect();

        HistoryReport {
            dns_queries: extract(names::REQUESTS),
            blocked_filtering: extract(names::FILTERED),
            replaced_safebrowsing: extract(names::FILTERED_SAFEBROWSING),
            replaced_safesearch: extract(names::SAFESEARCH),
            replaced_parental: extract(names::FILTERED_PARENTAL),
            avg_processing_time,
        }
    })
}

fn total(values: &[f64]) -> f64 {
    values.iter().sum()
}

fn average_millis(sum: f64, count: f64) -> f64 {
    if count == 0.0 {
        0.0
    } else {
        sum / count * 1000.0
    }
}

/// Totals over the last day of hourly buckets.
///
/// The latency figure is the sum of per-bucket averages divided by
/// [`SUMMARY_PERIODS`], regardless of how many buckets saw traffic.
pub fn summary(stats: &Statistics) -> StatsSummary {
    let report = build_report(
        stats.series(Resolution::Hour),
        BucketRange {
            start: 0,
            end: SUMMARY_PERIODS,
        },
    );
    StatsSummary {
        dns_queries: total(&report.dns_queries),
        blocked_filtering: total(&report.blocked_filtering),
        replaced_safebrowsing: total(&report.replaced_safebrowsing),
        replaced_safesearch: total(&report.replaced_safesearch),
        replaced_parental: total(&report.replaced_parental),
        avg_processing_time: total(&report.avg_processing_time) / SUMMARY_PERIODS as f64,
        stats_period: SUMMARY_PERIOD_LABEL,
    }
}

/// Series of `resolution` between two wall-clock instants.
pub fn history(
    stats: &Statistics,
    resolution: Resolution,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<HistoryReport> {
    let range = history_range(resolution, start_time, end_time, now)?;
    Ok(build_report(stats.series(resolution), range))
}
