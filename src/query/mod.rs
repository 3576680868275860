//! Query engine over the bucketed series.
//!
//! Turns wall-clock windows into bucket indices and assembles the
//! dashboard summary and history reports.

pub mod range;
pub mod report;
pub mod request;

pub use range::{extract_range, history_range, BucketRange};
pub use report::{
    build_report, history, summary, HistoryReport, StatsSummary, SUMMARY_PERIODS,
    SUMMARY_PERIOD_LABEL,
};
pub use request::HistoryRequest;
