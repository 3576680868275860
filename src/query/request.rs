//! Validation of raw history query parameters.

use crate::core::{Result, StatsError};
use crate::metrics::resolution::Resolution;
use chrono::{DateTime, Utc};

/// A validated `/stats_history` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub resolution: Resolution,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl HistoryRequest {
    /// Parse parameters in order: `time_unit`, `start_time`, `end_time`.
    /// The first invalid one is reported.
    pub fn parse(
        time_unit: Option<&str>,
        start_time: Option<&str>,
        end_time: Option<&str>,
    ) -> Result<Self> {
        let resolution = time_unit.unwrap_or_default().parse::<Resolution>()?;
        let start_time = parse_timestamp("start_time", start_time)?;
        let end_time = parse_timestamp("end_time", end_time)?;

        Ok(Self {
            resolution,
            start_time,
            end_time,
        })
    }
}

fn parse_timestamp(param: &'static str, raw: Option<&str>) -> Result<DateTime<Utc>> {
    let raw = raw.unwrap_or_default();
    DateTime::parse_from_rfc3339(raw)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|e| StatsError::invalid_timestamp(param, format!("'{raw}': {e}")))
}
