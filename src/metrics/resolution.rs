//! The four fixed time resolutions tracked in parallel.

use crate::core::StatsError;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const SECOND: Duration = Duration::from_secs(1);
const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(60 * 60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Bucket granularity of one periodic series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// One bucket per second
    Second,
    /// One bucket per minute
    Minute,
    /// One bucket per hour
    Hour,
    /// One bucket per day
    Day,
}

impl Resolution {
    /// All resolutions, finest first. Rotation runs in this order.
    pub const ALL: [Resolution; 4] = [
        Resolution::Second,
        Resolution::Minute,
        Resolution::Hour,
        Resolution::Day,
    ];

    /// Duration a single bucket covers
    pub fn period(self) -> Duration {
        match self {
            Resolution::Second => SECOND,
            Resolution::Minute => MINUTE,
            Resolution::Hour => HOUR,
            Resolution::Day => DAY,
        }
    }

    /// Period as a chrono delta, for arithmetic against timestamps
    pub fn period_delta(self) -> chrono::TimeDelta {
        chrono::TimeDelta::seconds(self.period().as_secs() as i64)
    }

    /// Whole periods from `earlier` to `later`, truncated toward zero.
    ///
    /// Negative when `later` precedes `earlier` by at least one period.
    pub fn periods_between(self, earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
        let span = later.signed_duration_since(earlier);
        match (span.num_nanoseconds(), self.period_delta().num_nanoseconds()) {
            (Some(span), Some(unit)) => span / unit,
            // Spans past ~292 years only need the sign to be right.
            _ if span >= chrono::TimeDelta::zero() => i64::MAX,
            _ => i64::MIN,
        }
    }

    /// Name used by the `time_unit` query parameter
    pub fn time_unit(self) -> &'static str {
        match self {
            Resolution::Second => "seconds",
            Resolution::Minute => "minutes",
            Resolution::Hour => "hours",
            Resolution::Day => "days",
        }
    }
}

impl FromStr for Resolution {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seconds" => Ok(Resolution::Second),
            "minutes" => Ok(Resolution::Minute),
            "hours" => Ok(Resolution::Hour),
            "days" => Ok(Resolution::Day),
            other => Err(StatsError::InvalidTimeUnit(other.to_string())),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.time_unit())
    }
}
