//! Bucketed time series, one set per resolution.
//!
//! Every metric name maps to a fixed array of [`HISTORY_ELEMENTS`]
//! accumulators. Index 0 is the current, still-open period; index `k` is
//! "`k` periods before the last rotation". Rotation is lazy: buckets are only
//! shifted when [`PeriodicStats::rotate`] observes that whole periods have
//! passed since the previous rotation.

use crate::metrics::resolution::Resolution;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;

/// Buckets exposed for reporting.
pub const REPORT_BUCKETS: usize = 60;

/// Buckets stored per metric, one past the reporting window so a consumer
/// can compute a delta for the oldest reported bucket.
pub const HISTORY_ELEMENTS: usize = REPORT_BUCKETS + 1;

/// Highest addressable bucket index.
pub const MAX_INDEX: usize = HISTORY_ELEMENTS - 1;

/// Accumulators for one metric, most recent first.
pub type Buckets = [f64; HISTORY_ELEMENTS];

const EMPTY: Buckets = [0.0; HISTORY_ELEMENTS];

/// Series key holding the sample count of an observed metric.
pub fn count_key(name: &str) -> String {
    format!("{name}_count")
}

/// Series key holding the sample sum of an observed metric.
pub fn sum_key(name: &str) -> String {
    format!("{name}_sum")
}

struct Entries {
    values: HashMap<String, Buckets>,
    last_rotate: DateTime<Utc>,
}

impl Entries {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            values: HashMap::new(),
            last_rotate: now,
        }
    }

    fn slot(&mut self, name: &str) -> &mut Buckets {
        self.values.entry(name.to_string()).or_insert(EMPTY)
    }
}

/// Read-only view of one series, valid while its lock is held.
pub struct SeriesReader<'a> {
    entries: &'a Entries,
}

impl SeriesReader<'_> {
    /// Buckets for `name`, all-zero when the metric was never recorded
    pub fn buckets(&self, name: &str) -> &Buckets {
        self.entries.values.get(name).unwrap_or(&EMPTY)
    }

    /// Time of the last rotation that shifted buckets
    pub fn last_rotate(&self) -> DateTime<Utc> {
        self.entries.last_rotate
    }
}

/// Ring of per-period accumulators for a single resolution.
pub struct PeriodicStats {
    resolution: Resolution,
    state: RwLock<Entries>,
}

impl PeriodicStats {
    /// Create an empty series whose rotation clock starts at `now`
    pub fn new(resolution: Resolution, now: DateTime<Utc>) -> Self {
        Self {
            resolution,
            state: RwLock::new(Entries::new(now)),
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn period(&self) -> Duration {
        self.resolution.period()
    }

    pub fn last_rotate(&self) -> DateTime<Utc> {
        self.state.read().last_rotate
    }

    /// Bucket an event at `when` falls into, or `None` when it is outside
    /// the retained history.
    fn bucket_index(&self, when: DateTime<Utc>, now: DateTime<Utc>) -> Option<usize> {
        let elapsed = self.resolution.periods_between(when, now);
        usize::try_from(elapsed)
            .ok()
            .filter(|index| *index < HISTORY_ELEMENTS)
    }

    /// Count one event for `name`.
    ///
    /// Events older than the retained history are dropped silently.
    pub fn inc(&self, name: &str, when: DateTime<Utc>, now: DateTime<Utc>) {
        let Some(index) = self.bucket_index(when, now) else {
            return;
        };
        let mut state = self.state.write();
        state.slot(name)[index] += 1.0;
    }

    /// Record one sample of `value` under `<name>_count` and `<name>_sum`.
    ///
    /// Both series change under a single lock acquisition.
    pub fn observe(&self, name: &str, when: DateTime<Utc>, value: f64, now: DateTime<Utc>) {
        let Some(index) = self.bucket_index(when, now) else {
            return;
        };
        let count = count_key(name);
        let sum = sum_key(name);

        let mut state = self.state.write();
        state.slot(&count)[index] += 1.0;
        state.slot(&sum)[index] += value;
    }

    /// Shift every series by the number of whole periods since the last
    /// rotation. Returns the number of slots shifted.
    pub fn rotate(&self, now: DateTime<Utc>) -> usize {
        let mut state = self.state.write();
        let rotations = self.resolution.periods_between(state.last_rotate, now);
        if rotations <= 0 {
            return 0;
        }

        let shift = usize::try_from(rotations).map_or(HISTORY_ELEMENTS, |r| r.min(HISTORY_ELEMENTS));
        for values in state.values.values_mut() {
            shift_buckets(values, shift);
        }
        state.last_rotate = now;
        shift
    }

    /// Drop every series and restart the rotation clock at `now`.
    pub fn reset(&self, now: DateTime<Utc>) {
        *self.state.write() = Entries::new(now);
    }

    /// Copy of the buckets for `name`
    pub fn buckets(&self, name: &str) -> Buckets {
        *self.state.read().values.get(name).unwrap_or(&EMPTY)
    }

    /// Run `f` against a consistent view of all series.
    pub fn read<R>(&self, f: impl FnOnce(&SeriesReader<'_>) -> R) -> R {
        let state = self.state.read();
        f(&SeriesReader { entries: &state })
    }

    /// Number of metric names with buckets allocated
    pub fn len(&self) -> usize {
        self.state.read().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Move values `shift` slots toward the past, zero-filling the new slots.
/// Values pushed past the last slot are discarded.
fn shift_buckets(values: &mut Buckets, shift: usize) {
    if shift >= HISTORY_ELEMENTS {
        values.fill(0.0);
        return;
    }
    values.copy_within(..HISTORY_ELEMENTS - shift, shift);
    values[..shift].fill(0.0);
}

/// The four resolutions, each behind its own lock.
pub struct StatsWindows {
    second: PeriodicStats,
    minute: PeriodicStats,
    hour: PeriodicStats,
    day: PeriodicStats,
}

impl StatsWindows {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            second: PeriodicStats::new(Resolution::Second, now),
            minute: PeriodicStats::new(Resolution::Minute, now),
            hour: PeriodicStats::new(Resolution::Hour, now),
            day: PeriodicStats::new(Resolution::Day, now),
        }
    }

    /// Series for one resolution
    pub fn get(&self, resolution: Resolution) -> &PeriodicStats {
        match resolution {
            Resolution::Second => &self.second,
            Resolution::Minute => &self.minute,
            Resolution::Hour => &self.hour,
            Resolution::Day => &self.day,
        }
    }

    /// Series finest first
    pub fn iter(&self) -> impl Iterator<Item = &PeriodicStats> {
        Resolution::ALL.into_iter().map(move |resolution| self.get(resolution))
    }

    pub fn inc(&self, name: &str, when: DateTime<Utc>, now: DateTime<Utc>) {
        for series in self.iter() {
            series.inc(name, when, now);
        }
    }

    pub fn observe(&self, name: &str, when: DateTime<Utc>, value: f64, now: DateTime<Utc>) {
        for series in self.iter() {
            series.observe(name, when, value, now);
        }
    }

    /// Rotate all four series against the same instant.
    pub fn rotate(&self, now: DateTime<Utc>) {
        for series in self.iter() {
            let shifted = series.rotate(now);
            if shifted > 0 {
                tracing::trace!(resolution = %series.resolution(), shifted, "Rotated stats buckets");
            }
        }
    }

    pub fn reset(&self, now: DateTime<Utc>) {
        for series in self.iter() {
            series.reset(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn secs(n: i64) -> TimeDelta {
        TimeDelta::seconds(n)
    }

    #[test]
    fn test_increment_then_rotate_once() {
        let now = Utc::now();
        let series = PeriodicStats::new(Resolution::Second, now);

        for _ in 0..5 {
            series.inc("requests_total", now, now);
        }
        assert_eq!(series.buckets("requests_total")[0], 5.0);

        assert_eq!(series.rotate(now + secs(1)), 1);
        let buckets = series.buckets("requests_total");
        assert_eq!(buckets[0], 0.0);
        assert_eq!(buckets[1], 5.0);
        assert_eq!(series.last_rotate(), now + secs(1));
    }

    #[test]
    fn test_rotation_between_periods_is_noop() {
        let now = Utc::now();
        let series = PeriodicStats::new(Resolution::Minute, now);
        series.inc("requests_total", now, now);

        assert_eq!(series.rotate(now), 0);
        assert_eq!(series.rotate(now + secs(59)), 0);
        assert_eq!(series.last_rotate(), now);
        assert_eq!(series.buckets("requests_total")[0], 1.0);

        // Clock stepping backwards shifts nothing either.
        assert_eq!(series.rotate(now - secs(600)), 0);
        assert_eq!(series.last_rotate(), now);
    }

    #[test]
    fn test_rotation_depends_on_elapsed_time_not_calls() {
        let now = Utc::now();
        let stepped = PeriodicStats::new(Resolution::Second, now);
        let jumped = PeriodicStats::new(Resolution::Second, now);

        for series in [&stepped, &jumped] {
            for back in 0..10 {
                series.inc("filtered_total", now - secs(back), now);
            }
            series.observe("request_duration", now, 0.1, now);
        }

        for step in 1..=7 {
            stepped.rotate(now + secs(step));
        }
        jumped.rotate(now + secs(7));

        for name in ["filtered_total", "request_duration_count", "request_duration_sum"] {
            assert_eq!(stepped.buckets(name), jumped.buckets(name));
        }
        assert_eq!(jumped.buckets("filtered_total")[7], 1.0);
        assert_eq!(jumped.buckets("filtered_total")[16], 1.0);
        assert_eq!(jumped.buckets("filtered_total")[17], 0.0);
    }

    #[test]
    fn test_rotation_clamps_to_buffer_size() {
        let now = Utc::now();
        let series = PeriodicStats::new(Resolution::Second, now);
        for back in 0..HISTORY_ELEMENTS as i64 {
            series.inc("requests_total", now - secs(back), now);
        }
        assert!(series.buckets("requests_total").iter().all(|v| *v == 1.0));

        assert_eq!(series.rotate(now + secs(10_000)), HISTORY_ELEMENTS);
        assert_eq!(series.buckets("requests_total"), EMPTY);
        assert_eq!(series.last_rotate(), now + secs(10_000));
    }

    #[test]
    fn test_tail_is_discarded_on_rotation() {
        let now = Utc::now();
        let series = PeriodicStats::new(Resolution::Second, now);
        series.inc("requests_total", now - secs(MAX_INDEX as i64), now);
        assert_eq!(series.buckets("requests_total")[MAX_INDEX], 1.0);

        series.rotate(now + secs(1));
        assert_eq!(series.buckets("requests_total"), EMPTY);
    }

    #[test]
    fn test_out_of_range_events_are_dropped() {
        let now = Utc::now();
        let series = PeriodicStats::new(Resolution::Hour, now);

        series.inc("requests_total", now - TimeDelta::hours(61), now);
        series.observe("request_duration", now - TimeDelta::hours(100), 1.0, now);
        // A full period in the future has no bucket either.
        series.inc("requests_total", now + TimeDelta::hours(2), now);
        assert!(series.is_empty());

        series.inc("requests_total", now - TimeDelta::hours(60), now);
        assert_eq!(series.buckets("requests_total")[60], 1.0);
    }

    #[test]
    fn test_observe_updates_count_and_sum_together() {
        let now = Utc::now();
        let series = PeriodicStats::new(Resolution::Second, now);

        series.observe("latency", now, 0.2, now);
        series.observe("latency", now, 0.4, now);
        series.observe("latency", now - secs(3), 1.5, now);

        let count = series.buckets("latency_count");
        let sum = series.buckets("latency_sum");
        assert_eq!(count[0], 2.0);
        assert!((sum[0] - 0.6).abs() < 1e-12);
        assert_eq!(count[3], 1.0);
        assert_eq!(sum[3], 1.5);
        for index in 0..HISTORY_ELEMENTS {
            assert_eq!(count[index] == 0.0, sum[index] == 0.0);
        }
        assert!(series.buckets("latency").iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_reset_keeps_period() {
        let now = Utc::now();
        let series = PeriodicStats::new(Resolution::Day, now);
        series.inc("requests_total", now, now);

        let later = now + TimeDelta::hours(5);
        series.reset(later);
        assert!(series.is_empty());
        assert_eq!(series.last_rotate(), later);
        assert_eq!(series.period(), Duration::from_secs(86_400));
    }

    #[test]
    fn test_reader_sees_missing_names_as_zero() {
        let now = Utc::now();
        let series = PeriodicStats::new(Resolution::Minute, now);
        series.inc("requests_total", now, now);

        series.read(|reader| {
            assert_eq!(reader.buckets("requests_total")[0], 1.0);
            assert_eq!(reader.buckets("never_seen"), &EMPTY);
            assert_eq!(reader.last_rotate(), now);
        });
    }

    #[test]
    fn test_windows_fan_out() {
        let now = Utc::now();
        let windows = StatsWindows::new(now);

        windows.inc("requests_total", now - secs(90), now);
        assert_eq!(windows.get(Resolution::Second).len(), 0);
        assert_eq!(windows.get(Resolution::Minute).buckets("requests_total")[1], 1.0);
        assert_eq!(windows.get(Resolution::Hour).buckets("requests_total")[0], 1.0);
        assert_eq!(windows.get(Resolution::Day).buckets("requests_total")[0], 1.0);

        windows.rotate(now + secs(60));
        assert_eq!(windows.get(Resolution::Minute).buckets("requests_total")[2], 1.0);
        assert_eq!(windows.get(Resolution::Hour).last_rotate(), now);

        windows.reset(now + secs(61));
        assert!(windows.iter().all(PeriodicStats::is_empty));
    }

    #[test]
    fn test_concurrent_writers_lose_nothing() {
        use std::sync::Arc;
        use std::thread;

        let now = Utc::now();
        let series = Arc::new(PeriodicStats::new(Resolution::Hour, now));
        let mut handles = vec![];

        for _ in 0..8 {
            let series = Arc::clone(&series);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    series.inc("requests_total", now, now);
                    series.observe("request_duration", now, 0.5, now);
                }
            }));
        }

        // Rotation within the same period must not disturb writers.
        for _ in 0..100 {
            series.rotate(now);
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(series.buckets("requests_total")[0], 8000.0);
        assert_eq!(series.buckets("request_duration_count")[0], 8000.0);
        assert_eq!(series.buckets("request_duration_sum")[0], 4000.0);
    }
}
