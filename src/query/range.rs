//! Bucket index arithmetic for historical queries.

use crate::core::{Result, StatsError};
use crate::metrics::periodic::{Buckets, HISTORY_ELEMENTS, MAX_INDEX};
use crate::metrics::resolution::Resolution;
use chrono::{DateTime, TimeDelta, Utc};

/// Inclusive range of bucket indices, `start <= end` when non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketRange {
    pub start: usize,
    pub end: usize,
}

impl BucketRange {
    /// Range with both ends clamped into `[0, MAX_INDEX]`
    pub fn clamped(start: i64, end: i64) -> Self {
        Self {
            start: clamp_index(start),
            end: clamp_index(end),
        }
    }

    /// Number of buckets covered
    pub fn len(&self) -> usize {
        if self.start > self.end {
            0
        } else {
            self.end - self.start + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn clamp_index(index: i64) -> usize {
    usize::try_from(index).map_or(0, |index| index.min(MAX_INDEX))
}

/// Slice `buckets[start..=end]` in chronological order, oldest first.
///
/// Both bounds are clamped; an inverted range yields nothing.
pub fn extract_range(buckets: &Buckets, range: BucketRange) -> Vec<f64> {
    let start = range.start.min(MAX_INDEX);
    let end = range.end.min(MAX_INDEX);
    if start > end {
        return Vec::new();
    }
    buckets[start..=end].iter().rev().copied().collect()
}

/// Map a wall-clock window onto bucket indices of `resolution`.
///
/// Later timestamps land on smaller indices, since index 0 is "now".
/// Fails when either bound predates the retained history.
pub fn history_range(
    resolution: Resolution,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<BucketRange> {
    let window = resolution.period_delta() * HISTORY_ELEMENTS as i32;
    if predates(start_time, window, now) {
        return Err(StatsError::OutOfRange { param: "start_time" });
    }
    if predates(end_time, window, now) {
        return Err(StatsError::OutOfRange { param: "end_time" });
    }

    let mut start = resolution.periods_between(end_time, now);
    let mut end = resolution.periods_between(start_time, now);
    if start > end {
        std::mem::swap(&mut start, &mut end);
    }
    Ok(BucketRange::clamped(start, end))
}

fn predates(time: DateTime<Utc>, window: TimeDelta, now: DateTime<Utc>) -> bool {
    time.checked_add_signed(window).is_some_and(|edge| edge < now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ascending() -> Buckets {
        let mut buckets = [0.0; HISTORY_ELEMENTS];
        for (index, value) in buckets.iter_mut().enumerate() {
            *value = index as f64;
        }
        buckets
    }

    #[test]
    fn test_extract_range_is_chronological() {
        let buckets = ascending();
        assert_eq!(
            extract_range(&buckets, BucketRange { start: 2, end: 5 }),
            vec![5.0, 4.0, 3.0, 2.0]
        );
        assert_eq!(extract_range(&buckets, BucketRange { start: 7, end: 7 }), vec![7.0]);
    }

    #[test]
    fn test_extract_range_clamps() {
        let buckets = ascending();
        let tail = extract_range(&buckets, BucketRange { start: 58, end: 500 });
        assert_eq!(tail, vec![60.0, 59.0, 58.0]);
        assert!(extract_range(&buckets, BucketRange { start: 9, end: 3 }).is_empty());
    }

    #[test]
    fn test_clamped_range() {
        assert_eq!(BucketRange::clamped(-4, 100), BucketRange { start: 0, end: 60 });
        assert_eq!(BucketRange::clamped(0, 24).len(), 25);
        assert!(BucketRange { start: 3, end: 1 }.is_empty());
    }

    #[test]
    fn test_history_range_inverts_and_normalizes() {
        let now = Utc::now();
        let range = history_range(
            Resolution::Hour,
            now - TimeDelta::hours(10),
            now - TimeDelta::minutes(150),
            now,
        )
        .unwrap();
        assert_eq!(range, BucketRange { start: 2, end: 10 });

        // Bounds given the wrong way round describe the same window.
        let swapped = history_range(
            Resolution::Hour,
            now - TimeDelta::minutes(150),
            now - TimeDelta::hours(10),
            now,
        )
        .unwrap();
        assert_eq!(swapped, range);
    }

    #[test]
    fn test_history_range_rejects_expired_bounds() {
        let now = Utc::now();
        let err = history_range(
            Resolution::Hour,
            now - TimeDelta::hours(100),
            now - TimeDelta::hours(1),
            now,
        )
        .unwrap_err();
        assert!(matches!(err, StatsError::OutOfRange { param: "start_time" }));

        let err = history_range(
            Resolution::Minute,
            now - TimeDelta::minutes(5),
            now - TimeDelta::minutes(62),
            now,
        )
        .unwrap_err();
        assert!(matches!(err, StatsError::OutOfRange { param: "end_time" }));
    }

    #[test]
    fn test_history_range_edge_of_window() {
        let now = Utc::now();
        // Exactly 61 periods back is still accepted, and clamps to the last slot.
        let range = history_range(
            Resolution::Second,
            now - TimeDelta::seconds(61),
            now,
            now,
        )
        .unwrap();
        assert_eq!(range, BucketRange { start: 0, end: 60 });
    }

    #[test]
    fn test_history_range_single_instant() {
        let now = Utc::now();
        for hours in [0, 1, 17, 59] {
            let at = now - TimeDelta::hours(hours);
            let range = history_range(Resolution::Hour, at, at, now).unwrap();
            assert_eq!(range.len(), 1);
            assert_eq!(range.start, hours as usize);
        }
    }

    #[test]
    fn test_history_range_one_period_apart() {
        let now = Utc::now();
        let just_under = TimeDelta::hours(1) - TimeDelta::seconds(1);
        for hours_back in [0, 5, 30, 59] {
            let end = now - TimeDelta::hours(hours_back);

            let range = history_range(Resolution::Hour, end - TimeDelta::hours(1), end, now).unwrap();
            assert_eq!(range.len(), 2);
            assert_eq!(range.start, hours_back as usize);

            let range = history_range(Resolution::Hour, end - just_under, end, now).unwrap();
            assert_eq!(range.len(), 1);
        }
    }

    #[test]
    fn test_future_bounds_clamp_to_current_bucket() {
        let now = Utc::now();
        let range = history_range(
            Resolution::Day,
            now - TimeDelta::days(3),
            now + TimeDelta::days(2),
            now,
        )
        .unwrap();
        assert_eq!(range, BucketRange { start: 0, end: 3 });
    }
}
