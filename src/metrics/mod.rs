//! Multi-resolution DNS query statistics.
//!
//! - [`periodic`]: 61-slot bucket rings per metric, one set per resolution
//! - [`facade`]: counters and histograms feeding all resolutions and the exporter
//! - [`statistics`]: the engine handed to producers and the HTTP surface
//! - [`rotator`]: background task aging the buckets once per second

pub mod facade;
pub mod periodic;
pub mod reason;
pub mod resolution;
pub mod rotator;
pub mod statistics;

pub use facade::{Counter, Histogram, HistogramTotals};
pub use periodic::{Buckets, PeriodicStats, StatsWindows, HISTORY_ELEMENTS, MAX_INDEX};
pub use reason::Reason;
pub use resolution::Resolution;
pub use rotator::Rotator;
pub use statistics::{names, Statistics};
