//! Counter and histogram wrappers.
//!
//! A single update fans out to every resolution in [`StatsWindows`], to the
//! process-lifetime total and to the prometheus collector. All three happen
//! under one per-metric lock, so concurrent writers of the same metric never
//! lose an update.

use crate::core::config::ExporterConfig;
use crate::core::Result;
use crate::metrics::periodic::StatsWindows;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{HistogramOpts, IntCounter, Opts};
use std::sync::Arc;

/// Monotonic event counter, keyed by `name` in every resolution.
#[derive(Clone)]
pub struct Counter {
    name: &'static str,
    windows: Arc<StatsWindows>,
    total: Arc<Mutex<u64>>,
    prom: IntCounter,
}

impl Counter {
    pub fn new(
        name: &'static str,
        help: &str,
        windows: Arc<StatsWindows>,
        exporter: &ExporterConfig,
    ) -> Result<Self> {
        let opts = Opts::new(name, help)
            .namespace(exporter.namespace.as_str())
            .subsystem(exporter.subsystem.as_str());

        Ok(Self {
            name,
            windows,
            total: Arc::new(Mutex::new(0)),
            prom: IntCounter::with_opts(opts)?,
        })
    }

    /// Series key and unprefixed metric name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Count an event happening now
    pub fn inc(&self) {
        let now = Utc::now();
        self.record_at(now, now);
    }

    /// Count an event that happened at `when`
    pub fn inc_at(&self, when: DateTime<Utc>) {
        self.record_at(when, Utc::now());
    }

    pub(crate) fn record_at(&self, when: DateTime<Utc>, now: DateTime<Utc>) {
        let mut total = self.total.lock();
        self.windows.inc(self.name, when, now);
        *total += 1;
        self.prom.inc();
    }

    /// Events counted since process start
    pub fn value(&self) -> u64 {
        *self.total.lock()
    }
}

impl Collector for Counter {
    fn desc(&self) -> Vec<&Desc> {
        self.prom.desc()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.prom.collect()
    }
}

/// Running sample count and sum of a histogram.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct HistogramTotals {
    pub count: u64,
    pub sum: f64,
}

impl HistogramTotals {
    /// Mean of all samples, zero before the first one
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Sample distribution, tracked as `<name>_count` and `<name>_sum` series.
#[derive(Clone)]
pub struct Histogram {
    name: &'static str,
    windows: Arc<StatsWindows>,
    totals: Arc<Mutex<HistogramTotals>>,
    prom: prometheus::Histogram,
}

impl Histogram {
    pub fn new(
        name: &'static str,
        help: &str,
        windows: Arc<StatsWindows>,
        exporter: &ExporterConfig,
    ) -> Result<Self> {
        let opts = HistogramOpts::new(name, help)
            .namespace(exporter.namespace.as_str())
            .subsystem(exporter.subsystem.as_str());

        Ok(Self {
            name,
            windows,
            totals: Arc::new(Mutex::new(HistogramTotals::default())),
            prom: prometheus::Histogram::with_opts(opts)?,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Record a sample taken now
    pub fn observe(&self, value: f64) {
        let now = Utc::now();
        self.record_at(value, now, now);
    }

    /// Record a sample taken at `when`
    pub fn observe_at(&self, value: f64, when: DateTime<Utc>) {
        self.record_at(value, when, Utc::now());
    }

    /// Negative and non-finite samples are dropped before any state changes.
    pub(crate) fn record_at(&self, value: f64, when: DateTime<Utc>, now: DateTime<Utc>) {
        if !value.is_finite() || value < 0.0 {
            tracing::warn!(metric = self.name, value, "Dropping invalid sample");
            return;
        }
        let mut totals = self.totals.lock();
        self.windows.observe(self.name, when, value, now);
        totals.count += 1;
        totals.sum += value;
        self.prom.observe(value);
    }

    pub fn totals(&self) -> HistogramTotals {
        *self.totals.lock()
    }
}

impl Collector for Histogram {
    fn desc(&self) -> Vec<&Desc> {
        self.prom.desc()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.prom.collect()
    }
}
