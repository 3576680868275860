//! The statistics engine shared by the DNS filter and the HTTP surface.

use crate::core::config::ExporterConfig;
use crate::core::{Result, StatsError};
use crate::metrics::facade::{Counter, Histogram};
use crate::metrics::periodic::{PeriodicStats, StatsWindows};
use crate::metrics::reason::Reason;
use crate::metrics::resolution::Resolution;
use chrono::{DateTime, Utc};
use prometheus::{Encoder, Registry, TextEncoder};
use std::sync::Arc;
use std::time::Duration;

/// Series keys of every tracked metric.
pub mod names {
    pub const REQUESTS: &str = "requests_total";
    pub const FILTERED: &str = "filtered_total";
    pub const FILTERED_LISTS: &str = "filtered_lists_total";
    pub const FILTERED_SAFEBROWSING: &str = "filtered_safebrowsing_total";
    pub const FILTERED_PARENTAL: &str = "filtered_parental_total";
    pub const FILTERED_INVALID: &str = "filtered_invalid_total";
    pub const WHITELISTED: &str = "whitelisted_total";
    pub const SAFESEARCH: &str = "safesearch_total";
    pub const ERRORS: &str = "errors_total";
    pub const REQUEST_DURATION: &str = "request_duration";
}

const COUNTERS: [(&str, &str); 9] = [
    (names::REQUESTS, "Count of requests seen by dnsfilter."),
    (names::FILTERED, "Count of requests filtered by dnsfilter."),
    (names::FILTERED_LISTS, "Count of requests filtered by dnsfilter using lists."),
    (names::FILTERED_SAFEBROWSING, "Count of requests filtered by dnsfilter using safebrowsing."),
    (names::FILTERED_PARENTAL, "Count of requests filtered by dnsfilter using parental."),
    (names::FILTERED_INVALID, "Count of requests filtered by dnsfilter because they were invalid."),
    (names::WHITELISTED, "Count of requests not filtered by dnsfilter because they are whitelisted."),
    (names::SAFESEARCH, "Count of requests replaced by dnsfilter safesearch."),
    (names::ERRORS, "Count of requests that dnsfilter couldn't process because of transitive errors."),
];

/// Process-wide DNS statistics.
///
/// Created once by the entry point and shared by handle with both the
/// filtering producer and the HTTP surface.
pub struct Statistics {
    windows: Arc<StatsWindows>,
    counters: Vec<Counter>,
    latency: Histogram,
    registry: Registry,
}

impl Statistics {
    /// Build the engine and register every metric with a fresh registry.
    pub fn new(exporter: &ExporterConfig) -> Result<Self> {
        let windows = Arc::new(StatsWindows::new(Utc::now()));
        let registry = Registry::new();

        let mut counters = Vec::with_capacity(COUNTERS.len());
        for (name, help) in COUNTERS {
            let counter = Counter::new(name, help, Arc::clone(&windows), exporter)?;
            registry.register(Box::new(counter.clone()))?;
            counters.push(counter);
        }

        let latency = Histogram::new(
            names::REQUEST_DURATION,
            "Histogram of the time (in seconds) each request took.",
            Arc::clone(&windows),
            exporter,
        )?;
        registry.register(Box::new(latency.clone()))?;

        Ok(Self {
            windows,
            counters,
            latency,
            registry,
        })
    }

    /// All four resolutions
    pub fn windows(&self) -> &Arc<StatsWindows> {
        &self.windows
    }

    /// Series for one resolution
    pub fn series(&self, resolution: Resolution) -> &PeriodicStats {
        self.windows.get(resolution)
    }

    /// Counter by series key
    pub fn counter(&self, name: &str) -> Option<&Counter> {
        self.counters.iter().find(|counter| counter.name() == name)
    }

    pub fn counters(&self) -> &[Counter] {
        &self.counters
    }

    /// Request processing time histogram
    pub fn latency(&self) -> &Histogram {
        &self.latency
    }

    /// Count an event for an opaque metric name.
    pub fn increment(&self, name: &str, when: DateTime<Utc>) -> Result<()> {
        let counter = self
            .counter(name)
            .ok_or_else(|| StatsError::UnknownMetric(name.to_string()))?;
        counter.inc_at(when);
        Ok(())
    }

    /// Count one query and route its filtering decision.
    pub fn record_decision(&self, reason: Reason, when: DateTime<Utc>) {
        self.record_decision_at(reason, when, Utc::now());
    }

    /// Record how long one request took to process.
    pub fn record_latency(&self, seconds: f64, when: DateTime<Utc>) {
        self.latency.observe_at(seconds, when);
    }

    /// Decision and processing time of one query.
    pub fn record_query(&self, reason: Reason, elapsed: Duration, when: DateTime<Utc>) {
        let now = Utc::now();
        self.record_decision_at(reason, when, now);
        self.latency.record_at(elapsed.as_secs_f64(), when, now);
    }

    pub(crate) fn record_decision_at(&self, reason: Reason, when: DateTime<Utc>, now: DateTime<Utc>) {
        self.bump(names::REQUESTS, when, now);

        let specific = match reason {
            Reason::NotFilteredNotFound => None,
            Reason::NotFilteredWhiteList => Some(names::WHITELISTED),
            Reason::NotFilteredError => Some(names::ERRORS),
            Reason::FilteredBlackList => Some(names::FILTERED_LISTS),
            Reason::FilteredSafeBrowsing => Some(names::FILTERED_SAFEBROWSING),
            Reason::FilteredParental => Some(names::FILTERED_PARENTAL),
            Reason::FilteredInvalid => Some(names::FILTERED_INVALID),
            // Rewritten, not blocked.
            Reason::FilteredSafeSearch => Some(names::SAFESEARCH),
        };

        if reason.is_filtered() && reason != Reason::FilteredSafeSearch {
            self.bump(names::FILTERED, when, now);
        }
        if let Some(name) = specific {
            self.bump(name, when, now);
        }
    }

    fn bump(&self, name: &str, when: DateTime<Utc>, now: DateTime<Utc>) {
        match self.counter(name) {
            Some(counter) => counter.record_at(when, now),
            None => tracing::error!(metric = name, "Counter missing from registry"),
        }
    }

    /// Age every resolution against one shared instant.
    pub fn rotate(&self, now: DateTime<Utc>) {
        self.windows.rotate(now);
    }

    /// Clear the time series of all four resolutions.
    ///
    /// Cumulative exporter totals are left untouched.
    pub fn reset(&self, now: DateTime<Utc>) {
        self.windows.reset(now);
        tracing::info!("Statistics reset");
    }

    /// Registry backing the pull exporter
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Cumulative totals in prometheus text exposition format.
    pub fn export_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| {
            StatsError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }
}
