//! dnstally - Multi-resolution DNS filtering statistics.
//!
//! Counts the outcome of every DNS query a filter processes and keeps the
//! counts in fixed-size bucketed series at four resolutions (seconds,
//! minutes, hours, days), 61 buckets each. The series back a small HTTP
//! API for dashboards, while cumulative totals are exposed for scraping.
//!
//! # Architecture
//!
//! - `metrics`: bucketed series, counters/histograms, rotation driver
//! - `query`: index arithmetic and report assembly
//! - `api`: HTTP endpoints
//! - `core`: configuration and errors
//! - `cli`: command-line interface
//!
//! # Example
//!
//! ```no_run
//! use dnstally_lib::core::Config;
//! use dnstally_lib::Application;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let app = Application::new(config)?;
//!     app.run().await?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod api;
pub mod application;
pub mod cli;
pub mod core;
pub mod metrics;
pub mod query;

pub use crate::application::Application;
pub use crate::core::{Config, Result, StatsError};
pub use crate::metrics::{Reason, Resolution, Statistics};
