//! Core configuration and error types for dnstally.
//!
//! Everything else in the crate builds on the [`Config`] loaded here and
//! reports failures through [`StatsError`].

#![warn(missing_docs)]

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::{Config, ConfigBuilder, LogLevel};
pub use error::{Result, StatsError};
