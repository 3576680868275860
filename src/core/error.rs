use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Must specify valid time_unit parameter, got '{0}'")]
    InvalidTimeUnit(String),

    #[error("Must specify valid {param} parameter: {message}")]
    InvalidTimestamp { param: &'static str, message: String },

    #[error("{param} parameter is outside of supported range")]
    OutOfRange { param: &'static str },

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Unknown reason: {0}")]
    UnknownReason(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Exporter error: {0}")]
    Exporter(#[from] prometheus::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unable to marshal status json: {0}")]
    Serialization(#[from] serde_json::Error),

}

/// Result type alias for statistics operations
pub type Result<T> = std::result::Result<T, StatsError>;

impl StatsError {
    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new timestamp parsing error for the named query parameter
    pub fn invalid_timestamp<S: Into<String>>(param: &'static str, msg: S) -> Self {
        Self::InvalidTimestamp {
            param,
            message: msg.into(),
        }
    }

    /// Returns true if the caller supplied bad input
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidTimeUnit(_)
                | Self::InvalidTimestamp { .. }
                | Self::UnknownMetric(_)
                | Self::UnknownReason(_)
        )
    }

    /// Returns the error category for metrics/logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidTimeUnit(_) | Self::InvalidTimestamp { .. } => "input",
            Self::UnknownMetric(_) | Self::UnknownReason(_) => "not_found",
            Self::OutOfRange { .. } => "range",
            Self::Config(_) => "config",
            Self::Exporter(_) => "exporter",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = StatsError::config("rotation_interval must be greater than 0");
        assert_eq!(
            err.to_string(),
            "Configuration error: rotation_interval must be greater than 0"
        );
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_timestamp_error_names_parameter() {
        let err = StatsError::invalid_timestamp("start_time", "premature end of input");
        assert_eq!(
            err.to_string(),
            "Must specify valid start_time parameter: premature end of input"
        );
        assert!(err.is_caller_error());
    }

    #[test]
    fn test_out_of_range_is_not_caller_error() {
        let err = StatsError::OutOfRange { param: "end_time" };
        assert_eq!(err.to_string(), "end_time parameter is outside of supported range");
        assert_eq!(err.category(), "range");
        assert!(!err.is_caller_error());
    }

    #[test]
    fn test_serialization_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: StatsError = json_err.into();
        assert_eq!(err.category(), "serialization");
        assert!(err.to_string().starts_with("Unable to marshal status json"));
        assert!(!err.is_caller_error());
    }
}
