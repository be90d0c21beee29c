//! Unified error handling for the velometrics library.
//!
//! Every fallible operation returns [`Result`], carrying a [`MetricsError`].
//! Numeric edge cases (empty, all-zero or single-sample streams) are defined
//! behaviour and never surface as errors.

use std::fmt;

/// Unified error type for velometrics operations.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricsError {
    /// Caller passed arguments that cannot be combined (length mismatch,
    /// label count vs. zone edges, non-positive window, ...)
    InvalidArgument { message: String },
    /// Required configuration is absent (no ftp/lthr/zones, no profile file)
    ConfigError { message: String },
    /// A named stream needed by a metric is absent from the activity
    MissingData {
        stream: String,
        activity_id: Option<String>,
    },
    /// HTTP/API error
    HttpError {
        message: String,
        status_code: Option<u16>,
    },
    /// Malformed JSON or stream payload
    ParseError { message: String },
    /// Generic internal error
    Internal { message: String },
}

impl MetricsError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        MetricsError::InvalidArgument {
            message: message.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        MetricsError::ConfigError {
            message: message.into(),
        }
    }

    /// Fail with `InvalidArgument` unless both lengths agree.
    pub(crate) fn check_lengths(what: &str, expected: usize, actual: usize) -> Result<()> {
        if expected != actual {
            return Err(MetricsError::invalid(format!(
                "{} length {} does not match stream length {}",
                what, actual, expected
            )));
        }
        Ok(())
    }
}

impl fmt::Display for MetricsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricsError::InvalidArgument { message } => {
                write!(f, "Invalid argument: {}", message)
            }
            MetricsError::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            MetricsError::MissingData {
                stream,
                activity_id,
            } => {
                if let Some(id) = activity_id {
                    write!(f, "Activity '{}' has no '{}' stream", id, stream)
                } else {
                    write!(f, "No '{}' stream available", stream)
                }
            }
            MetricsError::HttpError {
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "HTTP error ({}): {}", code, message)
                } else {
                    write!(f, "HTTP error: {}", message)
                }
            }
            MetricsError::ParseError { message } => {
                write!(f, "Parse error: {}", message)
            }
            MetricsError::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for MetricsError {}

impl From<serde_json::Error> for MetricsError {
    fn from(err: serde_json::Error) -> Self {
        MetricsError::ParseError {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for MetricsError {
    fn from(err: std::io::Error) -> Self {
        MetricsError::ConfigError {
            message: err.to_string(),
        }
    }
}

/// Result type alias for velometrics operations.
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Extension trait for converting Option to MetricsError.
pub trait OptionExt<T> {
    /// Convert Option to Result with a missing stream error.
    fn ok_or_missing_stream(self, stream: &str, activity_id: Option<&str>) -> Result<T>;

    /// Convert Option to Result with generic internal error.
    fn ok_or_internal(self, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_missing_stream(self, stream: &str, activity_id: Option<&str>) -> Result<T> {
        self.ok_or_else(|| MetricsError::MissingData {
            stream: stream.to_string(),
            activity_id: activity_id.map(str::to_string),
        })
    }

    fn ok_or_internal(self, message: &str) -> Result<T> {
        self.ok_or_else(|| MetricsError::Internal {
            message: message.to_string(),
        })
    }
}
