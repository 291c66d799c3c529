//! Error types for local_planner

use std::fmt;

/// Main error type for the planner.
///
/// The per-cycle pipeline never fails; these errors only surface while
/// loading or validating configuration.
#[derive(Debug)]
pub enum PlannerError {
    /// Invalid parameter
    InvalidParameter(String),
    /// Configuration could not be parsed
    ConfigError(String),
    /// I/O error
    IoError(std::io::Error),
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannerError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            PlannerError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            PlannerError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for PlannerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlannerError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PlannerError {
    fn from(e: std::io::Error) -> Self {
        PlannerError::IoError(e)
    }
}

impl From<toml::de::Error> for PlannerError {
    fn from(e: toml::de::Error) -> Self {
        PlannerError::ConfigError(e.to_string())
    }
}

/// Result type alias for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;
