//! Custom error types for k9track
//!
//! Structured error handling using thiserror. Each layer (configuration,
//! remote API, validation, local storage) gets its own enum so callers can
//! match on what actually went wrong.

use thiserror::Error;

/// Main error type for k9track
#[derive(Error, Debug)]
pub enum K9Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Remote backend errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Validation errors raised before any write happens
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Local store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Date/time parsing errors
    #[error("Date/time error: {0}")]
    DateTime(String),

    /// Terminal/UI errors
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine the config directory for this platform")]
    NoConfigDir,

    #[error("Config file not found. Run `k9track config init` first")]
    NotFound,

    #[error("Facility id is not configured")]
    MissingFacility,

    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to save configuration file: {0}")]
    SaveFailed(String),

    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

/// Remote backend errors
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request to {endpoint} failed with status {status}: {body}")]
    RequestFailed {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    #[error("Authentication failed. Please check your API key")]
    AuthenticationFailed,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

/// Validation errors
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Invalid activity code '{0}'. Use lowercase letters, digits and underscores, starting with a letter")]
    InvalidCode(String),

    #[error("Activity code '{0}' already exists for this facility")]
    DuplicateCode(String),

    #[error("'{0}' is not a built-in activity type")]
    NotBuiltIn(String),

    #[error("Unknown activity type: {0}")]
    UnknownActivityType(String),

    #[error("Warning threshold ({warning}m) must be below the maximum ({max}m)")]
    InvertedThresholds { warning: i64, max: i64 },

    #[error("Invalid minutes value for {field}: {value}. Must be positive")]
    InvalidMinutes { field: String, value: i64 },

    #[error("Dog {0} already has an activity in progress")]
    DogAlreadyActive(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Local store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Could not determine the data directory for this platform")]
    NoDataDir,

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Failed to read {key}: {reason}")]
    ReadFailed { key: String, reason: String },

    #[error("Failed to write {key}: {reason}")]
    WriteFailed { key: String, reason: String },
}

/// Result type alias for k9track
pub type Result<T> = std::result::Result<T, K9Error>;

impl From<anyhow::Error> for K9Error {
    fn from(err: anyhow::Error) -> Self {
        K9Error::Other(err.to_string())
    }
}

impl From<chrono::ParseError> for K9Error {
    fn from(err: chrono::ParseError) -> Self {
        K9Error::DateTime(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = K9Error::Config(ConfigError::MissingFacility);
        assert!(err.to_string().contains("Facility id"));

        let err = K9Error::Validation(ValidationError::InvertedThresholds {
            warning: 30,
            max: 20,
        });
        assert!(err.to_string().contains("must be below the maximum"));
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let k9_err: K9Error = io_err.into();
        assert!(matches!(k9_err, K9Error::Io(_)));

        let store_err: K9Error = StoreError::NotFound("abc".to_string()).into();
        assert!(matches!(store_err, K9Error::Store(StoreError::NotFound(_))));
    }

    #[test]
    fn test_validation_errors() {
        let err = ValidationError::InvalidCode("Fetch Time".to_string());
        assert!(err.to_string().contains("lowercase"));

        let err = ValidationError::DuplicateCode("fetch_time".to_string());
        assert!(err.to_string().contains("already exists"));
    }
}

// Made with Bob
