//! Error types for the common library.
//!
//! This module provides a unified error hierarchy using `thiserror` so the
//! server can distinguish local failures from vendor-reported ones.
//!
//! # Error Categories
//!
//! - `ConfigError`: Missing credentials or invalid configuration values
//! - `Error::Api`: Vendor API errors (includes endpoint and status)
//! - `Error::Validation`: Input validation failures, raised before any network call
//! - `Error::Io`: File system operations

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for the PixelForge crates.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration errors (missing credentials, invalid values, bad config file)
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// API errors with endpoint and HTTP status context
    ///
    /// The message carries the vendor's response body verbatim so callers
    /// see the vendor's own explanation (unsupported model, blocked prompt, ...).
    #[error("API error for {endpoint} (HTTP {status_code}): {message}")]
    Api {
        /// The API endpoint that was called
        endpoint: String,
        /// HTTP status code returned by the API (0 when no response was received)
        status_code: u16,
        /// Error message from the API or describing the failure
        message: String,
    },

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// File system I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new API error with endpoint, status code, and message.
    ///
    /// # Example
    ///
    /// ```
    /// use pixelforge_mcp_common::error::Error;
    ///
    /// let err = Error::api(
    ///     "https://generativelanguage.googleapis.com/v1beta/models/x:generateContent",
    ///     404,
    ///     "models/x is not found"
    /// );
    /// assert!(err.to_string().contains("404"));
    /// assert!(err.to_string().contains("models/x is not found"));
    /// ```
    pub fn api(endpoint: impl Into<String>, status_code: u16, message: impl Into<String>) -> Self {
        Error::Api {
            endpoint: endpoint.into(),
            status_code,
            message: message.into(),
        }
    }

    /// Create a new validation error.
    ///
    /// # Example
    ///
    /// ```
    /// use pixelforge_mcp_common::error::Error;
    ///
    /// let err = Error::validation("prompt: Prompt cannot be empty");
    /// assert!(err.to_string().contains("Prompt cannot be empty"));
    /// ```
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Whether this error was raised locally before reaching the vendor.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

/// Configuration errors.
///
/// These errors occur while resolving settings from environment variables,
/// the optional YAML file, and built-in defaults.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// None of the accepted API key variables is set
    #[error("No API key found. Set one of: {}", .0.join(", "))]
    MissingApiKey(Vec<String>),

    /// A configuration value is out of range or not a recognised option
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    /// The configuration file exists but could not be read
    #[error("Failed to read config file {path}: {message}")]
    FileRead {
        /// Path of the configuration file
        path: PathBuf,
        /// Underlying I/O error message
        message: String,
    },

    /// The configuration file could not be parsed as YAML
    #[error("Failed to parse config file {path}: {message}")]
    FileParse {
        /// Path of the configuration file
        path: PathBuf,
        /// Parser error message
        message: String,
    },
}

impl ConfigError {
    /// Create a new missing API key error listing the accepted variable names.
    pub fn missing_api_key(names: &[&str]) -> Self {
        ConfigError::MissingApiKey(names.iter().map(|n| n.to_string()).collect())
    }

    /// Create a new invalid value error.
    pub fn invalid_value(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue(name.into(), reason.into())
    }
}

/// Result type alias using the unified Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_includes_endpoint_and_status() {
        let err = Error::api("https://generativelanguage.googleapis.com/v1beta/models/m:generateContent", 500, "Internal error");
        let msg = err.to_string();
        assert!(msg.contains("generativelanguage.googleapis.com"), "Should contain endpoint");
        assert!(msg.contains("500"), "Should contain status code");
        assert!(msg.contains("Internal error"), "Should contain message");
    }

    #[test]
    fn test_missing_api_key_lists_all_names() {
        let err = ConfigError::missing_api_key(&["GOOGLE_API_KEY", "GEMINI_API_KEY"]);
        let msg = err.to_string();
        assert!(msg.contains("GOOGLE_API_KEY"));
        assert!(msg.contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_invalid_value_includes_name_and_reason() {
        let err = ConfigError::invalid_value("imagen.default_temperature", "must be between 0.0 and 2.0");
        let msg = err.to_string();
        assert!(msg.contains("imagen.default_temperature"));
        assert!(msg.contains("between 0.0 and 2.0"));
    }

    #[test]
    fn test_file_parse_includes_path() {
        let err = ConfigError::FileParse {
            path: PathBuf::from("config/config.yaml"),
            message: "invalid type".to_string(),
        };
        assert!(err.to_string().contains("config/config.yaml"));
    }

    #[test]
    fn test_error_from_config_error() {
        let err: Error = ConfigError::invalid_value("x", "y").into();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_validation_error() {
        let err = Error::validation("temperature out of range");
        assert!(err.is_validation());
        let msg = err.to_string();
        assert!(msg.contains("Validation"), "Should mention validation");
        assert!(msg.contains("temperature out of range"), "Should contain message");
    }

    #[test]
    fn test_api_error_is_not_validation() {
        assert!(!Error::api("e", 400, "bad").is_validation());
    }
}
