//! Error types for hat-netlist.
//!
//! Netlist declaration and output errors live in [`crate::netlist::error`];
//! [`Error`] joins them with configuration errors for the command-line tool.

use std::path::PathBuf;

use crate::netlist::NetlistError;

/// Top-level error returned by a netlist generation run.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Declaring the design or writing its netlist failed.
    #[error(transparent)]
    Netlist(#[from] NetlistError),
}

/// Result type for a netlist generation run.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during configuration operations.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let error = ConfigError::NotFound {
            path: PathBuf::from("/path/to/config.json"),
        };
        let msg = error.to_string();
        assert!(msg.contains("not found"));
        assert!(msg.contains("config.json"));
    }

    #[test]
    fn top_level_error_is_transparent() {
        let error: Error = NetlistError::DuplicateNet {
            name: "GND".to_string(),
        }
        .into();
        assert_eq!(error.to_string(), "Duplicate net name: GND");
        assert!(matches!(error, Error::Netlist(_)));
    }

    #[test]
    fn validation_error_display() {
        let error = ConfigError::ValidationError {
            message: "invalid setting".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("invalid setting"));
    }
}
