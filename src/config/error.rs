//! Configuration errors.

use std::fmt;

/// Errors produced when building or validating the training configuration.
///
/// # Variants
///
/// - **Validation**: values are inconsistent or out of range (e.g. a zero
///   image dimension). Returned by `validate()`; fix the offending value.
/// - **Parse**: an environment variable was set but could not be parsed into
///   the expected type (e.g. `DIFFTRACE_SPP=lots`). Returned by `from_env()`;
///   correct the variable or unset it to fall back to the default.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration validation failed.
    Validation(String),

    /// Environment variable was set but could not be parsed.
    Parse {
        /// The full environment variable name.
        key: String,
        /// The raw value that failed to parse.
        value: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Validation(message) => write!(f, "config validation: {message}"),
            ConfigError::Parse { key, value } => {
                write!(f, "env var {key}={value:?}: not a valid value")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
