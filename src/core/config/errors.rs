//! Configuration error types and validation traits.

use thiserror::Error;

/// Errors that can occur during configuration validation.
///
/// This enum represents the errors raised when a parameters entry or a
/// recognizer configuration fails validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required field is missing from a parameters entry.
    #[error("missing field '{field}' in entry '{entry}'")]
    MissingField { entry: String, field: String },

    /// A dimension (width, height, channel count) is invalid.
    #[error("invalid {field} in entry '{entry}': {value}")]
    InvalidDimension {
        entry: String,
        field: String,
        value: usize,
    },

    /// Error indicating that a configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// A trait for validating configuration parameters.
///
/// Implemented by configuration structs that are built from files or
/// builders and must be checked before use.
pub trait ConfigValidator {
    /// Validates the configuration.
    ///
    /// # Returns
    ///
    /// A Result indicating success or a ConfigError if validation fails.
    fn validate(&self) -> Result<(), ConfigError>;
}

/// Extension trait turning validation into a consuming step.
pub trait ConfigValidatorExt: ConfigValidator + Sized {
    /// Validates and returns the configuration, converting failures to [`crate::core::OCRError`].
    fn validate_and_wrap_ocr_error(self) -> Result<Self, crate::core::OCRError> {
        self.validate()?;
        Ok(self)
    }
}

impl<T: ConfigValidator> ConfigValidatorExt for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct PoolSize(usize);

    impl ConfigValidator for PoolSize {
        fn validate(&self) -> Result<(), ConfigError> {
            if self.0 == 0 {
                return Err(ConfigError::InvalidConfig {
                    message: "pool size must be greater than 0".to_string(),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn test_validate_and_wrap_converts_error() {
        assert!(PoolSize(2).validate_and_wrap_ocr_error().is_ok());
        let err = PoolSize(0).validate_and_wrap_ocr_error().unwrap_err();
        assert!(matches!(err, crate::core::OCRError::ConfigError { .. }));
        assert!(err.to_string().contains("pool size"));
    }

    #[test]
    fn test_invalid_dimension_message() {
        let err = ConfigError::InvalidDimension {
            entry: "type1".to_string(),
            field: "width".to_string(),
            value: 0,
        };
        assert_eq!(err.to_string(), "invalid width in entry 'type1': 0");
    }
}
