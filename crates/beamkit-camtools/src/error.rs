//! Error types for the CAM tools crate.
//!
//! Conversion itself never fails (bad geometry degrades locally, see the
//! engraver modules); these types cover construction-time validation.

use beamkit_core::EngraveConfig;
use thiserror::Error;

/// Errors that can occur while setting up a conversion tool.
#[derive(Error, Debug)]
pub enum CamToolError {
    /// Invalid parameters were provided to a conversion tool.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Image input could not be used.
    #[error("Image processing error: {0}")]
    ImageError(String),

    /// A parameter validation error occurred.
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),
}

/// Errors related to conversion parameter validation.
#[derive(Error, Debug)]
pub enum ParameterError {
    /// A parameter value is out of the valid range.
    #[error("Parameter '{name}' out of range: {value} (valid: {min}..{max})")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A parameter value is invalid.
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: String, reason: String },
}

/// Result type alias for CAM tool operations.
pub type CamToolResult<T> = Result<T, CamToolError>;

/// Result type alias for parameter validation.
pub type ParameterResult<T> = Result<T, ParameterError>;

/// Checks an [`EngraveConfig`] for values no conversion can work with.
pub fn validate_config(cfg: &EngraveConfig) -> ParameterResult<()> {
    if !(cfg.resolution > 0.0) {
        return Err(ParameterError::InvalidValue {
            name: "resolution".to_string(),
            reason: "must be a positive number of pixels per unit".to_string(),
        });
    }
    if !(cfg.fill_resolution > 0.0) {
        return Err(ParameterError::InvalidValue {
            name: "fill_resolution".to_string(),
            reason: "must be a positive number of pixels per unit".to_string(),
        });
    }
    if !(0..=255).contains(&cfg.min_power) {
        return Err(ParameterError::OutOfRange {
            name: "min_power".to_string(),
            value: cfg.min_power as f64,
            min: 0.0,
            max: 255.0,
        });
    }
    if !(0..=255).contains(&cfg.max_power) {
        return Err(ParameterError::OutOfRange {
            name: "max_power".to_string(),
            value: cfg.max_power as f64,
            min: 0.0,
            max: 255.0,
        });
    }
    if cfg.max_power < cfg.min_power {
        return Err(ParameterError::InvalidValue {
            name: "max_power".to_string(),
            reason: format!("must not be below min_power ({})", cfg.min_power),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CamToolError::InvalidParameters("image has no pixels".to_string());
        assert_eq!(err.to_string(), "Invalid parameters: image has no pixels");

        let err = ParameterError::OutOfRange {
            name: "max_power".to_string(),
            value: 300.0,
            min: 0.0,
            max: 255.0,
        };
        assert_eq!(
            err.to_string(),
            "Parameter 'max_power' out of range: 300 (valid: 0..255)"
        );
    }

    #[test]
    fn test_parameter_error_conversion() {
        let param = ParameterError::InvalidValue {
            name: "resolution".to_string(),
            reason: "zero".to_string(),
        };
        let err: CamToolError = param.into();
        assert!(matches!(err, CamToolError::Parameter(_)));
    }

    #[test]
    fn test_validate_config() {
        assert!(validate_config(&EngraveConfig::default()).is_ok());

        let cfg = EngraveConfig {
            resolution: 0.0,
            ..EngraveConfig::default()
        };
        assert!(validate_config(&cfg).is_err());

        let cfg = EngraveConfig {
            min_power: 100,
            max_power: 50,
            ..EngraveConfig::default()
        };
        assert!(validate_config(&cfg).is_err());

        let cfg = EngraveConfig {
            max_power: 300,
            ..EngraveConfig::default()
        };
        assert!(validate_config(&cfg).is_err());
    }
}
