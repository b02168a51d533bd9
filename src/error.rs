use thiserror::Error;

/// Rejected configuration. Raised by the validation layer, never by the
/// physics/control core, which clamps instead.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} = {value} is outside the allowed range [{min}, {max}]")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{name} must be finite and strictly positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("invalid search setting: {0}")]
    Search(&'static str),

    #[error("could not read settings file: {0}")]
    Io(String),

    #[error("could not parse settings: {0}")]
    Parse(String),
}

/// Illegal simulation-loop mode transition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimError {
    #[error("a training session is already in progress")]
    AlreadyTraining,
}

/// Check that `value` lies in the closed range `[min, max]`.
pub(crate) fn check_range(
    name: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange { name, value, min, max })
    }
}

/// Check that `value` lies in the half-open range `(0, max]`.
pub(crate) fn check_positive(name: &'static str, value: f64, max: f64) -> Result<f64, ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::NotPositive { name, value });
    }
    check_range(name, value, 0.0, max)
}
