//! Configuration validation.
//!
//! [`SonoscanConfig::validate`](crate::SonoscanConfig::validate) walks every
//! field and reports all problems at once through a [`Checker`], so a user
//! editing a config file sees the full list instead of fixing one error per
//! run.

use thiserror::Error;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Value outside its accepted range.
    #[error("'{param}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Dotted field path, e.g. `scan.period_ms`.
        param: String,
        /// The rejected value.
        value: f64,
        /// Minimum allowed value.
        min: f64,
        /// Maximum allowed value.
        max: f64,
    },

    /// Value in range but not of an accepted form.
    #[error("invalid format for '{param}': {reason}")]
    InvalidFormat {
        /// Dotted field path.
        param: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Two fields that must be ordered are not.
    #[error("'{low}' ({low_value}) must be below '{high}' ({high_value})")]
    Unordered {
        /// Field that must be smaller.
        low: String,
        /// Its value.
        low_value: f64,
        /// Field that must be larger.
        high: String,
        /// Its value.
        high_value: f64,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Collects validation errors.
#[derive(Debug, Default)]
pub struct Checker {
    errors: Vec<ValidationError>,
}

impl Checker {
    /// An empty checker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `min <= value <= max`. NaN always fails.
    pub fn range(&mut self, param: &str, value: f64, min: f64, max: f64) -> &mut Self {
        if !(value >= min && value <= max) {
            self.errors.push(ValidationError::OutOfRange {
                param: param.to_string(),
                value,
                min,
                max,
            });
        }
        self
    }

    /// Require `low < high`. Skipped when either side is not finite, since
    /// the range checks already report those.
    pub fn ordered(&mut self, low: &str, low_value: f64, high: &str, high_value: f64) -> &mut Self {
        if low_value.is_finite() && high_value.is_finite() && low_value >= high_value {
            self.errors.push(ValidationError::Unordered {
                low: low.to_string(),
                low_value,
                high: high.to_string(),
                high_value,
            });
        }
        self
    }

    /// Record a format problem when `ok` is false.
    pub fn require(&mut self, ok: bool, param: &str, reason: &str) -> &mut Self {
        if !ok {
            self.errors.push(ValidationError::InvalidFormat {
                param: param.to_string(),
                reason: reason.to_string(),
            });
        }
        self
    }

    /// Number of problems recorded so far.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `Ok` when clean, the single error when there is one, otherwise
    /// [`ValidationError::Multiple`].
    pub fn finish(mut self) -> ValidationResult<()> {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.remove(0)),
            _ => Err(ValidationError::Multiple(self.errors)),
        }
    }
}
