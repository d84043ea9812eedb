//! Range Validation Utilities
//!
//! Pure checks shared by the decoder. Each takes the dotted field path so the
//! resulting error names the value that failed, and none of them allocate.
//!
//! ```rust
//! use roadvision_core::validators::check_range;
//!
//! assert!(check_range("humidity.value", 40.0, 0.0, 100.0).is_ok());
//! assert!(check_range("humidity.value", 140.0, 0.0, 100.0).is_err());
//! ```

use crate::errors::ValidationError;

/// Result type for validation checks
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Check that a value is a real number
pub fn check_finite(field: &'static str, value: f64) -> ValidationResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue { field })
    }
}

/// Check that a value is finite and within `[min, max]`
pub fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> ValidationResult<()> {
    check_finite(field, value)?;
    if value < min || value > max {
        Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    } else {
        Ok(())
    }
}

/// Check that a value is finite and not below `min`
pub fn check_min(field: &'static str, value: f64, min: f64) -> ValidationResult<()> {
    check_range(field, value, min, f64::MAX)
}
