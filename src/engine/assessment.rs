//! Assessment form validation
//!
//! Both bounds are enforced here, before any write, on every submission
//! path.

use crate::error::HomefrontError;

/// Inclusive stress-level range
pub const STRESS_LEVEL_RANGE: std::ops::RangeInclusive<i32> = 1..=10;

/// Inclusive available-hours range
pub const AVAILABLE_HOURS_RANGE: std::ops::RangeInclusive<i32> = 0..=24;

/// Validate the numeric bounds of a form submission
pub fn validate_submission(stress_level: i32, available_hours: i32) -> Result<(), HomefrontError> {
    if !STRESS_LEVEL_RANGE.contains(&stress_level) {
        return Err(HomefrontError::Validation(format!(
            "stressLevel must be between 1 and 10, got {}",
            stress_level
        )));
    }

    if !AVAILABLE_HOURS_RANGE.contains(&available_hours) {
        return Err(HomefrontError::Validation(format!(
            "availableHours must be between 0 and 24, got {}",
            available_hours
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_accepted() {
        assert!(validate_submission(1, 0).is_ok());
        assert!(validate_submission(10, 24).is_ok());
        assert!(validate_submission(8, 8).is_ok());
    }

    #[test]
    fn test_stress_level_out_of_range() {
        assert!(validate_submission(0, 8).is_err());
        assert!(validate_submission(11, 8).is_err());
    }

    #[test]
    fn test_available_hours_out_of_range() {
        assert!(validate_submission(5, -1).is_err());
        assert!(validate_submission(5, 25).is_err());
    }
}
