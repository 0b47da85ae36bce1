//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::state::digits::MAX_DIGIT_COUNT;

/// Validates that a digit list is non-empty, no longer than ten, and only holds values `0..=9`.
///
/// Uniqueness and the per-game length are checked by the game itself so the
/// client gets the same error whichever transport it uses.
///
/// # Examples
///
/// ```ignore
/// validate_digits(&[1, 2, 3])  // Ok
/// validate_digits(&[])         // Err - empty
/// validate_digits(&[1, 12])    // Err - 12 is not a digit
/// ```
pub fn validate_digits(digits: &[u8]) -> Result<(), ValidationError> {
    if digits.is_empty() || digits.len() > MAX_DIGIT_COUNT {
        let mut err = ValidationError::new("digits_length");
        err.message = Some(
            format!(
                "Expected between 1 and {MAX_DIGIT_COUNT} digits (got {})",
                digits.len()
            )
            .into(),
        );
        return Err(err);
    }

    if let Some(digit) = digits.iter().find(|digit| **digit > 9) {
        let mut err = ValidationError::new("digit_range");
        err.message = Some(format!("{digit} is not a single decimal digit").into());
        return Err(err);
    }

    Ok(())
}
