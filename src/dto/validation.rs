//! Validation helpers for DTOs.

use validator::ValidationError;

const MAX_NAME_LENGTH: usize = 80;

/// Validates a roster name: not blank, at most 80 characters, no control characters.
///
/// # Examples
///
/// ```ignore
/// validate_full_name("Sam Rivera") // Ok
/// validate_full_name("   ")        // Err - blank
/// validate_full_name("Sam\nRivera") // Err - control character
/// ```
pub fn validate_full_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("full_name_blank");
        err.message = Some("Player name must not be blank".into());
        return Err(err);
    }

    let length = trimmed.chars().count();
    if length > MAX_NAME_LENGTH {
        let mut err = ValidationError::new("full_name_length");
        err.message = Some(
            format!("Player name must be at most {MAX_NAME_LENGTH} characters (got {length})")
                .into(),
        );
        return Err(err);
    }

    if trimmed.chars().any(char::is_control) {
        let mut err = ValidationError::new("full_name_format");
        err.message = Some("Player name must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a shirt number: 1 through 99.
pub fn validate_jersey_number(number: u8) -> Result<(), ValidationError> {
    if !(1..=99).contains(&number) {
        let mut err = ValidationError::new("jersey_number_range");
        err.message = Some(format!("Jersey number must be between 1 and 99 (got {number})").into());
        return Err(err);
    }
    Ok(())
}
