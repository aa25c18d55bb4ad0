//! Validation helpers for DTOs.

use validator::ValidationError;

/// Number of digits in a local phone number.
const PHONE_DIGITS: usize = 10;
/// Country prefix prepended to every stored number.
const PHONE_PREFIX: &str = "+1";

/// Normalise a phone number to `+1XXXXXXXXXX`.
///
/// Every non-digit is dropped; the remainder must be exactly ten digits.
///
/// # Examples
///
/// ```ignore
/// normalize_phone("(555) 123-4567") // Some("+15551234567")
/// normalize_phone("555-1234")       // None
/// ```
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    (digits.len() == PHONE_DIGITS).then(|| format!("{PHONE_PREFIX}{digits}"))
}

/// Validates that a phone number normalises to ten digits.
pub fn validate_phone(raw: &str) -> Result<(), ValidationError> {
    if normalize_phone(raw).is_some() {
        return Ok(());
    }
    let mut err = ValidationError::new("phone_format");
    err.message = Some("Phone number must contain exactly 10 digits".into());
    Err(err)
}

/// Validates that a text field holds more than whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_numbers_are_normalized() {
        assert_eq!(normalize_phone("5551234567").as_deref(), Some("+15551234567"));
        assert_eq!(normalize_phone("(555) 123-4567").as_deref(), Some("+15551234567"));
        assert_eq!(normalize_phone(" 555.123.4567 ").as_deref(), Some("+15551234567"));
    }

    #[test]
    fn wrong_digit_counts_are_rejected() {
        assert!(normalize_phone("555-1234").is_none());
        assert!(normalize_phone("+1 555 123 4567").is_none()); // 11 digits
        assert!(normalize_phone("").is_none());
        assert!(validate_phone("abc").is_err());
    }

    #[test]
    fn blank_values_are_rejected() {
        assert!(validate_not_blank("  ").is_err());
        assert!(validate_not_blank(" Jo ").is_ok());
    }
}
