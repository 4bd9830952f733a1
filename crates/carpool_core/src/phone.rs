//! Phone number normalization for directory lookups.
//!
//! # Responsibility
//! - Normalize user-entered phone numbers into one canonical `+digits` key.
//! - Provide display formatting for known national layouts.
//!
//! # Invariants
//! - Normalized numbers contain only `+` and ASCII digits, start with `+` and are
//!   8..=16 characters long.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

const MIN_NORMALIZED_LEN: usize = 8;
const MAX_NORMALIZED_LEN: usize = 16;
const ISRAEL_PREFIX: &str = "+972";

static NON_PHONE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9+]").expect("valid phone separator regex"));

/// Phone validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    MissingCountryCode,
    TooShort,
    TooLong,
}

impl Display for PhoneError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCountryCode => {
                write!(f, "phone number must include country code (e.g., +972)")
            }
            Self::TooShort => write!(f, "phone number is too short"),
            Self::TooLong => write!(f, "phone number is too long"),
        }
    }
}

impl Error for PhoneError {}

/// Strips separators and validates the result.
///
/// # Errors
/// - `MissingCountryCode` unless the cleaned number starts with `+`.
/// - `TooShort` / `TooLong` outside 8..=16 characters.
pub fn validate_phone_number(phone: &str) -> Result<String, PhoneError> {
    let cleaned = strip_phone(phone);
    if !cleaned.starts_with('+') {
        return Err(PhoneError::MissingCountryCode);
    }
    if cleaned.len() < MIN_NORMALIZED_LEN {
        return Err(PhoneError::TooShort);
    }
    if cleaned.len() > MAX_NORMALIZED_LEN {
        return Err(PhoneError::TooLong);
    }
    Ok(cleaned)
}

/// Formats a number for display: `+972 50-123-4567` for Israeli numbers,
/// otherwise the stripped number.
pub fn format_phone_number(phone: &str) -> String {
    let cleaned = strip_phone(phone);
    if let Some(national) = cleaned.strip_prefix(ISRAEL_PREFIX) {
        if national.len() >= 9 && national.is_ascii() {
            return format!(
                "{ISRAEL_PREFIX} {}-{}-{}",
                &national[..2],
                &national[2..5],
                &national[5..]
            );
        }
    }
    cleaned
}

fn strip_phone(phone: &str) -> String {
    NON_PHONE_CHARS.replace_all(phone, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::{format_phone_number, validate_phone_number, PhoneError};

    #[test]
    fn validate_strips_separators() {
        assert_eq!(
            validate_phone_number("+972 (50) 123-4567").unwrap(),
            "+972501234567"
        );
    }

    #[test]
    fn validate_rejects_bad_numbers() {
        assert_eq!(
            validate_phone_number("0501234567").unwrap_err(),
            PhoneError::MissingCountryCode
        );
        assert_eq!(validate_phone_number("+12345").unwrap_err(), PhoneError::TooShort);
        assert_eq!(
            validate_phone_number("+12345678901234567").unwrap_err(),
            PhoneError::TooLong
        );
    }

    #[test]
    fn non_ascii_digits_are_stripped() {
        assert_eq!(
            validate_phone_number("+٩٧٢٥٠١٢٣٤٥٦٧").unwrap_err(),
            PhoneError::TooShort
        );
        assert_eq!(
            validate_phone_number("+972٥501234567").unwrap(),
            "+972501234567"
        );
        assert_eq!(format_phone_number("+٩٧٢٥٠١"), "+");
    }

    #[test]
    fn format_uses_israeli_layout_when_possible() {
        assert_eq!(format_phone_number("+972501234567"), "+972 50-123-4567");
        assert_eq!(format_phone_number("+1 (555) 010-9999"), "+15550109999");
    }
}
