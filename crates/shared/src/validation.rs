//! Common validation utilities.

use validator::ValidationError;

/// Exact number of digits in a national ID.
pub const NATIONAL_ID_LENGTH: usize = 16;

/// Minimum phone number length in characters.
const MIN_PHONE_LENGTH: usize = 10;

/// Maximum phone number length in characters.
const MAX_PHONE_LENGTH: usize = 16;

/// Minimum digits in a phone number once separators are stripped.
const MIN_PHONE_DIGITS: usize = 8;

lazy_static::lazy_static! {
    /// Event short codes: three uppercase ASCII letters.
    pub static ref EVENT_CODE_REGEX: regex::Regex = regex::Regex::new(r"^[A-Z]{3}$").unwrap();
    static ref PHONE_REGEX: regex::Regex = regex::Regex::new(r"^[0-9+\- ]+$").unwrap();
}

/// Validates that a national ID is exactly 16 ASCII digits.
pub fn validate_national_id(national_id: &str) -> Result<(), ValidationError> {
    if national_id.len() == NATIONAL_ID_LENGTH && national_id.bytes().all(|b| b.is_ascii_digit())
    {
        Ok(())
    } else {
        let mut err = ValidationError::new("national_id_format");
        err.message = Some("National ID must be exactly 16 digits".into());
        Err(err)
    }
}

/// Validates a phone number: 10-16 characters of digits, `+`, `-` or space.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let len = phone.chars().count();
    if !(MIN_PHONE_LENGTH..=MAX_PHONE_LENGTH).contains(&len) {
        let mut err = ValidationError::new("phone_length");
        err.message = Some("Phone number must be between 10 and 16 characters".into());
        return Err(err);
    }

    if !PHONE_REGEX.is_match(phone) {
        let mut err = ValidationError::new("phone_format");
        err.message = Some("Phone number may only contain digits, +, - and spaces".into());
        return Err(err);
    }

    if phone.bytes().filter(u8::is_ascii_digit).count() < MIN_PHONE_DIGITS {
        let mut err = ValidationError::new("phone_digits");
        err.message = Some("Phone number must contain at least 8 digits".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a string has visible content.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value cannot be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Minimum visible characters in a free-text lookup.
pub const MIN_SEARCH_QUERY_LENGTH: usize = 2;

/// Validates a free-text lookup: at least two characters once trimmed, so
/// whitespace never widens into a match-everything pattern.
pub fn validate_search_query(query: &str) -> Result<(), ValidationError> {
    if query.trim().chars().count() >= MIN_SEARCH_QUERY_LENGTH {
        Ok(())
    } else {
        let mut err = ValidationError::new("search_query_length");
        err.message = Some("Search query must contain at least 2 visible characters".into());
        Err(err)
    }
}

/// Validates an event short code.
pub fn validate_event_code(code: &str) -> Result<(), ValidationError> {
    if EVENT_CODE_REGEX.is_match(code) {
        Ok(())
    } else {
        let mut err = ValidationError::new("event_code_format");
        err.message = Some("Event code must be exactly 3 uppercase letters".into());
        Err(err)
    }
}

/// Canonical form used for email uniqueness checks.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Canonical form used for phone uniqueness checks: a leading `+` if one was
/// entered, then the digits. `0812-3456-7890` and `081234567890` are the
/// same phone.
pub fn normalize_phone(phone: &str) -> String {
    let phone = phone.trim();
    let mut canonical = String::with_capacity(phone.len());
    if phone.starts_with('+') {
        canonical.push('+');
    }
    canonical.extend(phone.chars().filter(|c| c.is_ascii_digit()));
    canonical
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_national_id() {
        assert!(validate_national_id("1234567890123456").is_ok());
        assert!(validate_national_id("0000000000000000").is_ok());
        assert!(validate_national_id("123456789012345").is_err());
        assert!(validate_national_id("12345678901234567").is_err());
        assert!(validate_national_id("12345678901234ab").is_err());
        assert!(validate_national_id("").is_err());
    }

    #[test]
    fn test_validate_national_id_rejects_unicode_digits() {
        // Arabic-Indic digits are numeric but not ASCII
        assert!(validate_national_id("١٢٣٤٥٦٧٨٩٠١٢٣٤٥٦").is_err());
    }

    #[test]
    fn test_validate_national_id_error_message() {
        let err = validate_national_id("123").unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "National ID must be exactly 16 digits"
        );
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("0812345678").is_ok());
        assert!(validate_phone("+62 812-3456-789").is_ok());
        assert!(validate_phone("1234567890123456").is_ok());
        assert!(validate_phone("123456789").is_err());
        assert!(validate_phone("12345678901234567").is_err());
        assert!(validate_phone("0812345678x").is_err());
        assert!(validate_phone("(081)2345678").is_err());
    }

    #[test]
    fn test_validate_phone_error_codes() {
        assert_eq!(validate_phone("123").unwrap_err().code, "phone_length");
        assert_eq!(
            validate_phone("08123456a8").unwrap_err().code,
            "phone_format"
        );
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("Ada").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank("   ").is_err());
    }

    #[test]
    fn test_validate_event_code() {
        assert!(validate_event_code("ABC").is_ok());
        assert!(validate_event_code("abc").is_err());
        assert!(validate_event_code("AB").is_err());
        assert!(validate_event_code("ABCD").is_err());
        assert!(validate_event_code("A1C").is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  A@X.Com "), "a@x.com");
        assert_eq!(normalize_email("a@x.com"), "a@x.com");
    }

    #[test]
    fn test_validate_search_query() {
        assert!(validate_search_query("Ana").is_ok());
        assert!(validate_search_query(" ab ").is_ok());
        assert_eq!(validate_search_query("  ").unwrap_err().code, "search_query_length");
        assert!(validate_search_query(" a ").is_err());
        assert!(validate_search_query("").is_err());
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone(" 0812345678 "), "0812345678");
        assert_eq!(normalize_phone("0812-3456-7890"), "081234567890");
        assert_eq!(normalize_phone("0812 3456 7890"), "081234567890");
        assert_eq!(normalize_phone("+62 812-3456-789"), "+628123456789");
    }

    #[test]
    fn test_normalize_phone_drops_inner_plus() {
        assert_eq!(normalize_phone("0812+3456+78"), "0812345678");
    }

    #[test]
    fn test_validate_phone_requires_digits() {
        assert_eq!(
            validate_phone("----------").unwrap_err().code,
            "phone_digits"
        );
        assert_eq!(validate_phone("+ 1 2 3 4 5 6").unwrap_err().code, "phone_digits");
    }
}
