//! Registration input validation.
//!
//! The sign-up and login handlers reject malformed input before touching
//! the database. Patterns follow the original service contract: login ids
//! are 4-16 alphanumeric characters, passwords are 8-16 characters mixing
//! letters, digits and symbols, nicknames allow hangul, and business
//! registration numbers are `000-00-00000`.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::CoreError;

static LOGIN_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{4,16}$").expect("valid regex"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-zA-Z._%+-]+@[0-9a-zA-Z.-]+\.[a-zA-Z]{2,6}$").expect("valid regex")
});

static NICKNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-zA-Z가-힣]{1,20}$").expect("valid regex"));

static BIRTH_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{8}$").expect("valid regex"));

static REGISTRATION_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{3}-[0-9]{2}-[0-9]{5}$").expect("valid regex"));

/// Validate a login id.
///
/// # Errors
///
/// Returns [`CoreError::InvalidField`] when empty or not 4-16 alphanumeric.
pub fn login_id(value: &str) -> Result<(), CoreError> {
    if value.is_empty() {
        return Err(CoreError::InvalidField {
            field: "login_id",
            reason: "must not be empty",
        });
    }
    if !LOGIN_ID_RE.is_match(value) {
        return Err(CoreError::InvalidField {
            field: "login_id",
            reason: "must be 4-16 alphanumeric characters",
        });
    }
    Ok(())
}

/// Validate an e-mail address.
///
/// # Errors
///
/// Returns [`CoreError::InvalidField`] when empty or malformed.
pub fn email(value: &str) -> Result<(), CoreError> {
    if value.is_empty() {
        return Err(CoreError::InvalidField {
            field: "email",
            reason: "must not be empty",
        });
    }
    if !EMAIL_RE.is_match(value) {
        return Err(CoreError::InvalidField {
            field: "email",
            reason: "must look like user@domain.tld",
        });
    }
    Ok(())
}

/// Validate a password: 8-16 characters with at least one letter, one digit
/// and one symbol.
///
/// # Errors
///
/// Returns [`CoreError::InvalidField`] when the policy is not met.
pub fn password(value: &str) -> Result<(), CoreError> {
    if value.is_empty() {
        return Err(CoreError::InvalidField {
            field: "password",
            reason: "must not be empty",
        });
    }
    let len = value.chars().count();
    let has_letter = value.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = value.chars().any(|c| c.is_ascii_digit());
    let has_symbol = value.chars().any(|c| c.is_ascii_punctuation());
    if !(8..=16).contains(&len) || !has_letter || !has_digit || !has_symbol {
        return Err(CoreError::InvalidField {
            field: "password",
            reason: "must be 8-16 characters mixing letters, digits and symbols",
        });
    }
    Ok(())
}

/// Validate a nickname (also used for store names).
///
/// # Errors
///
/// Returns [`CoreError::InvalidField`] when empty or containing characters
/// outside alphanumerics and hangul.
pub fn nickname(value: &str) -> Result<(), CoreError> {
    if value.is_empty() {
        return Err(CoreError::InvalidField {
            field: "nickname",
            reason: "must not be empty",
        });
    }
    if !NICKNAME_RE.is_match(value) {
        return Err(CoreError::InvalidField {
            field: "nickname",
            reason: "must be 1-20 alphanumeric or hangul characters",
        });
    }
    Ok(())
}

/// Validate a birth date in `YYYYMMDD` form.
///
/// # Errors
///
/// Returns [`CoreError::InvalidField`] when not eight digits.
pub fn birth_date(value: &str) -> Result<(), CoreError> {
    if !BIRTH_DATE_RE.is_match(value) {
        return Err(CoreError::InvalidField {
            field: "birth_date",
            reason: "must be eight digits (YYYYMMDD)",
        });
    }
    Ok(())
}

/// Validate a business registration number (`000-00-00000`).
///
/// # Errors
///
/// Returns [`CoreError::InvalidField`] when the shape is wrong.
pub fn registration_number(value: &str) -> Result<(), CoreError> {
    if value.is_empty() {
        return Err(CoreError::InvalidField {
            field: "registration_number",
            reason: "must not be empty",
        });
    }
    if !REGISTRATION_NUMBER_RE.is_match(value) {
        return Err(CoreError::InvalidField {
            field: "registration_number",
            reason: "must match 000-00-00000",
        });
    }
    Ok(())
}

/// Validate a non-empty free-form field such as an address.
///
/// # Errors
///
/// Returns [`CoreError::InvalidField`] when empty.
pub fn non_empty(field: &'static str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::InvalidField {
            field,
            reason: "must not be empty",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_id_rules() {
        assert!(login_id("user1234").is_ok());
        assert!(login_id("abcd").is_ok());
        assert!(login_id("abc").is_err()); // too short
        assert!(login_id("a".repeat(17).as_str()).is_err()); // too long
        assert!(login_id("user name").is_err()); // whitespace
        assert!(login_id("").is_err());
    }

    #[test]
    fn email_rules() {
        assert!(email("a@b.co").is_ok());
        assert!(email("first.last+tag@example.org").is_ok());
        assert!(email("not-an-email").is_err());
        assert!(email("@missing.local").is_err());
        assert!(email("").is_err());
    }

    #[test]
    fn password_rules() {
        assert!(password("abc123!@").is_ok());
        assert!(password("Passw0rd!").is_ok());
        assert!(password("short1!").is_err()); // 7 chars
        assert!(password("alllowercase!").is_err()); // no digit
        assert!(password("12345678!").is_err()); // no letter
        assert!(password("abcd1234").is_err()); // no symbol
    }

    #[test]
    fn nickname_rules() {
        assert!(nickname("neighbor7").is_ok());
        assert!(nickname("가게주인").is_ok());
        assert!(nickname("bad name").is_err());
        assert!(nickname("").is_err());
    }

    #[test]
    fn registration_number_rules() {
        assert!(registration_number("123-45-67890").is_ok());
        assert!(registration_number("1234567890").is_err());
        assert!(registration_number("12-345-6789").is_err());
    }

    #[test]
    fn birth_date_rules() {
        assert!(birth_date("19990101").is_ok());
        assert!(birth_date("1999-01-01").is_err());
    }
}
