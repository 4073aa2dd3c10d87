//! Custom field validators used by the request contracts.

use std::borrow::Cow;

use validator::ValidationError;

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Rejects strings that are empty after trimming.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid("blank", "Must not be blank"));
    }
    Ok(())
}

/// Validates a tenant slug: lowercase letters, digits and single dashes.
pub fn validate_slug(value: &str) -> Result<(), ValidationError> {
    let well_formed = value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !value.starts_with('-')
        && !value.ends_with('-')
        && !value.contains("--");

    if !well_formed {
        return Err(invalid(
            "invalid_slug",
            "Slug may contain lowercase letters, digits and single dashes only",
        ));
    }
    Ok(())
}

/// Validates a snake_case identifier such as a module code.
pub fn validate_snake_case(value: &str) -> Result<(), ValidationError> {
    let mut chars = value.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_lowercase());
    let rest_ok = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if !starts_with_letter || !rest_ok || value.ends_with('_') {
        return Err(invalid(
            "invalid_code",
            "Code must be snake_case and start with a letter",
        ));
    }
    Ok(())
}

/// Requires at least one letter and one digit.
pub fn validate_password_strength(value: &str) -> Result<(), ValidationError> {
    let has_letter = value.chars().any(char::is_alphabetic);
    let has_digit = value.chars().any(|c| c.is_ascii_digit());

    if !(has_letter && has_digit) {
        return Err(invalid(
            "weak_password",
            "Password must contain at least one letter and one digit",
        ));
    }
    Ok(())
}
