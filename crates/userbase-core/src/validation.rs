//! Validation utilities.

use crate::{FieldError, UserbaseError};
use validator::{Validate, ValidationErrors};

/// Extension trait for validation.
pub trait ValidateExt: Validate {
    /// Validates the struct and returns a `UserbaseError` on failure.
    fn validate_request(&self) -> Result<(), UserbaseError> {
        self.validate().map_err(|e| validation_errors_to_userbase_error(&e))
    }
}

impl<T: Validate> ValidateExt for T {}

/// Flattens `validator::ValidationErrors` into field errors, sorted by field.
#[must_use]
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldError {
                field: (*field).to_string(),
                message: error
                    .message
                    .as_ref()
                    .map_or_else(|| error.code.to_string(), ToString::to_string),
                code: error.code.to_string(),
            })
        })
        .collect();
    fields.sort_by(|a, b| a.field.cmp(&b.field));
    fields
}

/// Converts `validator::ValidationErrors` to `UserbaseError`.
#[must_use]
pub fn validation_errors_to_userbase_error(errors: &ValidationErrors) -> UserbaseError {
    let message = field_errors(errors)
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ");

    UserbaseError::Validation(message)
}

/// Common validation functions.
pub mod rules {
    use validator::ValidationError;

    /// Validates that a string is not blank (not empty after trimming).
    pub fn not_blank(value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::new("not_blank"));
        }
        Ok(())
    }

    /// Validates a phone number: an optional leading `+`, then 7 to 15
    /// digits, with spaces, dashes and parentheses allowed as separators.
    pub fn phone_number(value: &str) -> Result<(), ValidationError> {
        let trimmed = value.trim();
        let body = trimmed.strip_prefix('+').unwrap_or(trimmed);

        if !body
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')'))
        {
            return Err(ValidationError::new("phone_invalid_characters"));
        }

        let digits = body.chars().filter(char::is_ascii_digit).count();
        if !(7..=15).contains(&digits) {
            return Err(ValidationError::new("phone_invalid_length"));
        }
        Ok(())
    }

    /// Canonical stored form of a phone number: the leading `+`, if any,
    /// followed by its digits.
    #[must_use]
    pub fn canonical_phone(value: &str) -> String {
        let trimmed = value.trim();
        let prefix = if trimmed.starts_with('+') { "+" } else { "" };
        let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
        format!("{prefix}{digits}")
    }
}
