use std::sync::LazyLock;

use regex::Regex;
use shared::{
    domain::{Field, FieldErrors, SubmissionRequest, ValidationResult},
    error::FieldError,
};

/// `local-part@domain.tld`: no whitespace or `@` in either part, a dot, then
/// at least two letters.
static RE_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[A-Za-z]{2,}$").expect("email pattern compiles")
});

pub fn is_valid_email(value: &str) -> bool {
    RE_EMAIL.is_match(value)
}

pub fn validate(request: &SubmissionRequest) -> ValidationResult {
    let mut errors = FieldErrors::default();

    for field in Field::ALL {
        if let Some(error) = check_field(field, request.value(field)) {
            errors.insert(field, error);
        }
    }

    errors.into()
}

fn check_field(field: Field, value: &str) -> Option<FieldError> {
    let value = value.trim();
    if value.is_empty() {
        return Some(FieldError::Required(field));
    }

    match field {
        Field::Email if !is_valid_email(value) => Some(FieldError::InvalidFormat(field)),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
