use std::borrow::Cow;
use std::str::FromStr;

use serde_json::Value;
use validator::{ValidateEmail, ValidationError};

pub const TEXT_MAX_LENGTH: usize = 255;
pub const EMAIL_MAX_LENGTH: usize = 255;
pub const USERNAME_MAX_LENGTH: usize = 150;
pub const NAME_MAX_LENGTH: usize = 150;
pub const PASSWORD_MIN_LENGTH: usize = 8;

fn field_error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

pub fn required() -> ValidationError {
    field_error("required", "This field is required.")
}

fn blank() -> ValidationError {
    field_error("blank", "This field may not be blank.")
}

fn too_long(max: usize) -> ValidationError {
    field_error(
        "max_length",
        format!("Ensure this field has no more than {max} characters."),
    )
}

/// Checks if a string is a syntactically valid email address.
pub fn is_valid_email(email: &str) -> bool {
    email.validate_email()
}

/// Non-blank text bounded at `max` characters.
pub fn validate_required_text(value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(blank());
    }
    validate_optional_text(value, max)
}

/// Text that may be blank, bounded at `max` characters.
pub fn validate_optional_text(value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(too_long(max));
    }
    Ok(())
}

pub fn validate_email_address(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(blank());
    }
    if !is_valid_email(value) {
        return Err(field_error("invalid", "Enter a valid email address."));
    }
    validate_optional_text(value, EMAIL_MAX_LENGTH)
}

/// Usernames allow letters, digits and `@ . + - _`.
pub fn validate_username(value: &str) -> Result<(), ValidationError> {
    validate_required_text(value, USERNAME_MAX_LENGTH)?;
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !value.chars().all(allowed) {
        return Err(field_error(
            "invalid",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }
    Ok(())
}

pub fn validate_password(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(blank());
    }
    if value.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(field_error(
            "password_too_short",
            format!(
                "This password is too short. It must contain at least {PASSWORD_MIN_LENGTH} characters."
            ),
        ));
    }
    Ok(())
}

pub fn validate_person_name(value: &str) -> Result<(), ValidationError> {
    validate_optional_text(value, NAME_MAX_LENGTH)
}

fn not_null() -> ValidationError {
    field_error("null", "This field may not be null.")
}

/// Reads a submitted text value with surrounding whitespace removed.
/// Numbers are taken as their decimal text.
pub fn text_input(raw: &Value) -> Result<String, ValidationError> {
    match raw {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Err(not_null()),
        _ => Err(field_error("invalid", "Not a valid string.")),
    }
}

pub fn parse_choice<T>(raw: &Value) -> Result<T, ValidationError>
where
    T: FromStr,
    T::Err: ToString,
{
    let value = match raw {
        Value::String(s) => s.clone(),
        Value::Null => return Err(not_null()),
        other => other.to_string(),
    };
    value
        .parse()
        .map_err(|e: T::Err| field_error("invalid_choice", e.to_string()))
}

/// Accepts JSON integers, integral floats and numeric strings that fit in 32 bits.
pub fn parse_integer(raw: &Value) -> Result<i32, ValidationError> {
    let invalid = || field_error("invalid", "A valid integer is required.");

    let wide: i64 = match raw {
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i,
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e18 => f as i64,
            _ => return Err(invalid()),
        },
        Value::String(s) => s.trim().parse().map_err(|_| invalid())?,
        Value::Null => return Err(not_null()),
        _ => return Err(invalid()),
    };

    if wide > i64::from(i32::MAX) {
        return Err(field_error(
            "max_value",
            format!("Ensure this value is less than or equal to {}.", i32::MAX),
        ));
    }
    if wide < i64::from(i32::MIN) {
        return Err(field_error(
            "min_value",
            format!("Ensure this value is greater than or equal to {}.", i32::MIN),
        ));
    }
    // In range after the checks above.
    Ok(wide as i32)
}
