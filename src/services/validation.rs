/// Input validation shared by the resource services
use crate::error::{ApiError, ApiResult};

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Trimmed value of a required text field, or a 422 naming the field.
pub fn required(value: Option<&str>, field: &str) -> ApiResult<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ApiError::validation(format!("Invalid inputs: {} is required", field))),
    }
}

/// Lowercase and trim so lookups and the unique index agree
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate email format: one '@', non-empty local part, dotted domain
pub fn validate_email(email: &str) -> Result<(), String> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err("email must contain '@'".to_string());
    };

    if local.is_empty() {
        return Err("email is missing the part before '@'".to_string());
    }
    if domain.contains('@') {
        return Err("email must contain exactly one '@'".to_string());
    }
    if email.chars().any(char::is_whitespace) {
        return Err("email must not contain whitespace".to_string());
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err("email domain is invalid".to_string());
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ));
    }
    Ok(())
}
