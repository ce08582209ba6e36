use lazy_static::lazy_static;
use regex::Regex;

use super::dto::RegisterRequest;
use crate::error::{AuthError, FieldError};

pub const MIN_NAME_CHARS: usize = 2;
pub const MIN_PASSWORD_CHARS: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Emails are compared case-insensitively everywhere, so they are stored
/// and looked up in this form.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A registration that passed every field check.
#[derive(Debug)]
pub struct ValidRegistration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Checks every field and reports all violations at once.
pub fn validate_registration(req: RegisterRequest) -> Result<ValidRegistration, AuthError> {
    let name = req.name.trim().to_string();
    let email = normalize_email(&req.email);
    let mut errors = Vec::new();

    if name.chars().count() < MIN_NAME_CHARS {
        errors.push(FieldError::new(
            "name",
            format!("Name must be at least {MIN_NAME_CHARS} characters"),
        ));
    }
    if email.is_empty() {
        errors.push(FieldError::new("email", "Email is required"));
    } else if !is_valid_email(&email) {
        errors.push(FieldError::new("email", "Email is invalid"));
    }
    if req.password.chars().count() < MIN_PASSWORD_CHARS {
        errors.push(FieldError::new(
            "password",
            format!("Password must be at least {MIN_PASSWORD_CHARS} characters"),
        ));
    }

    if !errors.is_empty() {
        return Err(AuthError::Validation(errors));
    }
    Ok(ValidRegistration {
        name,
        email,
        password: req.password,
    })
}
