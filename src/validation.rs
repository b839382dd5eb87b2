//! Client-side form rules.
//!
//! Everything here runs before a request is built; a failure never reaches
//! the gateway.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{name_exists, Category, Credentials, NewCategory, Registration};

/// Characters the password policy accepts as "special".
const PASSWORD_SPECIALS: &str = "@$!%*?&";

const MIN_PASSWORD_LEN: usize = 8;
const MIN_NAME_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
    })
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email.trim())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(ValidationError::new("email", "Please enter a valid email address."))
    }
}

/// Sign-up policy: 8+ characters from `[A-Za-z0-9@$!%*?&]` with at least one
/// lowercase, uppercase, digit and special character.
pub fn validate_password_policy(password: &str) -> Result<(), ValidationError> {
    let allowed = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c));
    let ok = allowed
        && password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c));

    if ok {
        Ok(())
    } else {
        Err(ValidationError::new(
            "password",
            "Password must be at least 8 characters and include uppercase, lowercase, number, and special character.",
        ))
    }
}

pub fn validate_sign_in(credentials: &Credentials) -> Result<(), ValidationError> {
    validate_email(&credentials.email)?;
    if credentials.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::new(
            "password",
            "Password must be at least 8 characters.",
        ));
    }
    Ok(())
}

pub fn validate_sign_up(form: &Registration) -> Result<(), ValidationError> {
    validate_email(&form.email)?;
    validate_password_policy(&form.password)?;
    if form.password != form.re_password {
        return Err(ValidationError::new("re_password", "Passwords do not match"));
    }
    if form.first_name.trim().chars().count() < MIN_NAME_LEN {
        return Err(ValidationError::new(
            "first_name",
            "First name must be at least 2 characters",
        ));
    }
    if form.last_name.trim().chars().count() < MIN_NAME_LEN {
        return Err(ValidationError::new(
            "last_name",
            "Last name must be at least 2 characters",
        ));
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.is_empty() {
        Err(ValidationError::new("title", "Title is required"))
    } else {
        Ok(())
    }
}

fn is_hex_color(color: &str) -> bool {
    let Some(hex) = color.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

/// Validate a new category against the currently loaded list.
pub fn validate_new_category(
    name: &str,
    color: &str,
    existing: &[Category],
) -> Result<NewCategory, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::new("name", "Name is required"));
    }
    if color.trim().is_empty() {
        return Err(ValidationError::new("color", "Color is required"));
    }
    if !is_hex_color(color.trim()) {
        return Err(ValidationError::new("color", "Color must be a hex value like #EF9C66"));
    }
    if name_exists(existing, name) {
        return Err(ValidationError::new("name", "Category already exists"));
    }
    Ok(NewCategory {
        name: name.to_string(),
        color: color.trim().to_uppercase(),
    })
}
