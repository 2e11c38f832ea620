//! Input validators for public SDK operations.
//!
//! Every validator takes the name of the calling operation as `context`, so
//! errors read like `readData error: key must be a non-empty string`.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::ValidationError;

/// Maximum length of an external-data key.
pub const MAX_KEY_LENGTH: usize = 64;

/// Minimum length of an API key.
pub const MIN_API_KEY_LENGTH: usize = 4;

fn locale_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z]{2}$").expect("locale pattern is valid"))
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
            .expect("email pattern is valid")
    })
}

/// External-data key: non-empty, at most 64 characters.
pub fn validate_key(key: &str, context: &str) -> Result<(), ValidationError> {
    if key.is_empty() || key.chars().count() > MAX_KEY_LENGTH {
        return Err(ValidationError::required(context, "key"));
    }
    Ok(())
}

pub fn validate_token(token: &str, context: &str) -> Result<(), ValidationError> {
    if token.is_empty() {
        return Err(ValidationError::required(context, "token"));
    }
    Ok(())
}

pub fn validate_api_url(api_url: &str, context: &str) -> Result<(), ValidationError> {
    if api_url.trim().is_empty() {
        return Err(ValidationError::required(context, "apiUrl"));
    }
    Ok(())
}

/// API key: at least four characters. The key itself is never echoed back.
pub fn validate_api_key(api_key: &str, context: &str) -> Result<(), ValidationError> {
    let length = api_key.chars().count();
    if length < MIN_API_KEY_LENGTH {
        return Err(ValidationError::invalid(
            context,
            "apiKey",
            format!(
                "expected at least {} characters, got {}",
                MIN_API_KEY_LENGTH, length
            ),
        ));
    }
    Ok(())
}

pub fn validate_context_id(context_id: &str, context: &str) -> Result<(), ValidationError> {
    if context_id.is_empty() {
        return Err(ValidationError::required(context, "x-context-id"));
    }
    Ok(())
}

/// Two lowercase ASCII letters, e.g. `en` or `de`.
pub fn validate_locale(locale: &str, context: &str) -> Result<(), ValidationError> {
    if !locale_pattern().is_match(locale) {
        return Err(ValidationError::invalid(
            context,
            "locale",
            format!("{:?} is not a two-letter language code", locale),
        ));
    }
    Ok(())
}

pub fn validate_subject(subject: &str, context: &str) -> Result<(), ValidationError> {
    if subject.is_empty() {
        return Err(ValidationError::required(context, "subject"));
    }
    Ok(())
}

pub fn validate_message(message: &str, context: &str) -> Result<(), ValidationError> {
    if message.is_empty() {
        return Err(ValidationError::required(context, "message"));
    }
    Ok(())
}

/// Check whether a string looks like a deliverable email address.
pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

pub fn validate_email(email: &str, context: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::required(context, "email"));
    }
    if !is_valid_email(email) {
        return Err(ValidationError::invalid(
            context,
            "email",
            format!("{:?} is not a valid address", email),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod tests;
