pub mod bootstrap;
pub mod jwt;
pub mod password;

use crate::error::AppError;

/// Trims and lowercases an email, rejecting anything without a `local@domain.tld` shape.
pub fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(email)
    } else {
        Err(AppError::validation("A valid email is required"))
    }
}
