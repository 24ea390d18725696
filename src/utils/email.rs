use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::OnceLock;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
            .expect("email regex")
    })
}

/// Trims the address and checks its shape. Missing or blank input is
/// reported with `missing_msg`.
pub fn validate_email(email: Option<&str>, missing_msg: &str) -> AppResult<String> {
    let email = email.map(str::trim).unwrap_or_default();
    if email.is_empty() {
        return Err(AppError::ValidationError(missing_msg.to_string()));
    }
    if !email_regex().is_match(email) {
        return Err(AppError::ValidationError("Invalid email format".to_string()));
    }
    Ok(email.to_string())
}
