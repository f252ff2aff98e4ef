//! Input validation helpers shared by the auth and catalog services.

use crate::error::{AppError, FieldError, Result};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Collects field errors so a request can report every problem at once.
#[derive(Debug, Default)]
pub struct FieldChecks {
    errors: Vec<FieldError>,
}

impl FieldChecks {
    /// Start an empty set of checks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a single field validator.
    pub fn check(&mut self, field: &str, outcome: std::result::Result<(), String>) {
        if let Err(message) = outcome {
            self.errors.push(FieldError::new(field, message));
        }
    }

    /// Require a non-blank string. Returns the trimmed value when present.
    pub fn required(&mut self, field: &str, label: &str, value: Option<&str>) -> Option<String> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Some(v.to_string()),
            _ => {
                self.errors
                    .push(FieldError::new(field, format!("{} is required", label)));
                None
            }
        }
    }

    /// Require a non-blank JSON string. Numbers, arrays and other non-string
    /// values are reported against the field instead of failing the body.
    pub fn text(&mut self, field: &str, label: &str, value: Option<&Value>) -> Option<String> {
        match value {
            None | Some(Value::Null) => self.required(field, label, None),
            Some(Value::String(s)) => self.required(field, label, Some(s)),
            Some(_) => {
                self.errors
                    .push(FieldError::new(field, format!("{} must be a string", label)));
                None
            }
        }
    }

    /// Turn collected failures into a validation error.
    pub fn finish(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors))
        }
    }
}

/// Validate a display name.
pub fn validate_username(username: &str) -> std::result::Result<(), String> {
    if username.trim().is_empty() {
        return Err("Username is required".to_string());
    }

    if username.chars().count() > 64 {
        return Err("Username must be at most 64 characters long".to_string());
    }

    Ok(())
}

/// Validate an email address.
pub fn validate_email(email: &str) -> std::result::Result<(), String> {
    if email.is_empty() {
        return Err("Valid email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Valid email is required".to_string());
    }

    Ok(())
}

/// Validate a new password against the configured minimum length.
pub fn validate_password(password: &str, min_length: usize) -> std::result::Result<(), String> {
    if password.chars().count() < min_length {
        return Err(format!(
            "Password must be at least {} characters",
            min_length
        ));
    }

    Ok(())
}

/// Normalize an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("a.b+c@mail.example.org").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("alice").is_err());
        assert!(validate_email("alice@example").is_err());
        assert!(validate_email("alice @example.com").is_err());
    }

    #[test]
    fn test_password_length() {
        assert!(validate_password("123456", 6).is_ok());
        assert!(validate_password("12345", 6).is_err());
    }

    #[test]
    fn test_username() {
        assert!(validate_username("Alice Liddell").is_ok());
        assert!(validate_username("   ").is_err());
        assert!(validate_username(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_field_checks_collects_every_failure() {
        let mut checks = FieldChecks::new();
        assert_eq!(
            checks.required("title", "Title", Some("  Dune ")),
            Some("Dune".to_string())
        );
        assert_eq!(checks.required("author", "Author", Some("   ")), None);
        assert_eq!(checks.required("genre", "Genre", None), None);

        match checks.finish() {
            Err(AppError::Validation(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["author", "genre"]);
                assert_eq!(errors[0].message, "Author is required");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_text_reports_wrong_types() {
        let mut checks = FieldChecks::new();
        let title = serde_json::json!(" Dune ");
        let author = serde_json::json!(123);
        let genre = serde_json::json!(["Science Fiction"]);

        assert_eq!(
            checks.text("title", "Title", Some(&title)),
            Some("Dune".to_string())
        );
        assert_eq!(checks.text("author", "Author", Some(&author)), None);
        assert_eq!(checks.text("genre", "Genre", Some(&genre)), None);
        assert_eq!(checks.text("notes", "Notes", Some(&Value::Null)), None);

        match checks.finish() {
            Err(AppError::Validation(errors)) => {
                let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
                assert_eq!(
                    messages,
                    vec![
                        "Author must be a string",
                        "Genre must be a string",
                        "Notes is required"
                    ]
                );
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }
}
