//! Request validation
//!
//! Request types derive [`validator::Validate`]. [`check`] runs the derived
//! rules and reports every failure as a [`FieldError`] inside
//! [`AppError::Validation`].

use std::borrow::Cow;

use serde::Serialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{AppError, AppResult};

/// One failed validation rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub rule: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, rule: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            rule: rule.to_string(),
            message: message.into(),
        }
    }
}

/// Value must contain a non-whitespace character
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("required");
        error.message = Some(Cow::from("is required"));
        return Err(error);
    }
    Ok(())
}

/// Runs the derived rules of `request`
pub fn check<T: Validate>(request: &T) -> AppResult<()> {
    request
        .validate()
        .map_err(|errors| AppError::Validation(field_errors(&errors)))
}

/// Flattens field-level failures, ordered by field name
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, failures)| {
            let field = field.to_string();
            failures.iter().map(move |failure| {
                let message = match &failure.message {
                    Some(message) => format!("{} {}", field, message),
                    None => format!("{} is invalid", field),
                };
                FieldError::new(&field, &failure.code, message)
            })
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}
