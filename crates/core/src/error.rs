//! Domain error model.

use serde::Serialize;
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl core::fmt::Display for FieldError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Accumulator for field-level validation failures.
///
/// Validators push every failure they find instead of stopping at the first
/// one, so a client can correct all fields in a single round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    /// Whether any failure was recorded for `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// `Ok(value)` when nothing was recorded, otherwise a `Validation` error.
    pub fn finish<T>(self, value: T) -> DomainResult<T> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(DomainError::Validation(self))
        }
    }
}

impl From<FieldError> for ValidationErrors {
    fn from(value: FieldError) -> Self {
        Self(vec![value])
    }
}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl core::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            core::fmt::Display::fmt(e, f)?;
        }
        Ok(())
    }
}

/// Domain-level error.
///
/// Keep this focused on deterministic business failures (validation, missing
/// records, conflicts). Storage and transport failures belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// One or more fields failed validation. Client-correctable.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// An identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The identifier does not resolve to a record.
    #[error("{0} not found")]
    NotFound(String),

    /// The request conflicts with the current state (e.g. already paid).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    /// Single-field validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(FieldError::new(field, message).into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_returns_value_when_empty() {
        let errors = ValidationErrors::new();
        assert_eq!(errors.finish(7), Ok(7));
    }

    #[test]
    fn finish_collects_every_field() {
        let mut errors = ValidationErrors::new();
        errors.push("name", "name is required");
        errors.push("tax_id", "tax id must have exactly 11 digits");

        match errors.finish(()) {
            Err(DomainError::Validation(e)) => {
                assert_eq!(e.len(), 2);
                assert!(e.has_field("name"));
                assert!(e.has_field("tax_id"));
                assert!(!e.has_field("birth_date"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn display_joins_field_messages() {
        let mut errors = ValidationErrors::new();
        errors.push("a", "bad");
        errors.push("b", "worse");
        let err = DomainError::Validation(errors);
        assert_eq!(err.to_string(), "validation failed: a: bad; b: worse");
    }

    #[test]
    fn serializes_as_plain_list() {
        let errors: ValidationErrors = FieldError::new("amount", "must be positive").into();
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "field": "amount", "message": "must be positive" }])
        );
    }
}
