//! Crate error type.

use thiserror::Error;

use crate::validation::ValidationError;

/// Result alias for fallible constructors.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised when a scheduler cannot be constructed.
///
/// Scheduling itself never fails: infeasible patients are returned as data.
#[derive(Debug, Error)]
pub enum Error {
    /// Input failed validation; every detected problem is listed.
    #[error("invalid scheduling input: {}", join_messages(.0))]
    Validation(Vec<ValidationError>),
}

impl Error {
    /// Validation errors carried by this error.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            Error::Validation(errors) => errors,
        }
    }
}

impl From<Vec<ValidationError>> for Error {
    fn from(errors: Vec<ValidationError>) -> Self {
        Error::Validation(errors)
    }
}

impl From<ValidationError> for Error {
    fn from(error: ValidationError) -> Self {
        Error::Validation(vec![error])
    }
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_error_display_joins_messages() {
        let err = Error::from(vec![
            ValidationError::new(ValidationErrorKind::EmptyDoctors, "Doctor list is empty"),
            ValidationError::new(ValidationErrorKind::EmptyPatients, "Patient list is empty"),
        ]);
        assert_eq!(
            err.to_string(),
            "invalid scheduling input: Doctor list is empty; Patient list is empty"
        );
        assert_eq!(err.validation_errors().len(), 2);
    }
}
