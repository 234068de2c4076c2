//! All error types for the respcode crate.
//!
//! [`Error`] is returned from fallible catalog, provider and translator
//! operations. [`ValidationError`] describes rejected generation input and is
//! always produced before any file is touched.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to write `{}`: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog `{}`: {reason}", path.display())]
    InvalidCatalog { path: PathBuf, reason: String },

    #[error("unknown group `{0}`")]
    UnknownGroup(String),

    #[error("unknown layout `{0}`")]
    UnknownLayout(String),

    #[error("translator driver `{0}` is not registered")]
    UnknownDriver(String),

    #[error("translation backend error: {0}")]
    Backend(String),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl Error {
    /// Wraps an I/O failure that happened while writing `path`.
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Write {
            path: path.into(),
            source,
        }
    }

    /// Creates a new backend error from any displayable message.
    pub fn backend_error(message: impl Into<String>) -> Self {
        Error::Backend(message.into())
    }
}

/// Rejected generation or sync input. One variant per violated rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name cannot be empty")]
    EmptyName,

    #[error("invalid name `{0}`: use only letters and digits, starting with a letter")]
    InvalidName(String),

    #[error("invalid case name `{0}`: use letters, digits and underscores, starting with a letter")]
    InvalidCaseName(String),

    #[error("invalid code `{code}` for case `{case}`: code must be a non-negative integer")]
    InvalidCode { case: String, code: String },

    #[error("malformed case pair `{0}`: expected `Name=Code` or `Name:Code`")]
    MalformedPair(String),

    #[error("duplicate case name `{0}`")]
    DuplicateCase(String),

    #[error("at least one case is required")]
    NoCases,

    #[error("invalid locale `{0}`: expected a BCP 47 language identifier such as en or pt_BR")]
    InvalidLocale(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = Error::Io(io_error);
        assert!(error.to_string().contains("I/O error"));
    }

    #[test]
    fn test_parse_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("{ invalid json }").unwrap_err();
        let error = Error::Parse(json_error);
        assert!(error.to_string().contains("parse error"));
    }

    #[test]
    fn test_write_error_mentions_path() {
        let error = Error::write_error(
            "lang/en/main.json",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(
            error.to_string(),
            "failed to write `lang/en/main.json`: denied"
        );
    }

    #[test]
    fn test_unknown_driver_error() {
        let error = Error::UnknownDriver("redis".to_string());
        assert_eq!(error.to_string(), "translator driver `redis` is not registered");
    }

    #[test]
    fn test_validation_error_conversion() {
        let error: Error = ValidationError::NoCases.into();
        assert_eq!(
            error.to_string(),
            "validation error: at least one case is required"
        );
    }

    #[test]
    fn test_validation_error_messages_are_specific() {
        let errors = vec![
            ValidationError::InvalidName("1abc".to_string()),
            ValidationError::InvalidCaseName("_x".to_string()),
            ValidationError::MalformedPair("x".to_string()),
            ValidationError::DuplicateCase("x".to_string()),
            ValidationError::InvalidLocale("../x".to_string()),
        ];

        for error in errors {
            let display = format!("{}", error);
            assert!(!display.is_empty());
        }
        assert!(
            ValidationError::InvalidCode {
                case: "NotFound".to_string(),
                code: "-4".to_string(),
            }
            .to_string()
            .contains("NotFound")
        );
    }
}
