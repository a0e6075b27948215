//! Domain error types
//!
//! These errors are framework-agnostic and represent business-level failures.

use thiserror::Error;

use super::validation::ValidationError;
use crate::xml::XmlError;

#[derive(Debug, Error)]
pub enum DomainError {
    /// One or more submitted fields were rejected
    #[error("Validation error: {}", summarize(.0))]
    Validation(Vec<ValidationError>),
    /// Requested file is absent
    #[error("File not found: {0}")]
    NotFound(String),
    /// Document does not parse as well-formed XML
    #[error("Malformed XML: {0}")]
    MalformedXml(#[from] XmlError),
    /// Disk read or write failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
