//! Domain layer - Pure business abstractions
//!
//! This layer contains NO framework dependencies (no Axum, no file I/O).
//! Only contact types, form validation and domain error types.

pub mod contact;
pub mod errors;
pub mod validation;

pub use contact::{Contact, ContactRecord};
pub use errors::DomainError;
pub use validation::{ContactForm, Field, ValidationError};
