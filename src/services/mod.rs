//! Services Layer
//!
//! This module contains the contact workflow, the importer for uploaded
//! documents and the storage directory catalog, independent of HTTP.

pub mod contact_service;
pub mod file_catalog;
pub mod xml_importer;

// Re-export for convenience
pub use file_catalog::{FileCatalog, UploadOutcome, XmlFileRecord, XmlFileSummary};
