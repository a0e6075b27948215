//! Infrastructure layer - Framework implementations
//!
//! This layer contains:
//! - Configuration loading (config)
//! - The canonical contact document (xml_store)
//! - HTTP server setup (server)
//! - Application state (state)

pub mod config;
pub mod server;
pub mod state;
pub mod xml_store;

pub use state::AppState;
pub use xml_store::{StoreRead, XmlContactStore};
