//! Contact Service - Pure business logic without HTTP layer

use crate::domain::{Contact, ContactForm, DomainError};
use crate::infrastructure::xml_store::XmlContactStore;

/// Validates a form submission and appends the contact to the canonical
/// document. Nothing is written when validation fails.
pub fn submit_contact(store: &XmlContactStore, form: &ContactForm) -> Result<Contact, DomainError> {
    let contact = form.validate().map_err(DomainError::Validation)?;

    if !store.append(&contact) {
        return Err(DomainError::Internal("Error saving contact".to_string()));
    }
    Ok(contact)
}

/// All contacts of the canonical document, in insertion order.
pub fn list_contacts(store: &XmlContactStore) -> Vec<Contact> {
    store.contacts()
}
