//! Contact records as they are stored in and read back from XML documents.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Element names of the contact document format.
pub mod elements {
    pub const ROOT: &str = "Contacts";
    pub const CONTACT: &str = "Contact";
    pub const NAME: &str = "Name";
    pub const PHONE: &str = "Phone";
    pub const EMAIL: &str = "Email";
    pub const ADDRESS: &str = "Address";
}

/// A complete contact, as held in the canonical document.
///
/// An empty `address` means the contact has none; the store omits the
/// `Address` element for it and reads a missing element back as `""`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct Contact {
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub address: String,
}

impl Contact {
    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
        email: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            email: email.into(),
            address: address.into(),
        }
    }

    pub fn has_address(&self) -> bool {
        !self.address.is_empty()
    }
}

/// A contact found in an arbitrary uploaded document.
///
/// Only the fields whose element was present are populated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct ContactRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ContactRecord {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none() && self.email.is_none() && self.address.is_none()
    }
}

impl From<Contact> for ContactRecord {
    fn from(contact: Contact) -> Self {
        let has_address = contact.has_address();
        Self {
            name: Some(contact.name),
            phone: Some(contact.phone),
            email: Some(contact.email),
            address: has_address.then_some(contact.address),
        }
    }
}
