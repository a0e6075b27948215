//! Canonical contact document
//!
//! A single `contacts.xml` in the storage directory accumulates every contact
//! submitted through the form. All reads and writes go through one mutex, and
//! every append replaces the whole file by renaming a fully written temporary
//! file over it.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tempfile::NamedTempFile;

use crate::domain::contact::elements;
use crate::domain::{Contact, DomainError};
use crate::xml::{self, XmlElement};

pub const CANONICAL_FILE_NAME: &str = "contacts.xml";

/// Outcome of reading the canonical document.
#[derive(Debug)]
pub enum StoreRead {
    /// No document has been written yet
    Absent,
    Loaded(Vec<Contact>),
    /// The file exists but cannot be used
    Corrupt(DomainError),
}

impl StoreRead {
    /// Contacts for display; absent and corrupt documents read as empty.
    pub fn into_contacts(self) -> Vec<Contact> {
        match self {
            StoreRead::Loaded(contacts) => contacts,
            StoreRead::Absent | StoreRead::Corrupt(_) => Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct XmlContactStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl XmlContactStore {
    pub fn new(storage_dir: impl AsRef<Path>) -> Self {
        Self {
            path: storage_dir.as_ref().join(CANONICAL_FILE_NAME),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a contact, reporting only success or failure. Failures are
    /// logged here.
    pub fn append(&self, contact: &Contact) -> bool {
        match self.try_append(contact) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Error saving contact to {}: {}", self.path.display(), e);
                false
            }
        }
    }

    /// Appends a contact to the document, creating the document if needed.
    /// The previous file is left untouched on any failure.
    pub fn try_append(&self, contact: &Contact) -> Result<(), DomainError> {
        let _guard = self.guard();

        let mut root = match fs::read(&self.path) {
            Ok(bytes) => xml::parse(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => XmlElement::new(elements::ROOT),
            Err(e) => return Err(e.into()),
        };
        if root.children.is_empty() && root.text.trim().is_empty() {
            root.text.clear();
        }
        root.children.push(contact_element(contact));

        let bytes = xml::to_bytes(&root)?;
        self.replace_document(&bytes)?;

        tracing::debug!(
            "Appended contact {:?} to {} ({} total)",
            contact.name,
            self.path.display(),
            root.children_named(elements::CONTACT).count()
        );
        Ok(())
    }

    /// Reads the contacts that are direct children of the root element.
    pub fn read_all(&self) -> StoreRead {
        let _guard = self.guard();

        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return StoreRead::Absent,
            Err(e) => {
                tracing::warn!("Cannot read {}: {}", self.path.display(), e);
                return StoreRead::Corrupt(e.into());
            }
        };

        match xml::parse(&bytes) {
            Ok(root) => StoreRead::Loaded(
                root.children_named(elements::CONTACT)
                    .map(contact_from_element)
                    .collect(),
            ),
            Err(e) => {
                tracing::warn!("Error parsing {}: {}", self.path.display(), e);
                StoreRead::Corrupt(e.into())
            }
        }
    }

    /// Contacts in insertion order, or an empty list.
    pub fn contacts(&self) -> Vec<Contact> {
        self.read_all().into_contacts()
    }

    fn replace_document(&self, bytes: &[u8]) -> Result<(), DomainError> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| DomainError::Internal("store path has no parent".to_string()))?;
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| DomainError::Io(e.error))?;
        Ok(())
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn contact_element(contact: &Contact) -> XmlElement {
    let mut element = XmlElement::new(elements::CONTACT);
    element.children.push(XmlElement::with_text(elements::NAME, &contact.name));
    element.children.push(XmlElement::with_text(elements::PHONE, &contact.phone));
    element.children.push(XmlElement::with_text(elements::EMAIL, &contact.email));
    if contact.has_address() {
        element
            .children
            .push(XmlElement::with_text(elements::ADDRESS, &contact.address));
    }
    element
}

fn contact_from_element(element: &XmlElement) -> Contact {
    let text = |name: &str| {
        element
            .child(name)
            .map(|child| child.text.clone())
            .unwrap_or_default()
    };
    Contact {
        name: text(elements::NAME),
        phone: text(elements::PHONE),
        email: text(elements::EMAIL),
        address: text(elements::ADDRESS),
    }
}
