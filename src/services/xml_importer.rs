//! Importer for uploaded XML documents of unknown shape.

use std::fs;
use std::path::Path;

use crate::domain::contact::elements;
use crate::domain::{ContactRecord, DomainError};
use crate::xml::{self, XmlElement};

/// Reads and parses a document, distinguishing a missing file from a
/// malformed one.
pub fn load_document(path: &Path) -> Result<XmlElement, DomainError> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DomainError::NotFound(path.display().to_string()),
        _ => DomainError::Io(e),
    })?;
    Ok(xml::parse(&bytes)?)
}

/// True when the file exists and is well-formed XML.
pub fn is_valid(path: &Path) -> bool {
    load_document(path).is_ok()
}

/// Contact records found anywhere below the root of the document at `path`.
/// Unreadable or malformed files yield an empty list.
pub fn extract_contacts(path: &Path) -> Vec<ContactRecord> {
    match load_document(path) {
        Ok(root) => contacts_in(&root),
        Err(e) => {
            tracing::warn!("Error reading uploaded XML {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Collects every `Contact` element below `root`, keeping only the fields
/// whose element is present. Elements with none of the fields are skipped.
pub fn contacts_in(root: &XmlElement) -> Vec<ContactRecord> {
    root.descendants_named(elements::CONTACT)
        .into_iter()
        .map(record_from_element)
        .filter(|record| !record.is_empty())
        .collect()
}

fn record_from_element(element: &XmlElement) -> ContactRecord {
    let field = |name: &str| element.child(name).map(|child| child.text.clone());
    ContactRecord {
        name: field(elements::NAME),
        phone: field(elements::PHONE),
        email: field(elements::EMAIL),
        address: field(elements::ADDRESS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_is_valid() {
        let dir = TempDir::new().unwrap();
        assert!(is_valid(&write(&dir, "root.xml", "<Root/>")));
        assert!(!is_valid(&write(&dir, "text.xml", "not xml")));
        assert!(!is_valid(&dir.path().join("missing.xml")));
    }

    #[test]
    fn test_extract_finds_nested_contacts() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "nested.xml",
            r#"<Export>
                 <Department><Team>
                   <Contact><Name>Anna</Name><Email>anna@example.com</Email></Contact>
                 </Team></Department>
                 <Contact><Phone>+1 555</Phone><Address>Main st.</Address></Contact>
               </Export>"#,
        );

        let records = extract_contacts(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name.as_deref(), Some("Anna"));
        assert_eq!(records[0].email.as_deref(), Some("anna@example.com"));
        assert_eq!(records[0].phone, None);
        assert_eq!(records[1].phone.as_deref(), Some("+1 555"));
        assert_eq!(records[1].address.as_deref(), Some("Main st."));
    }

    #[test]
    fn test_extract_skips_contacts_without_fields() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "sparse.xml",
            "<Contacts><Contact><Nickname>x</Nickname></Contact><Contact><Name>Only</Name></Contact></Contacts>",
        );

        let records = extract_contacts(&path);
        assert_eq!(
            records,
            vec![ContactRecord {
                name: Some("Only".to_string()),
                ..Default::default()
            }]
        );
    }

    #[test]
    fn test_extract_keeps_present_but_empty_field() {
        let root = xml::parse(b"<Contacts><Contact><Name/></Contact></Contacts>").unwrap();
        let records = contacts_in(&root);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name.as_deref(), Some(""));
    }

    #[test]
    fn test_extract_on_unrelated_or_invalid_documents() {
        let dir = TempDir::new().unwrap();
        assert!(extract_contacts(&write(&dir, "root.xml", "<Root/>")).is_empty());
        assert!(extract_contacts(&write(&dir, "bad.xml", "<Contact><Name>")).is_empty());
        assert!(extract_contacts(&write(&dir, "self.xml", "<Contact><Name>Root</Name></Contact>")).is_empty());
    }
}
