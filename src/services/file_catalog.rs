//! Catalog of XML files in the storage directory.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use utoipa::ToSchema;

use super::xml_importer;
use crate::domain::{ContactRecord, DomainError};

/// A `.xml` file in the storage directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct XmlFileRecord {
    pub filename: String,
    pub size: u64,
    pub is_valid: bool,
}

/// A listed file together with the contacts parsed out of it.
#[derive(Debug, Clone, Serialize)]
pub struct XmlFileSummary {
    #[serde(flatten)]
    pub file: XmlFileRecord,
    pub contacts: Vec<ContactRecord>,
    pub contacts_count: usize,
}

/// Result of storing an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Stored under the generated name
    Accepted { filename: String },
    /// Not well-formed XML; the stored copy was removed again
    Rejected,
}

/// Generates a collision-free name for an uploaded file.
pub fn generate_upload_filename() -> String {
    format!("contacts_{}.xml", uuid::Uuid::new_v4().simple())
}

#[derive(Debug, Clone)]
pub struct FileCatalog {
    dir: PathBuf,
}

impl FileCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the storage directory if it does not exist yet.
    pub fn ensure_dir(&self) -> io::Result<&Path> {
        fs::create_dir_all(&self.dir)?;
        Ok(&self.dir)
    }

    /// Lists `*.xml` regular files directly inside the storage directory,
    /// sorted by filename.
    pub fn list_files(&self) -> io::Result<Vec<XmlFileRecord>> {
        let dir = self.ensure_dir()?;

        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };
            let Ok(filename) = entry.file_name().into_string() else {
                continue;
            };
            if !filename.ends_with(".xml") {
                continue;
            }
            let path = entry.path();
            // Follows symlinks; the entry may also vanish while listing.
            let metadata = match fs::metadata(&path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", filename, e);
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }
            files.push(XmlFileRecord {
                is_valid: xml_importer::is_valid(&path),
                filename,
                size: metadata.len(),
            });
        }

        files.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(files)
    }

    /// Lists files with their extracted contacts.
    pub fn list_files_with_contacts(&self) -> io::Result<Vec<XmlFileSummary>> {
        let files = self.list_files()?;
        Ok(files
            .into_iter()
            .map(|file| {
                let contacts = xml_importer::extract_contacts(&self.dir.join(&file.filename));
                XmlFileSummary {
                    contacts_count: contacts.len(),
                    contacts,
                    file,
                }
            })
            .collect())
    }

    /// Maps a requested filename to a path inside the storage directory.
    /// Names that could escape the directory are refused.
    pub fn resolve(&self, filename: &str) -> Option<PathBuf> {
        let unsafe_name = filename.is_empty()
            || filename == "."
            || filename == ".."
            || filename.contains(['/', '\\'])
            || filename.chars().any(char::is_control);
        if unsafe_name {
            return None;
        }
        Some(self.dir.join(filename))
    }

    /// Contacts of one listed file.
    pub fn open(&self, filename: &str) -> Result<Vec<ContactRecord>, DomainError> {
        let path = self
            .resolve(filename)
            .ok_or_else(|| DomainError::NotFound(filename.to_string()))?;
        let root = xml_importer::load_document(&path)?;
        Ok(xml_importer::contacts_in(&root))
    }

    /// Stores an uploaded document under a generated name and keeps it only
    /// if it is well-formed. The content is written to a temporary file first,
    /// so a partial or rejected upload never appears under an `.xml` name.
    pub fn store_upload(&self, content: &[u8]) -> Result<UploadOutcome, DomainError> {
        let dir = self.ensure_dir()?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(content)?;
        tmp.as_file().sync_all()?;

        if !xml_importer::is_valid(tmp.path()) {
            tracing::info!("Discarded invalid upload of {} bytes", content.len());
            return Ok(UploadOutcome::Rejected);
        }

        let filename = generate_upload_filename();
        tmp.persist_noclobber(dir.join(&filename))
            .map_err(|e| DomainError::Io(e.error))?;
        tracing::info!("Stored uploaded XML as {}", filename);
        Ok(UploadOutcome::Accepted { filename })
    }
}
