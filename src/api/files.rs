use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use super::blocking;
use super::error::ApiError;
use super::flash::{Flash, FlashMessage};
use crate::domain::DomainError;
use crate::infrastructure::AppState;

const FILES_PAGE: &str = "/files/";

/// List every XML file in the storage directory with its contacts
#[utoipa::path(
    get,
    path = "/files/",
    responses(
        (status = 200, description = "Files sorted by name, with parsed contacts")
    )
)]
pub async fn list_files(
    State(state): State<AppState>,
    flash: Flash,
) -> Result<Response, ApiError> {
    let catalog = state.catalog.clone();
    let files = blocking(move || catalog.list_files_with_contacts())
        .await?
        .unwrap_or_else(|e| {
            tracing::warn!("Cannot list XML files: {}", e);
            Vec::new()
        });

    let has_files = !files.is_empty();
    let (messages, clear) = flash.consume();
    Ok((
        clear,
        Json(json!({
            "has_files": has_files,
            "files": files,
            "messages": messages
        })),
    )
        .into_response())
}

/// Show the contacts parsed from one file
#[utoipa::path(
    get,
    path = "/files/{filename}/",
    params(
        ("filename" = String, Path, description = "Name of a file in the storage directory")
    ),
    responses(
        (status = 200, description = "Contacts found in the file"),
        (status = 303, description = "File missing or not valid XML")
    )
)]
pub async fn view_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    flash: Flash,
) -> Result<Response, ApiError> {
    let catalog = state.catalog.clone();
    let requested = filename.clone();
    let opened = blocking(move || catalog.open(&requested)).await?;

    match opened {
        Ok(contacts) => {
            let has_contacts = !contacts.is_empty();
            let (messages, clear) = flash.consume();
            Ok((
                clear,
                Json(json!({
                    "filename": filename,
                    "has_contacts": has_contacts,
                    "contacts": contacts,
                    "messages": messages
                })),
            )
                .into_response())
        }
        Err(DomainError::NotFound(_)) => {
            Ok(flash.redirect(FILES_PAGE, FlashMessage::error("File not found")))
        }
        Err(DomainError::MalformedXml(e)) => {
            tracing::warn!("{} is not valid XML: {}", filename, e);
            Ok(flash.redirect(FILES_PAGE, FlashMessage::error("File is not valid XML")))
        }
        Err(e) => Err(e.into()),
    }
}

/// Download the raw file as an attachment
#[utoipa::path(
    get,
    path = "/download/{filename}/",
    params(
        ("filename" = String, Path, description = "Name of a `.xml` file in the storage directory")
    ),
    responses(
        (status = 200, description = "Raw XML file", content_type = "application/xml"),
        (status = 303, description = "Not an XML file name, or file missing")
    )
)]
pub async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    flash: Flash,
) -> Response {
    if !filename.ends_with(".xml") {
        return flash.redirect(FILES_PAGE, FlashMessage::error("File is not XML"));
    }
    let Some(path) = state.catalog.resolve(&filename) else {
        return flash.redirect(FILES_PAGE, FlashMessage::error("File not found"));
    };

    match open_regular_file(&path).await {
        Ok((file, len)) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/xml".to_string()),
                (header::CONTENT_LENGTH, len.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", filename.replace('"', "")),
                ),
            ],
            Body::from_stream(ReaderStream::new(file)),
        )
            .into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            flash.redirect(FILES_PAGE, FlashMessage::error("File not found"))
        }
        Err(e) => {
            tracing::error!("Error downloading {}: {}", path.display(), e);
            flash.redirect(
                FILES_PAGE,
                FlashMessage::error(format!("Error downloading file: {}", e)),
            )
        }
    }
}

async fn open_regular_file(path: &std::path::Path) -> std::io::Result<(File, u64)> {
    let metadata = tokio::fs::metadata(path).await?;
    if !metadata.is_file() {
        return Err(std::io::ErrorKind::NotFound.into());
    }
    Ok((File::open(path).await?, metadata.len()))
}
