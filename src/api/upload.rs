use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::blocking;
use super::error::ApiError;
use super::flash::{Flash, FlashMessage};
use crate::domain::validation::upload_form_fields;
use crate::infrastructure::AppState;
use crate::services::UploadOutcome;

pub const UPLOAD_FIELD: &str = "xml_file";

/// Describe the upload form
#[utoipa::path(
    get,
    path = "/upload/",
    responses(
        (status = 200, description = "Upload form fields")
    )
)]
pub async fn upload_form(State(state): State<AppState>, flash: Flash) -> Response {
    let (messages, clear) = flash.consume();
    (
        clear,
        Json(json!({
            "fields": upload_form_fields(),
            "max_upload_bytes": state.max_upload_bytes,
            "messages": messages
        })),
    )
        .into_response()
}

/// Store an uploaded XML file under a generated name; remove it again when
/// it is not well-formed
#[utoipa::path(
    post,
    path = "/upload/",
    responses(
        (status = 303, description = "Redirect to the file list with the outcome as a flash message"),
        (status = 400, description = "No usable `xml_file` part in the multipart body")
    )
)]
pub async fn upload_xml(
    State(state): State<AppState>,
    flash: Flash,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut upload = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Ok(bad_request(format!("Invalid multipart body: {}", e))),
        };
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let original_name = field.file_name().unwrap_or("upload.xml").to_string();
        match field.bytes().await {
            Ok(data) => upload = Some((original_name, data)),
            Err(e) => return Ok(bad_request(format!("Failed to read upload: {}", e))),
        }
        break;
    }

    let Some((original_name, data)) = upload else {
        return Ok(bad_request(format!("{}: This field is required.", UPLOAD_FIELD)));
    };
    if data.is_empty() {
        return Ok(bad_request(format!("{}: The submitted file is empty.", UPLOAD_FIELD)));
    }

    let catalog = state.catalog.clone();
    let outcome = blocking(move || catalog.store_upload(&data)).await??;

    Ok(match outcome {
        UploadOutcome::Accepted { filename } => {
            tracing::info!("Upload {} stored as {}", original_name, filename);
            flash.redirect(
                "/files/",
                FlashMessage::success(format!(
                    "File {} uploaded and verified!",
                    original_name
                )),
            )
        }
        UploadOutcome::Rejected => {
            tracing::warn!("Upload {} rejected: not well-formed XML", original_name);
            flash.redirect(
                "/files/",
                FlashMessage::error("File is not valid XML. File removed."),
            )
        }
    })
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}
