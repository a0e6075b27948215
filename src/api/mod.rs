pub mod contact;
pub mod error;
pub mod files;
pub mod flash;
pub mod health;
pub mod upload;

use axum::{Router, extract::DefaultBodyLimit, routing::get};

use crate::infrastructure::AppState;
use error::ApiError;

pub fn api_router(state: AppState) -> Router {
    let max_upload_bytes = state.max_upload_bytes;

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Contact form and canonical document
        .route("/", get(contact::contact_form).post(contact::submit_contact))
        .route("/contacts/", get(contact::contact_list))
        // Uploads
        .route(
            "/upload/",
            get(upload::upload_form)
                .post(upload::upload_xml)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        // Stored files
        .route("/files/", get(files::list_files))
        .route("/files/:filename/", get(files::view_file))
        .route("/download/:filename/", get(files::download_file))
        .with_state(state)
}

/// Runs blocking file work off the async executor.
pub(crate) async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(work).await?)
}
