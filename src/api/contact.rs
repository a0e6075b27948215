use axum::{
    Form, Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::blocking;
use super::error::ApiError;
use super::flash::{Flash, FlashMessage};
use crate::domain::ContactForm;
use crate::domain::validation::contact_form_fields;
use crate::infrastructure::{AppState, StoreRead};
use crate::services::contact_service;

/// Describe the contact form
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Contact form fields")
    )
)]
pub async fn contact_form(flash: Flash) -> Response {
    let (messages, clear) = flash.consume();
    (
        clear,
        Json(json!({
            "fields": contact_form_fields(),
            "messages": messages
        })),
    )
        .into_response()
}

/// Validate a submitted contact and append it to the canonical document
#[utoipa::path(
    post,
    path = "/",
    request_body(content = ContactForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Saved, redirect to the contact list"),
        (status = 422, description = "Per-field validation errors"),
        (status = 500, description = "Contact could not be saved")
    )
)]
pub async fn submit_contact(
    State(state): State<AppState>,
    flash: Flash,
    Form(form): Form<ContactForm>,
) -> Result<Response, ApiError> {
    let store = state.store.clone();
    let contact = blocking(move || contact_service::submit_contact(&store, &form)).await??;

    tracing::info!("Contact {:?} saved", contact.name);
    Ok(flash.redirect(
        "/contacts/",
        FlashMessage::success("Contact saved successfully!"),
    ))
}

/// List the contacts of the canonical document
#[utoipa::path(
    get,
    path = "/contacts/",
    responses(
        (status = 200, description = "All saved contacts, in insertion order")
    )
)]
pub async fn contact_list(
    State(state): State<AppState>,
    flash: Flash,
) -> Result<Response, ApiError> {
    let store = state.store.clone();
    let read = blocking(move || store.read_all()).await?;

    let document = match &read {
        StoreRead::Absent => "absent",
        StoreRead::Loaded(_) => "ok",
        StoreRead::Corrupt(_) => "corrupt",
    };
    let contacts = read.into_contacts();
    let has_contacts = !contacts.is_empty();
    let (messages, clear) = flash.consume();

    Ok((
        clear,
        Json(json!({
            "has_contacts": has_contacts,
            "contacts": contacts,
            "document": document,
            "messages": messages
        })),
    )
        .into_response())
}
