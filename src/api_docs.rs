use crate::api;
use crate::domain::{Contact, ContactForm, ContactRecord};
use crate::services::XmlFileRecord;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::contact::contact_form,
        api::contact::submit_contact,
        api::contact::contact_list,
        api::upload::upload_form,
        api::upload::upload_xml,
        api::files::list_files,
        api::files::view_file,
        api::files::download_file,
    ),
    components(
        schemas(Contact, ContactForm, ContactRecord, XmlFileRecord)
    ),
    tags(
        (name = "xml-contacts", description = "XML contact collection API")
    )
)]
pub struct ApiDoc;
