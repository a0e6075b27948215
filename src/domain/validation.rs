//! Contact form binding and field validation.

use std::fmt;
use std::net::IpAddr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::contact::Contact;

pub const NAME_MAX_CHARS: usize = 100;
pub const PHONE_MAX_CHARS: usize = 20;
pub const EMAIL_MAX_CHARS: usize = 320;
pub const ADDRESS_MAX_CHARS: usize = 200;

const REQUIRED_MESSAGE: &str = "This field is required.";
const NAME_MESSAGE: &str = "Full name may only contain letters, spaces, hyphens and periods.";
const PHONE_MESSAGE: &str = "Invalid phone number format.";
const EMAIL_MESSAGE: &str = "Enter a valid email address.";

// Cyrillic а-я/А-Я (no ё), Latin letters, whitespace, hyphen, period.
static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[а-яА-Яa-zA-Z\s\-.]+$").expect("valid name pattern"));

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+\d\s\-()]+$").expect("valid phone pattern"));

static EMAIL_USER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)^(?:[-!#$%&'*+/=?^_`{}|~0-9a-z]+(?:\.[-!#$%&'*+/=?^_`{}|~0-9a-z]+)*|"(?:[^"\\\r\n]|\\[^\r\n])*")$"#,
    )
    .expect("valid email user pattern")
});

static EMAIL_DOMAIN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:[\p{L}\p{N}](?:[\p{L}\p{N}-]{0,61}[\p{L}\p{N}])?\.)+(?:\p{L}{2,63}|xn--[a-z0-9-]{1,59})$",
    )
    .expect("valid email domain pattern")
});

/// Form fields that carry validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Phone,
    Email,
    Address,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Phone => "phone",
            Field::Email => "email",
            Field::Address => "address",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected field with a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: Field,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Accepts a full name made of letters, whitespace, hyphens and periods.
pub fn validate_name(name: &str) -> Result<&str, ValidationError> {
    if NAME_PATTERN.is_match(name) {
        Ok(name)
    } else {
        Err(ValidationError::new(Field::Name, NAME_MESSAGE))
    }
}

/// Accepts digits, `+`, whitespace, `-`, `(` and `)`.
pub fn validate_phone(phone: &str) -> Result<&str, ValidationError> {
    if PHONE_PATTERN.is_match(phone) {
        Ok(phone)
    } else {
        Err(ValidationError::new(Field::Phone, PHONE_MESSAGE))
    }
}

/// Standard address-syntax check: dot-atom or quoted local part, then a
/// domain name or a bracketed IP literal.
pub fn validate_email(email: &str) -> Result<&str, ValidationError> {
    let invalid = || ValidationError::new(Field::Email, EMAIL_MESSAGE);

    let (user, domain) = email.rsplit_once('@').ok_or_else(invalid)?;
    if !EMAIL_USER_PATTERN.is_match(user) {
        return Err(invalid());
    }

    let domain_ok = match domain.strip_prefix('[').and_then(|d| d.strip_suffix(']')) {
        Some(literal) => literal
            .strip_prefix("IPv6:")
            .unwrap_or(literal)
            .parse::<IpAddr>()
            .is_ok(),
        None => domain == "localhost" || EMAIL_DOMAIN_PATTERN.is_match(domain),
    };

    if domain_ok { Ok(email) } else { Err(invalid()) }
}

/// Raw contact form submission.
///
/// Every field defaults to empty so a missing key is reported as a
/// required-field error rather than an extractor rejection.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
}

impl ContactForm {
    /// Trims every field, then checks each of them. All failing fields are
    /// reported together.
    pub fn validate(&self) -> Result<Contact, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        let phone = self.phone.trim();
        let email = self.email.trim();
        let address = self.address.trim();

        check(&mut errors, Field::Name, name, true, NAME_MAX_CHARS, validate_name);
        check(&mut errors, Field::Phone, phone, true, PHONE_MAX_CHARS, validate_phone);
        check(&mut errors, Field::Email, email, true, EMAIL_MAX_CHARS, validate_email);
        check(&mut errors, Field::Address, address, false, ADDRESS_MAX_CHARS, free_text);

        if errors.is_empty() {
            Ok(Contact::new(name, phone, email, address))
        } else {
            Err(errors)
        }
    }
}

fn free_text(value: &str) -> Result<&str, ValidationError> {
    Ok(value)
}

fn check(
    errors: &mut Vec<ValidationError>,
    field: Field,
    value: &str,
    required: bool,
    max_chars: usize,
    rule: fn(&str) -> Result<&str, ValidationError>,
) {
    if value.is_empty() {
        if required {
            errors.push(ValidationError::new(field, REQUIRED_MESSAGE));
        }
        return;
    }

    let chars = value.chars().count();
    if chars > max_chars {
        errors.push(ValidationError::new(
            field,
            format!("Ensure this value has at most {max_chars} characters (it has {chars})."),
        ));
        return;
    }

    if let Err(e) = rule(value) {
        errors.push(e);
    }
}

/// Describes one input of a form for the client that renders it.
#[derive(Debug, Clone, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub input: &'static str,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept: Option<&'static str>,
}

pub fn contact_form_fields() -> Vec<FormField> {
    vec![
        FormField {
            name: "name",
            label: "Full name",
            input: "text",
            required: true,
            max_length: Some(NAME_MAX_CHARS),
            accept: None,
        },
        FormField {
            name: "phone",
            label: "Phone",
            input: "text",
            required: true,
            max_length: Some(PHONE_MAX_CHARS),
            accept: None,
        },
        FormField {
            name: "email",
            label: "Email",
            input: "email",
            required: true,
            max_length: Some(EMAIL_MAX_CHARS),
            accept: None,
        },
        FormField {
            name: "address",
            label: "Address",
            input: "textarea",
            required: false,
            max_length: Some(ADDRESS_MAX_CHARS),
            accept: None,
        },
    ]
}

pub fn upload_form_fields() -> Vec<FormField> {
    vec![FormField {
        name: "xml_file",
        label: "XML file",
        input: "file",
        required: true,
        max_length: None,
        accept: Some(".xml"),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, phone: &str, email: &str, address: &str) -> ContactForm {
        ContactForm {
            name: name.to_string(),
            phone: phone.to_string(),
            email: email.to_string(),
            address: address.to_string(),
        }
    }

    #[test]
    fn test_name_accepts_cyrillic_and_latin() {
        assert_eq!(validate_name("Иван Иванов").unwrap(), "Иван Иванов");
        assert!(validate_name("Mary-Jane O.Smith").is_ok());
    }

    #[test]
    fn test_name_rejects_digits_and_symbols() {
        assert!(validate_name("John123").is_err());
        assert!(validate_name("John_Doe").is_err());
        assert!(validate_name("Пётр").is_err());
        let err = validate_name("John!").unwrap_err();
        assert_eq!(err.field, Field::Name);
    }

    #[test]
    fn test_phone_rules() {
        assert!(validate_phone("+7 (900) 123-45-67").is_ok());
        assert!(validate_phone("8-800-555").is_ok());
        assert!(validate_phone("123 ext. 4").is_err());
        assert!(validate_phone("phone").is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("user.name+tag@example.co.uk").is_ok());
        assert!(validate_email("root@localhost").is_ok());
        assert!(validate_email("ops@[127.0.0.1]").is_ok());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
        assert!(validate_email("a..b@example.com").is_err());
    }

    #[test]
    fn test_form_returns_trimmed_contact() {
        let contact = form(" Иван Иванов ", "+7 (900) 123-45-67", "a@b.com", "")
            .validate()
            .unwrap();
        assert_eq!(contact, Contact::new("Иван Иванов", "+7 (900) 123-45-67", "a@b.com", ""));
    }

    #[test]
    fn test_form_reports_every_failing_field() {
        let errors = form("John123", "abc", "nope", "").validate().unwrap_err();
        let fields: Vec<Field> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec![Field::Name, Field::Phone, Field::Email]);
    }

    #[test]
    fn test_form_requires_mandatory_fields() {
        let errors = ContactForm::default().validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|e| e.message == REQUIRED_MESSAGE));
    }

    #[test]
    fn test_form_enforces_max_length() {
        let long_address = "x".repeat(ADDRESS_MAX_CHARS + 1);
        let errors = form("Anna", "123", "a@b.com", &long_address)
            .validate()
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, Field::Address);
    }
}
