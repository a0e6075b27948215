//! One-shot user messages carried across a redirect in a cookie.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, HeaderName, HeaderValue, header, request::Parts},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: Level,
    pub message: String,
}

impl FlashMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }
}

type CookieHeaders = AppendHeaders<Vec<(HeaderName, HeaderValue)>>;

/// Messages pending for the current client.
#[derive(Debug, Default)]
pub struct Flash(Vec<FlashMessage>);

impl Flash {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let messages = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|cookies| cookies.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .filter(|(name, _)| *name == FLASH_COOKIE)
            .filter_map(|(_, value)| urlencoding::decode(value).ok())
            .filter_map(|json| serde_json::from_str::<Vec<FlashMessage>>(&json).ok())
            .flatten()
            .collect();
        Self(messages)
    }

    /// Redirects (303) to `location`, queueing `message` after any messages
    /// not yet shown.
    pub fn redirect(mut self, location: &str, message: FlashMessage) -> Response {
        self.0.push(message);
        let value = serde_json::to_string(&self.0).unwrap_or_default();
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            FLASH_COOKIE,
            urlencoding::encode(&value)
        );
        (set_cookie(cookie), Redirect::to(location)).into_response()
    }

    /// Takes the pending messages, returning them with the headers that
    /// clear the cookie.
    pub fn consume(self) -> (Vec<FlashMessage>, CookieHeaders) {
        if self.0.is_empty() {
            return (self.0, AppendHeaders(Vec::new()));
        }
        let cookie = format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", FLASH_COOKIE);
        (self.0, set_cookie(cookie))
    }
}

fn set_cookie(cookie: String) -> CookieHeaders {
    match HeaderValue::from_str(&cookie) {
        Ok(value) => AppendHeaders(vec![(header::SET_COOKIE, value)]),
        Err(e) => {
            tracing::warn!("Dropping flash cookie: {}", e);
            AppendHeaders(Vec::new())
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Flash
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie_pair(response: &Response) -> String {
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    #[test]
    fn test_redirect_sets_cookie_readable_by_next_request() {
        let response = Flash::default().redirect("/files/", FlashMessage::error("File not found"));
        assert_eq!(response.status(), axum::http::StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/files/");

        let mut headers = HeaderMap::new();
        let cookie = format!("theme=dark; {}", cookie_pair(&response));
        headers.insert(header::COOKIE, HeaderValue::from_str(&cookie).unwrap());

        let (messages, _) = Flash::from_headers(&headers).consume();
        assert_eq!(messages, vec![FlashMessage::error("File not found")]);
    }

    #[test]
    fn test_redirect_keeps_unread_messages() {
        let pending = Flash(vec![FlashMessage::success("first")]);
        let response = pending.redirect("/", FlashMessage::error("second"));

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(&cookie_pair(&response)).unwrap());
        let (messages, _) = Flash::from_headers(&headers).consume();
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn test_garbage_cookie_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("flash=%7Bnope"));
        let (messages, _) = Flash::from_headers(&headers).consume();
        assert!(messages.is_empty());
    }
}
