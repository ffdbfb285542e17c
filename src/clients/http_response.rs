//! HTTP response types for the SellAuth SDK.
//!
//! A [`Response`] is what the transport returns and what travels back up the
//! middleware chain. The body starts out deferred; the parsing middleware
//! reads it once and attaches the decoded [`ResponseData`].

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;

use crate::clients::errors::SellAuthError;

/// A pending body read.
pub type BodyFuture = Pin<Box<dyn Future<Output = Result<String, SellAuthError>> + Send>>;

/// Decoded response payload.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseData {
    /// A JSON document.
    Json(Value),
    /// Raw text (non-JSON response type, or JSON that failed to decode).
    Text(String),
}

impl ResponseData {
    /// Returns the JSON document, if the data was decoded as JSON.
    #[must_use]
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// Returns the raw text, if the data was kept as text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Json(_) => None,
            Self::Text(text) => Some(text),
        }
    }

    /// Converts the data into a JSON value; text becomes a JSON string.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Json(value) => value,
            Self::Text(text) => Value::String(text),
        }
    }
}

enum ResponseBody {
    Buffered(String),
    Deferred(Mutex<Option<BodyFuture>>),
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffered(text) => f.debug_tuple("Buffered").field(&text.len()).finish(),
            Self::Deferred(_) => f.write_str("Deferred"),
        }
    }
}

/// An HTTP response travelling up the middleware chain.
///
/// Headers are stored with lowercase names and may have multiple values.
#[derive(Debug)]
pub struct Response {
    /// The HTTP status code.
    pub status: u16,
    /// Response headers (lowercase names).
    pub headers: HashMap<String, Vec<String>>,
    /// Explicit success flag; when `None`, success means a 2xx status.
    pub ok: Option<bool>,
    /// Decoded body, set by the parsing middleware.
    pub data: Option<ResponseData>,
    body: ResponseBody,
}

impl Response {
    /// Creates a response whose body is already available.
    #[must_use]
    pub fn from_text(
        status: u16,
        headers: HashMap<String, Vec<String>>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            status,
            headers: lowercase_keys(headers),
            ok: None,
            data: None,
            body: ResponseBody::Buffered(text.into()),
        }
    }

    /// Creates a response whose body is read on demand.
    #[must_use]
    pub fn deferred(status: u16, headers: HashMap<String, Vec<String>>, body: BodyFuture) -> Self {
        Self {
            status,
            headers: lowercase_keys(headers),
            ok: None,
            data: None,
            body: ResponseBody::Deferred(Mutex::new(Some(body))),
        }
    }

    /// Creates an already-parsed response carrying `data`.
    ///
    /// Useful for middleware that short-circuits the chain (e.g. caches).
    #[must_use]
    pub fn with_data(status: u16, data: Option<ResponseData>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            ok: None,
            data,
            body: ResponseBody::Buffered(String::new()),
        }
    }

    /// Returns `true` if the response counts as successful.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.ok.unwrap_or((200..300).contains(&self.status))
    }

    /// Reads the body as text.
    ///
    /// The first call consumes a deferred body; later calls return the
    /// buffered copy, so the network stream is never read twice.
    ///
    /// # Errors
    ///
    /// Returns the transport's error if reading the body fails.
    pub async fn text(&mut self) -> Result<String, SellAuthError> {
        let pending = match &mut self.body {
            ResponseBody::Buffered(text) => return Ok(text.clone()),
            ResponseBody::Deferred(slot) => slot
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        };

        let text = match pending {
            Some(body) => body.await?,
            None => String::new(),
        };
        self.body = ResponseBody::Buffered(text.clone());
        Ok(text)
    }

    /// Returns the first value of a header (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns the `Retry-After` delay when it is a number of seconds.
    ///
    /// HTTP-date values are ignored.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        self.header("retry-after")
            .and_then(|value| value.trim().parse::<f64>().ok())
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// Returns the `X-Request-Id` header value, if present.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.header("x-request-id")
    }
}

fn lowercase_keys(headers: HashMap<String, Vec<String>>) -> HashMap<String, Vec<String>> {
    let mut result: HashMap<String, Vec<String>> = HashMap::with_capacity(headers.len());
    for (name, values) in headers {
        result
            .entry(name.to_ascii_lowercase())
            .or_default()
            .extend(values);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), vec![(*v).to_string()]))
            .collect()
    }

    #[test]
    fn test_is_ok_returns_true_for_2xx() {
        for code in 200..=299 {
            let response = Response::from_text(code, HashMap::new(), "");
            assert!(response.is_ok(), "Expected is_ok() to be true for code {code}");
        }
    }

    #[test]
    fn test_is_ok_returns_false_for_4xx_and_5xx() {
        for code in [400, 404, 429, 500, 503] {
            assert!(!Response::from_text(code, HashMap::new(), "").is_ok());
        }
    }

    #[test]
    fn test_explicit_ok_overrides_status() {
        let mut response = Response::from_text(500, HashMap::new(), "");
        response.ok = Some(true);
        assert!(response.is_ok());
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let response = Response::from_text(200, headers(&[("X-Request-Id", "req-1")]), "");
        assert_eq!(response.request_id(), Some("req-1"));
        assert_eq!(response.header("x-REQUEST-id"), Some("req-1"));
    }

    #[test]
    fn test_retry_after_parsing() {
        let response = Response::from_text(429, headers(&[("Retry-After", "2")]), "");
        assert_eq!(response.retry_after(), Some(Duration::from_secs(2)));

        let response = Response::from_text(429, headers(&[("retry-after", "0.5")]), "");
        assert_eq!(response.retry_after(), Some(Duration::from_millis(500)));

        let response = Response::from_text(
            429,
            headers(&[("retry-after", "Wed, 21 Oct 2015 07:28:00 GMT")]),
            "",
        );
        assert_eq!(response.retry_after(), None);

        let response = Response::from_text(429, headers(&[("retry-after", "-3")]), "");
        assert_eq!(response.retry_after(), None);
    }

    #[tokio::test]
    async fn test_deferred_body_is_read_once() {
        let reads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&reads);
        let body: BodyFuture = Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok("{\"ok\":true}".to_string())
        });

        let mut response = Response::deferred(200, HashMap::new(), body);
        assert_eq!(response.text().await.unwrap(), "{\"ok\":true}");
        assert_eq!(response.text().await.unwrap(), "{\"ok\":true}");
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_response_data_accessors() {
        let data = ResponseData::Json(json!({"id": 1}));
        assert_eq!(data.as_json(), Some(&json!({"id": 1})));
        assert!(data.as_text().is_none());

        let text = ResponseData::Text("plain".to_string());
        assert_eq!(text.as_text(), Some("plain"));
        assert_eq!(text.into_value(), json!("plain"));
    }

    #[test]
    fn test_response_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Response>();
    }
}
