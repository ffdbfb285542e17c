//! HTTP request types for the SellAuth SDK.
//!
//! Callers describe a call with [`RequestOptions`]; the client turns it into a
//! [`NormalizedRequest`], which is what flows through the middleware chain.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::clients::errors::{InvalidRequestError, SellAuthError};

/// HTTP methods supported by the SDK.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// HTTP GET.
    Get,
    /// HTTP POST.
    Post,
    /// HTTP PUT.
    Put,
    /// HTTP PATCH.
    Patch,
    /// HTTP DELETE.
    Delete,
    /// HTTP HEAD.
    Head,
    /// HTTP OPTIONS.
    Options,
}

impl HttpMethod {
    /// Returns the uppercase verb.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    /// Returns `true` for methods that must not carry a body on the wire.
    #[must_use]
    pub const fn forbids_body(&self) -> bool {
        matches!(self, Self::Get | Self::Head)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = InvalidRequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            _ => Err(InvalidRequestError::InvalidMethod {
                method: s.to_string(),
            }),
        }
    }
}

/// How the response body is interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResponseType {
    /// Decode JSON, falling back to raw text when decoding fails.
    #[default]
    Json,
    /// Keep the body as text.
    Text,
    /// Keep the body untouched (as text).
    Raw,
}

/// One part of a [`MultipartForm`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormPart {
    /// A plain text field.
    Text {
        /// Field name.
        name: String,
        /// Field value.
        value: String,
    },
    /// A file upload.
    File {
        /// Field name.
        name: String,
        /// File name sent in the part's disposition.
        file_name: String,
        /// MIME type, if known.
        content_type: Option<String>,
        /// File contents.
        bytes: Vec<u8>,
    },
}

/// A multipart form body.
///
/// Unlike `reqwest::multipart::Form`, this type is `Clone`, so a retried
/// request can send the same form again.
///
/// # Example
///
/// ```rust
/// use sellauth::clients::MultipartForm;
///
/// let form = MultipartForm::new()
///     .text("name", "My Shop")
///     .file("logo", "logo.png", vec![0x89, 0x50, 0x4e, 0x47]);
///
/// assert_eq!(form.parts().len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

impl MultipartForm {
    /// Creates an empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a text field.
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Adds a file part with no explicit MIME type.
    #[must_use]
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            content_type: None,
            bytes,
        });
        self
    }

    /// Adds a file part with a MIME type.
    #[must_use]
    pub fn file_with_type(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            content_type: Some(content_type.into()),
            bytes,
        });
        self
    }

    /// Returns the parts in insertion order.
    #[must_use]
    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    /// Converts the form for sending with reqwest.
    ///
    /// # Errors
    ///
    /// Returns an error if a part's MIME type cannot be parsed.
    pub fn to_reqwest(&self) -> Result<reqwest::multipart::Form, reqwest::Error> {
        let mut form = reqwest::multipart::Form::new();
        for part in &self.parts {
            form = match part {
                FormPart::Text { name, value } => form.text(name.clone(), value.clone()),
                FormPart::File {
                    name,
                    file_name,
                    content_type,
                    bytes,
                } => {
                    let mut file = reqwest::multipart::Part::bytes(bytes.clone())
                        .file_name(file_name.clone());
                    if let Some(mime) = content_type {
                        file = file.mime_str(mime)?;
                    }
                    form.part(name.clone(), file)
                }
            };
        }
        Ok(form)
    }
}

/// A request payload as supplied by the caller.
///
/// The variant decides how the body is encoded; nothing is inferred from
/// the runtime shape of the value.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    /// A JSON value, serialized with `Content-Type: application/json`.
    Json(Value),
    /// A raw string sent as-is.
    Text(String),
    /// Raw bytes sent as-is.
    Binary(Vec<u8>),
    /// A multipart form.
    Multipart(MultipartForm),
}

/// A request payload after normalization.
///
/// Decided once when the request is built and never re-derived downstream.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// Serialized JSON.
    Json(String),
    /// A raw string.
    Text(String),
    /// Raw bytes.
    Binary(Vec<u8>),
    /// A multipart form.
    Multipart(MultipartForm),
}

impl RequestBody {
    /// Returns `true` when there is no body.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Per-call options accepted by [`SellAuthClient::request`](crate::SellAuthClient::request).
///
/// # Example
///
/// ```rust
/// use sellauth::clients::{RequestOptions, ResponseType};
/// use serde_json::json;
/// use std::time::Duration;
///
/// let options = RequestOptions::new()
///     .query(json!({"page": 2, "statuses": ["pending", "paid"]}))
///     .header("X-Trace", "abc")
///     .timeout(Duration::from_secs(5))
///     .response_type(ResponseType::Json);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    /// Query parameters (an object; see [`build_query`](crate::clients::build_query)).
    pub query: Option<Value>,
    /// The request body.
    pub body: Option<Body>,
    /// Extra headers; these override client defaults.
    pub headers: HashMap<String, String>,
    /// Cancellation token honored by the transport.
    pub signal: Option<CancellationToken>,
    /// Per-request timeout overriding the client default.
    pub timeout: Option<Duration>,
    /// How to interpret the response body.
    pub response_type: Option<ResponseType>,
}

impl RequestOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets query parameters from a JSON object.
    #[must_use]
    pub fn query(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }

    /// Sets query parameters from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRequestError::Query`] if the value cannot be serialized.
    pub fn try_query<T: Serialize + ?Sized>(mut self, query: &T) -> Result<Self, SellAuthError> {
        let value = serde_json::to_value(query).map_err(InvalidRequestError::Query)?;
        self.query = Some(value);
        Ok(self)
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets a JSON body.
    #[must_use]
    pub fn json(self, body: impl Into<Value>) -> Self {
        self.body(Body::Json(body.into()))
    }

    /// Sets a JSON body from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRequestError::Body`] if the value cannot be serialized.
    pub fn try_json<T: Serialize + ?Sized>(self, body: &T) -> Result<Self, SellAuthError> {
        let value = serde_json::to_value(body).map_err(InvalidRequestError::Body)?;
        Ok(self.body(Body::Json(value)))
    }

    /// Sets a multipart body.
    #[must_use]
    pub fn multipart(self, form: MultipartForm) -> Self {
        self.body(Body::Multipart(form))
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Attaches a cancellation token.
    #[must_use]
    pub fn signal(mut self, token: CancellationToken) -> Self {
        self.signal = Some(token);
        self
    }

    /// Overrides the timeout for this request.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets how the response body is interpreted.
    #[must_use]
    pub const fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }
}

/// The canonical in-pipeline representation of an outgoing call.
///
/// The method and URL are fixed at construction and only readable through
/// [`method`](Self::method) and [`url`](Self::url). Middleware may rewrite
/// `headers` and `body`.
///
/// ```rust,compile_fail
/// use sellauth::clients::NormalizedRequest;
/// use sellauth::HttpMethod;
/// use std::time::Duration;
///
/// let mut req = NormalizedRequest::new(HttpMethod::Get, "https://a.test", Duration::from_secs(1));
/// req.url = "https://b.test".to_string();
/// ```
#[derive(Clone, Debug)]
pub struct NormalizedRequest {
    method: HttpMethod,
    url: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Normalized body.
    pub body: RequestBody,
    /// Optional cancellation token.
    pub signal: Option<CancellationToken>,
    /// Deadline for a single attempt.
    pub timeout: Duration,
    /// How the response body is interpreted.
    pub response_type: ResponseType,
}

impl NormalizedRequest {
    /// Creates a request with no headers, no body, no cancellation token and
    /// JSON response handling.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: RequestBody::Empty,
            signal: None,
            timeout,
            response_type: ResponseType::Json,
        }
    }

    /// HTTP verb.
    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    /// Fully qualified URL including the query string.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Looks up a header case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` if the header is present (case-insensitive).
    #[must_use]
    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    /// Sets a header, replacing any existing spelling of the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|key, _| !key.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
    }

    /// Returns `true` once the caller's cancellation token has fired.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.signal
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}
