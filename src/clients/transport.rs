//! The network transport at the bottom of the middleware chain.
//!
//! A [`Transport`] performs exactly one network call. It does not retry,
//! authenticate or parse; those are middleware concerns.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::clients::errors::{InvalidRequestError, SellAuthError, TransportError};
use crate::clients::http_request::{HttpMethod, NormalizedRequest, RequestBody};
use crate::clients::http_response::Response;

/// Executes a single HTTP request.
///
/// Implement this to replace the network layer (e.g. in tests).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and returns the raw response.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] (wrapped in [`SellAuthError`]) when no
    /// response was received.
    async fn execute(&self, request: &NormalizedRequest) -> Result<Response, SellAuthError>;
}

/// The default transport, backed by `reqwest`.
///
/// Bodies on GET and HEAD requests are dropped. The request's timeout and
/// cancellation token are both honored until the body has been read;
/// whichever fires first aborts the call.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

// Verify ReqwestTransport is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ReqwestTransport>();
};

impl ReqwestTransport {
    /// Creates a transport with a rustls-backed client.
    ///
    /// # Errors
    ///
    /// Returns a network error if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, SellAuthError> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(TransportError::Network)?;
        Ok(Self { client })
    }

    /// Wraps an existing reqwest client (shared pools, proxies, etc.).
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn build(&self, request: &NormalizedRequest) -> Result<reqwest::RequestBuilder, SellAuthError> {
        let url = reqwest::Url::parse(request.url()).map_err(|_| InvalidRequestError::InvalidUrl {
            url: request.url().to_string(),
        })?;

        let mut builder = self.client.request(to_reqwest_method(request.method()), url);
        builder = builder.headers(to_header_map(&request.headers)?);

        if !request.method().forbids_body() {
            builder = match &request.body {
                RequestBody::Empty => builder,
                RequestBody::Json(json) | RequestBody::Text(json) => builder.body(json.clone()),
                RequestBody::Binary(bytes) => builder.body(bytes.clone()),
                RequestBody::Multipart(form) => {
                    builder.multipart(form.to_reqwest().map_err(TransportError::Network)?)
                }
            };
        }

        Ok(builder)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &NormalizedRequest) -> Result<Response, SellAuthError> {
        let builder = self.build(request)?;
        let timeout_ms = u64::try_from(request.timeout.as_millis()).unwrap_or(u64::MAX);
        // One deadline covers the headers and the body read.
        let deadline = Instant::now() + request.timeout;
        let send = tokio::time::timeout_at(deadline, builder.send());

        // The timeout future owns its timer, so it is dropped on every exit path.
        let result = match &request.signal {
            Some(signal) => tokio::select! {
                biased;
                () = signal.cancelled() => return Err(TransportError::Aborted.into()),
                result = send => result,
            },
            None => send.await,
        };

        let res = result
            .map_err(|_| TransportError::Timeout { timeout_ms })?
            .map_err(TransportError::Network)?;

        let status = res.status().as_u16();
        let headers = parse_response_headers(res.headers());
        let body = read_body(res, deadline, timeout_ms, request.signal.clone());

        Ok(Response::deferred(status, headers, Box::pin(body)))
    }
}

/// Reads the body under the request's deadline and cancellation token.
async fn read_body(
    res: reqwest::Response,
    deadline: Instant,
    timeout_ms: u64,
    signal: Option<CancellationToken>,
) -> Result<String, SellAuthError> {
    let read = tokio::time::timeout_at(deadline, res.text());
    let result = match signal {
        Some(signal) => tokio::select! {
            biased;
            () = signal.cancelled() => return Err(TransportError::Aborted.into()),
            result = read => result,
        },
        None => read.await,
    };
    result
        .map_err(|_| TransportError::Timeout { timeout_ms })?
        .map_err(|e| TransportError::Network(e).into())
}

const fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Head => reqwest::Method::HEAD,
        HttpMethod::Options => reqwest::Method::OPTIONS,
    }
}

fn to_header_map(headers: &HashMap<String, String>) -> Result<HeaderMap, SellAuthError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let invalid = || InvalidRequestError::InvalidHeader { name: name.clone() };
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

/// Parses response headers into lowercase names with all values kept.
fn parse_response_headers(headers: &HeaderMap) -> HashMap<String, Vec<String>> {
    let mut result: HashMap<String, Vec<String>> = HashMap::new();
    for (name, value) in headers {
        let key = name.as_str().to_lowercase();
        let value = value.to_str().unwrap_or_default().to_string();
        result.entry(key).or_default().push(value);
    }
    result
}
