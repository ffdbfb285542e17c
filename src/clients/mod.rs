//! HTTP client types for SellAuth API communication.
//!
//! This module holds the request execution core: request and response
//! types, the network [`Transport`], the [`middleware`] chain and the
//! [`SellAuthClient`] that assembles them.
//!
//! # Overview
//!
//! - [`SellAuthClient`]: builds the pipeline once and exposes `request`
//! - [`RequestOptions`]: per-call query, body, headers, timeout, cancellation
//! - [`NormalizedRequest`]: the request as it flows through middleware
//! - [`Response`]: the transport's answer, with decoded [`ResponseData`]
//! - [`Transport`] / [`ReqwestTransport`]: exactly one network call
//! - [`SellAuthError`]: the single error shape callers observe
//!
//! # Request flow
//!
//! ```text
//! request() -> normalize -> before_request hook
//!           -> user middleware -> auth -> authenticated middleware -> logging?
//!           -> retry -> parse -> transport
//!           -> after_response hook -> data
//! ```

mod client;
mod errors;
mod http_request;
mod http_response;
pub mod middleware;
mod query;
mod transport;

pub use client::{RequestHooks, Requester, SellAuthClient, SDK_VERSION};
pub use errors::{ApiError, ErrorCode, InvalidRequestError, SellAuthError, TransportError};
pub use http_request::{
    Body, FormPart, HttpMethod, MultipartForm, NormalizedRequest, RequestBody, RequestOptions,
    ResponseType,
};
pub use http_response::{BodyFuture, Response, ResponseData};
pub use query::{append_query, build_query};
pub use transport::{ReqwestTransport, Transport};
