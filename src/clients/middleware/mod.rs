//! The request middleware chain.
//!
//! Each [`Middleware`] receives the request and a [`Next`] handle for the
//! rest of the chain. It may edit the request, call `next.run` zero or more
//! times, and inspect or replace the response on the way back.
//!
//! The client assembles the chain once, outer to inner:
//!
//! ```text
//! user middleware -> auth -> authenticated middleware -> logging (if a logger is set)
//!     -> retry -> parse -> transport
//! ```
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use sellauth::clients::middleware::{Middleware, Next};
//! use sellauth::clients::{NormalizedRequest, Response, SellAuthError};
//!
//! struct Tenant(&'static str);
//!
//! #[async_trait]
//! impl Middleware for Tenant {
//!     async fn handle(
//!         &self,
//!         req: &mut NormalizedRequest,
//!         next: Next<'_>,
//!     ) -> Result<Response, SellAuthError> {
//!         req.set_header("X-Tenant", self.0);
//!         next.run(req).await
//!     }
//! }
//! ```

mod auth;
mod cache;
mod logging;
mod parse;
mod retry;

pub use auth::AuthMiddleware;
pub use cache::CacheMiddleware;
pub use logging::{LoggingMiddleware, SanitizeOptions, DEFAULT_SENSITIVE_HEADERS};
pub use parse::ResponseParsingMiddleware;
pub use retry::RetryMiddleware;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::clients::errors::SellAuthError;
use crate::clients::http_request::NormalizedRequest;
use crate::clients::http_response::Response;
use crate::clients::transport::Transport;

/// One stage of the request pipeline.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Handles the request, usually by delegating to `next`.
    ///
    /// # Errors
    ///
    /// Implementations propagate errors from `next` unchanged unless they
    /// deliberately convert them.
    async fn handle(
        &self,
        req: &mut NormalizedRequest,
        next: Next<'_>,
    ) -> Result<Response, SellAuthError>;
}

/// The remainder of the chain after the current middleware.
///
/// `Next` is `Copy`, so a middleware can invoke the rest of the chain more
/// than once (the retry middleware does).
#[derive(Clone, Copy)]
pub struct Next<'a> {
    middleware: &'a [Arc<dyn Middleware>],
    transport: &'a dyn Transport,
}

impl<'a> Next<'a> {
    pub(crate) const fn new(
        middleware: &'a [Arc<dyn Middleware>],
        transport: &'a dyn Transport,
    ) -> Self {
        Self {
            middleware,
            transport,
        }
    }

    /// Runs the rest of the chain, ending at the transport.
    ///
    /// # Errors
    ///
    /// Returns whatever the next middleware or the transport returns.
    pub async fn run(self, req: &mut NormalizedRequest) -> Result<Response, SellAuthError> {
        match self.middleware.split_first() {
            Some((current, rest)) => {
                current
                    .handle(req, Next::new(rest, self.transport))
                    .await
            }
            None => self.transport.execute(req).await,
        }
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.middleware.len())
            .finish_non_exhaustive()
    }
}

/// An assembled middleware chain with its terminal transport.
#[derive(Clone)]
pub struct Pipeline {
    middleware: Vec<Arc<dyn Middleware>>,
    transport: Arc<dyn Transport>,
}

impl Pipeline {
    /// Creates a pipeline. `middleware` is ordered outermost first.
    #[must_use]
    pub fn new(middleware: Vec<Arc<dyn Middleware>>, transport: Arc<dyn Transport>) -> Self {
        Self {
            middleware,
            transport,
        }
    }

    /// Returns the number of middleware stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    /// Returns `true` when requests go straight to the transport.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Sends a request through every stage.
    ///
    /// # Errors
    ///
    /// Returns the first error that escapes the chain.
    pub async fn execute(&self, req: &mut NormalizedRequest) -> Result<Response, SellAuthError> {
        Next::new(&self.middleware, self.transport.as_ref())
            .run(req)
            .await
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.middleware.len())
            .finish_non_exhaustive()
    }
}
