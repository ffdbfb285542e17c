//! Authentication strategies.
//!
//! The default strategy sends the configured API key as a bearer token.
//! Rotating credentials are supported through [`TokenProvider`], and
//! anything else (request signing, multiple headers) through [`Authorizer`].

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::clients::{NormalizedRequest, SellAuthError};
use crate::config::ApiKey;

/// Supplies a bearer token for every request.
///
/// Called once per request, so short-lived tokens can be refreshed
/// transparently.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns the current token.
    ///
    /// # Errors
    ///
    /// Any error aborts the request before it reaches the network.
    async fn token(&self) -> Result<String, SellAuthError>;
}

/// Fully custom authorization that mutates the outgoing request.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Adds whatever authentication the request needs.
    ///
    /// # Errors
    ///
    /// Any error aborts the request before it reaches the network.
    async fn authorize(&self, request: &mut NormalizedRequest) -> Result<(), SellAuthError>;
}

/// How credentials are attached to requests.
#[derive(Clone, Default)]
pub enum AuthStrategy {
    /// Use the client's API key (the default).
    #[default]
    ApiKey,
    /// A fixed bearer token, independent of the client's API key.
    Bearer(ApiKey),
    /// A token fetched for every request.
    DynamicBearer(Arc<dyn TokenProvider>),
    /// A custom authorizer.
    Custom(Arc<dyn Authorizer>),
}

impl fmt::Debug for AuthStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey => f.write_str("ApiKey"),
            Self::Bearer(key) => f.debug_tuple("Bearer").field(key).finish(),
            Self::DynamicBearer(_) => f.write_str("DynamicBearer(..)"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Authentication configuration.
///
/// # Defaults
///
/// - `strategy`: [`AuthStrategy::ApiKey`]
/// - `header_name`: `Authorization`
/// - `scheme`: `Bearer`
///
/// # Example
///
/// ```rust
/// use sellauth::{ApiKey, AuthConfig, AuthStrategy};
///
/// let auth = AuthConfig::new(AuthStrategy::Bearer(ApiKey::new("token").unwrap()))
///     .header_name("X-Api-Key")
///     .scheme("Token");
///
/// assert_eq!(auth.header_value("token"), "Token token");
/// ```
#[derive(Clone, Debug)]
pub struct AuthConfig {
    strategy: AuthStrategy,
    header_name: String,
    scheme: String,
}

impl AuthConfig {
    /// Default header carrying the credential.
    pub const DEFAULT_HEADER: &'static str = "Authorization";
    /// Default scheme prefix.
    pub const DEFAULT_SCHEME: &'static str = "Bearer";

    /// Creates a configuration with the given strategy and default header/scheme.
    #[must_use]
    pub fn new(strategy: AuthStrategy) -> Self {
        Self {
            strategy,
            header_name: Self::DEFAULT_HEADER.to_string(),
            scheme: Self::DEFAULT_SCHEME.to_string(),
        }
    }

    /// Uses a dynamic token provider.
    #[must_use]
    pub fn dynamic(provider: impl TokenProvider + 'static) -> Self {
        Self::new(AuthStrategy::DynamicBearer(Arc::new(provider)))
    }

    /// Uses a custom authorizer.
    #[must_use]
    pub fn custom(authorizer: impl Authorizer + 'static) -> Self {
        Self::new(AuthStrategy::Custom(Arc::new(authorizer)))
    }

    /// Overrides the header name.
    #[must_use]
    pub fn header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    /// Overrides the scheme prefix. An empty scheme sends the bare token.
    #[must_use]
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Returns the strategy.
    #[must_use]
    pub const fn strategy(&self) -> &AuthStrategy {
        &self.strategy
    }

    /// Returns the header name.
    #[must_use]
    pub fn header(&self) -> &str {
        &self.header_name
    }

    /// Formats a token as a header value.
    #[must_use]
    pub fn header_value(&self, token: &str) -> String {
        if self.scheme.is_empty() {
            token.to_string()
        } else {
            format!("{} {token}", self.scheme)
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new(AuthStrategy::ApiKey)
    }
}
