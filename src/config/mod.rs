//! Configuration types for the SellAuth SDK.
//!
//! This module provides the configuration used to construct a
//! [`SellAuthClient`](crate::SellAuthClient).
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`ClientConfig`]: Immutable client settings
//! - [`ClientConfigBuilder`]: A builder for constructing [`ClientConfig`] instances
//! - [`ApiKey`]: A validated API key with masked debug output
//! - [`BaseUrl`]: A validated API base URL
//! - [`RetryPolicy`]: Retry attempts and backoff
//! - [`AuthConfig`]: How credentials are attached
//! - [`Logger`]: Optional structured logging sink
//!
//! # Example
//!
//! ```rust
//! use sellauth::{ApiKey, ClientConfig, RetryPolicy};
//! use std::time::Duration;
//!
//! let config = ClientConfig::builder()
//!     .api_key(ApiKey::new("sk_live_123").unwrap())
//!     .timeout(Duration::from_secs(10))
//!     .retry(RetryPolicy::with_attempts(5))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.timeout(), Duration::from_secs(10));
//! ```

mod auth;
mod logger;
mod newtypes;
mod retry;

pub use auth::{AuthConfig, AuthStrategy, Authorizer, TokenProvider};
pub use logger::{Logger, TracingLogger};
pub use newtypes::{ApiKey, BaseUrl};
pub use retry::{
    Backoff, RetryContext, RetryPolicy, RetryPredicate, DEFAULT_RETRY_METHODS,
    DEFAULT_RETRY_STATUS_CODES, JITTER_FACTOR,
};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::clients::middleware::{Middleware, SanitizeOptions};
use crate::clients::{RequestHooks, Transport, SDK_VERSION};
use crate::error::ConfigError;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Configuration for the SellAuth SDK.
///
/// # Thread Safety
///
/// `ClientConfig` is `Clone`, `Send`, and `Sync`. Pluggable components are
/// held behind `Arc`, so clones share them.
#[derive(Clone)]
pub struct ClientConfig {
    api_key: Option<ApiKey>,
    base_url: BaseUrl,
    user_agent: String,
    timeout: Duration,
    retry: RetryPolicy,
    headers: HashMap<String, String>,
    auth: Option<AuthConfig>,
    transport: Option<Arc<dyn Transport>>,
    middleware: Vec<Arc<dyn Middleware>>,
    authenticated_middleware: Vec<Arc<dyn Middleware>>,
    logger: Option<Arc<dyn Logger>>,
    hooks: Option<Arc<dyn RequestHooks>>,
    sanitize: SanitizeOptions,
}

impl ClientConfig {
    /// Creates a new builder for constructing a `ClientConfig`.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Returns the API key, if configured.
    #[must_use]
    pub const fn api_key(&self) -> Option<&ApiKey> {
        self.api_key.as_ref()
    }

    /// Returns the base URL.
    #[must_use]
    pub const fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Returns the `User-Agent` header value.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Returns the default per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the retry policy.
    #[must_use]
    pub const fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Returns headers sent with every request.
    #[must_use]
    pub const fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Returns the explicit auth configuration, if any.
    #[must_use]
    pub const fn auth(&self) -> Option<&AuthConfig> {
        self.auth.as_ref()
    }

    /// Returns the transport override, if any.
    #[must_use]
    pub fn transport(&self) -> Option<Arc<dyn Transport>> {
        self.transport.clone()
    }

    /// Returns the user middleware, outermost first.
    #[must_use]
    pub fn middleware(&self) -> &[Arc<dyn Middleware>] {
        &self.middleware
    }

    /// Returns the middleware that runs after authentication, outermost first.
    #[must_use]
    pub fn authenticated_middleware(&self) -> &[Arc<dyn Middleware>] {
        &self.authenticated_middleware
    }

    /// Returns the logger, if any.
    #[must_use]
    pub fn logger(&self) -> Option<Arc<dyn Logger>> {
        self.logger.clone()
    }

    /// Returns the request hooks, if any.
    #[must_use]
    pub fn hooks(&self) -> Option<Arc<dyn RequestHooks>> {
        self.hooks.clone()
    }

    /// Returns the header sanitization options used by the logging middleware.
    #[must_use]
    pub const fn sanitize(&self) -> &SanitizeOptions {
        &self.sanitize
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.api_key)
            .field("base_url", &self.base_url)
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("auth", &self.auth)
            .field("transport", &self.transport.as_ref().map(|_| "custom"))
            .field("middleware", &self.middleware.len())
            .field("authenticated_middleware", &self.authenticated_middleware.len())
            .field("logger", &self.logger.is_some())
            .field("hooks", &self.hooks.is_some())
            .finish_non_exhaustive()
    }
}

// Verify ClientConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ClientConfig>();
};

/// Builder for constructing [`ClientConfig`] instances.
///
/// Every field is optional. A client without credentials still builds; the
/// auth middleware warns and the server answers 401.
///
/// # Defaults
///
/// - `base_url`: `https://api.sellauth.com/v1`
/// - `timeout`: 15 seconds
/// - `retry`: [`RetryPolicy::default`] (3 attempts, exponential)
/// - `user_agent`: `sellauth-sdk-rust/<version>`
/// - `auth`: API key as `Authorization: Bearer <key>`
#[derive(Default)]
pub struct ClientConfigBuilder {
    api_key: Option<ApiKey>,
    base_url: Option<BaseUrl>,
    user_agent: Option<String>,
    timeout: Option<Duration>,
    retry: Option<RetryPolicy>,
    headers: HashMap<String, String>,
    auth: Option<AuthConfig>,
    transport: Option<Arc<dyn Transport>>,
    middleware: Vec<Arc<dyn Middleware>>,
    authenticated_middleware: Vec<Arc<dyn Middleware>>,
    logger: Option<Arc<dyn Logger>>,
    hooks: Option<Arc<dyn RequestHooks>>,
    sanitize: Option<SanitizeOptions>,
}

impl ClientConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Sets the base URL.
    #[must_use]
    pub fn base_url(mut self, url: BaseUrl) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the `User-Agent` header value.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Sets the default per-request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Shorthand for `retry(RetryPolicy::with_attempts(attempts))`.
    #[must_use]
    pub fn max_attempts(self, attempts: u32) -> Self {
        self.retry(RetryPolicy::with_attempts(attempts))
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the auth configuration.
    #[must_use]
    pub fn auth(mut self, auth: AuthConfig) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Replaces the network transport.
    #[must_use]
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Appends a user middleware. Earlier middleware wrap later ones, and
    /// all user middleware wrap the built-in layers.
    #[must_use]
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Appends a middleware that runs after credentials are attached and
    /// outside logging and retry.
    ///
    /// Anything keyed on the credential belongs here, for example
    /// [`CacheMiddleware`](crate::clients::middleware::CacheMiddleware).
    #[must_use]
    pub fn authenticated_middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.authenticated_middleware.push(Arc::new(middleware));
        self
    }

    /// Sets the logger and enables the logging middleware.
    #[must_use]
    pub fn logger(mut self, logger: impl Logger + 'static) -> Self {
        self.logger = Some(Arc::new(logger));
        self
    }

    /// Sets the before/after request hooks.
    #[must_use]
    pub fn hooks(mut self, hooks: impl RequestHooks + 'static) -> Self {
        self.hooks = Some(Arc::new(hooks));
        self
    }

    /// Sets header sanitization for the logging middleware.
    #[must_use]
    pub fn sanitize(mut self, options: SanitizeOptions) -> Self {
        self.sanitize = Some(options);
        self
    }

    /// Builds the [`ClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRetryPolicy`] if the retry policy is
    /// unusable and [`ConfigError::EmptyHeaderName`] if a default header has
    /// an empty name.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let retry = self.retry.unwrap_or_default();
        retry.validate()?;

        if self.headers.keys().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::EmptyHeaderName);
        }

        Ok(ClientConfig {
            api_key: self.api_key,
            base_url: self.base_url.unwrap_or_default(),
            user_agent: self
                .user_agent
                .unwrap_or_else(|| format!("sellauth-sdk-rust/{SDK_VERSION}")),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            retry,
            headers: self.headers,
            auth: self.auth,
            transport: self.transport,
            middleware: self.middleware,
            authenticated_middleware: self.authenticated_middleware,
            logger: self.logger,
            hooks: self.hooks,
            sanitize: self.sanitize.unwrap_or_default(),
        })
    }
}

impl fmt::Debug for ClientConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfigBuilder")
            .field("api_key", &self.api_key)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_provides_sensible_defaults() {
        let config = ClientConfig::builder().build().unwrap();

        assert_eq!(config.base_url().as_ref(), "https://api.sellauth.com/v1");
        assert_eq!(config.timeout(), Duration::from_millis(15_000));
        assert_eq!(config.retry().attempts(), 3);
        assert!(config.user_agent().starts_with("sellauth-sdk-rust/"));
        assert!(config.api_key().is_none());
        assert!(config.auth().is_none());
        assert!(config.logger().is_none());
        assert!(config.middleware().is_empty());
        assert!(config.authenticated_middleware().is_empty());
    }

    #[test]
    fn test_builder_with_all_optional_fields() {
        let config = ClientConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .base_url(BaseUrl::new("http://localhost:9000/v1").unwrap())
            .user_agent("MyApp/1.0")
            .timeout(Duration::from_secs(2))
            .max_attempts(5)
            .header("X-Tenant", "acme")
            .logger(TracingLogger)
            .build()
            .unwrap();

        assert_eq!(config.api_key().unwrap().as_ref(), "key");
        assert_eq!(config.base_url().as_ref(), "http://localhost:9000/v1");
        assert_eq!(config.user_agent(), "MyApp/1.0");
        assert_eq!(config.timeout(), Duration::from_secs(2));
        assert_eq!(config.retry().attempts(), 5);
        assert_eq!(config.headers().get("X-Tenant"), Some(&"acme".to_string()));
        assert!(config.logger().is_some());
    }

    #[test]
    fn test_builder_rejects_invalid_retry_policy() {
        let result = ClientConfig::builder()
            .retry(RetryPolicy::default().factor(f64::INFINITY))
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidRetryPolicy { .. })));
    }

    #[test]
    fn test_builder_rejects_empty_header_name() {
        let result = ClientConfig::builder().header(" ", "value").build();
        assert!(matches!(result, Err(ConfigError::EmptyHeaderName)));
    }

    #[test]
    fn test_debug_does_not_leak_api_key() {
        let config = ClientConfig::builder()
            .api_key(ApiKey::new("sk_live_secret").unwrap())
            .build()
            .unwrap();
        let debug = format!("{config:?}");
        assert!(debug.contains("ClientConfig"));
        assert!(!debug.contains("sk_live_secret"));
    }

    #[test]
    fn test_config_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClientConfig>();
    }
}
