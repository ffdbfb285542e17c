//! The SellAuth API client.
//!
//! [`SellAuthClient`] owns the configuration and the assembled middleware
//! pipeline, and exposes the single [`request`](SellAuthClient::request)
//! entry point every resource wrapper goes through.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::clients::errors::{InvalidRequestError, SellAuthError};
use crate::clients::http_request::{Body, HttpMethod, NormalizedRequest, RequestBody, RequestOptions};
use crate::clients::http_response::ResponseData;
use crate::clients::middleware::{
    AuthMiddleware, LoggingMiddleware, Middleware, Pipeline, ResponseParsingMiddleware,
    RetryMiddleware,
};
use crate::clients::query::{append_query, build_query};
use crate::clients::transport::{ReqwestTransport, Transport};
use crate::config::{ApiKey, ClientConfig};
use crate::resources::{
    AnalyticsApi, BlacklistApi, CheckoutApi, CryptoWalletApi, CustomersApi, InvoicesApi,
    NotificationsApi, ProductsApi, ShopsApi,
};

/// SDK version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Callbacks around each whole pipeline invocation.
///
/// `before_request` sees the fully built request (before authentication is
/// attached). `after_response` sees the decoded data of a successful call.
/// Returning an error from either hook fails the call with that error.
#[async_trait]
pub trait RequestHooks: Send + Sync {
    /// Runs before the request enters the pipeline.
    ///
    /// # Errors
    ///
    /// An error aborts the call before anything is sent.
    async fn before_request(&self, _request: &NormalizedRequest) -> Result<(), SellAuthError> {
        Ok(())
    }

    /// Runs after a successful response has been decoded.
    ///
    /// # Errors
    ///
    /// An error replaces the successful result.
    async fn after_response(
        &self,
        _data: Option<&ResponseData>,
        _request: &NormalizedRequest,
    ) -> Result<(), SellAuthError> {
        Ok(())
    }
}

/// Anything that can perform a SellAuth API call.
///
/// Resource wrappers depend on this trait only, so they can be driven by a
/// stub in tests.
#[async_trait]
pub trait Requester: Send + Sync {
    /// Performs a request and decodes the response data into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`SellAuthError`] for API, transport, build or decode failures.
    async fn request<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, SellAuthError>;
}

/// Client for the SellAuth REST API.
///
/// The middleware pipeline is built once in [`new`](Self::new) and shared by
/// every call; concurrent requests on one client need no locking.
///
/// # Thread Safety
///
/// `SellAuthClient` is `Clone`, `Send` and `Sync`. Clones share the
/// transport and middleware.
///
/// # Example
///
/// ```rust,no_run
/// use sellauth::{HttpMethod, RequestOptions, SellAuthClient};
/// use serde_json::{json, Value};
///
/// # async fn run() -> Result<(), sellauth::SellAuthError> {
/// let client = SellAuthClient::from_api_key("sk_live_123")?;
///
/// let invoices: Value = client
///     .request(
///         HttpMethod::Get,
///         "/shops/42/invoices",
///         RequestOptions::new().query(json!({"statuses": ["pending", "paid"]})),
///     )
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct SellAuthClient {
    config: ClientConfig,
    pipeline: Pipeline,
}

// Verify SellAuthClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SellAuthClient>();
};

impl SellAuthClient {
    /// Creates a client and assembles its pipeline.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the default HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self, SellAuthError> {
        let transport: Arc<dyn Transport> = match config.transport() {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };

        let mut stages: Vec<Arc<dyn Middleware>> = config.middleware().to_vec();
        stages.push(Arc::new(AuthMiddleware::new(
            config.api_key().cloned(),
            config.auth().cloned(),
            config.logger(),
        )));
        stages.extend(config.authenticated_middleware().iter().cloned());
        if let Some(logger) = config.logger() {
            stages.push(Arc::new(LoggingMiddleware::new(
                logger,
                config.sanitize().clone(),
            )));
        }
        stages.push(Arc::new(RetryMiddleware::new(
            config.retry().clone(),
            config.logger(),
        )));
        stages.push(Arc::new(ResponseParsingMiddleware));

        tracing::debug!(
            target: "sellauth",
            base_url = %config.base_url(),
            stages = stages.len(),
            attempts = config.retry().attempts(),
            "client created"
        );

        Ok(Self {
            pipeline: Pipeline::new(stages, transport),
            config,
        })
    }

    /// Creates a client with default settings and the given API key.
    ///
    /// # Errors
    ///
    /// Returns a config error if the key is empty.
    pub fn from_api_key(api_key: impl Into<String>) -> Result<Self, SellAuthError> {
        let config = ClientConfig::builder().api_key(ApiKey::new(api_key)?).build()?;
        Self::new(config)
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Performs a request and decodes the response data into `T`.
    ///
    /// A missing body (e.g. 204) decodes from JSON `null`, so `Option<_>` or
    /// `()` are the natural targets for such endpoints. Text responses
    /// decode from a JSON string.
    ///
    /// # Errors
    ///
    /// - [`SellAuthError::Api`] for non-2xx responses
    /// - [`SellAuthError::Transport`] when no response arrived
    /// - [`SellAuthError::InvalidRequest`] when the request cannot be built
    /// - [`SellAuthError::Decode`] when the data does not match `T`
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, SellAuthError> {
        let data = self.request_data(method, path, options).await?;
        decode(data)
    }

    /// Performs a request and returns the decoded data without typing it.
    ///
    /// # Errors
    ///
    /// Same as [`request`](Self::request), minus decoding failures.
    pub async fn request_data(
        &self,
        method: HttpMethod,
        path: &str,
        options: RequestOptions,
    ) -> Result<Option<ResponseData>, SellAuthError> {
        let mut req = self.normalize(method, path, options)?;
        let hooks = self.config.hooks();

        if let Some(hooks) = &hooks {
            hooks.before_request(&req).await?;
        }

        let res = self.pipeline.execute(&mut req).await?;

        if let Some(hooks) = &hooks {
            hooks.after_response(res.data.as_ref(), &req).await?;
        }

        Ok(res.data)
    }

    /// Builds the normalized request for a call.
    fn normalize(
        &self,
        method: HttpMethod,
        path: &str,
        options: RequestOptions,
    ) -> Result<NormalizedRequest, SellAuthError> {
        let mut url = self.config.base_url().join(path);
        if let Some(query) = &options.query {
            url = append_query(&url, &build_query(query));
        }

        let timeout = options.timeout.unwrap_or_else(|| self.config.timeout());
        let mut req = NormalizedRequest::new(method, url, timeout);
        req.signal = options.signal;
        req.response_type = options.response_type.unwrap_or_default();

        req.set_header("Accept", "application/json");
        req.set_header("User-Agent", self.config.user_agent());
        for (name, value) in self.config.headers() {
            req.set_header(name.clone(), value.clone());
        }
        for (name, value) in options.headers {
            req.set_header(name, value);
        }

        req.body = match options.body {
            None => RequestBody::Empty,
            Some(Body::Json(value)) => {
                let json = serde_json::to_string(&value).map_err(InvalidRequestError::Body)?;
                if !req.has_header("Content-Type") {
                    req.set_header("Content-Type", "application/json");
                }
                RequestBody::Json(json)
            }
            Some(Body::Text(text)) => RequestBody::Text(text),
            Some(Body::Binary(bytes)) => RequestBody::Binary(bytes),
            Some(Body::Multipart(form)) => RequestBody::Multipart(form),
        };

        Ok(req)
    }

    /// Shop-level endpoints.
    #[must_use]
    pub const fn shops(&self) -> ShopsApi<'_, Self> {
        ShopsApi::new(self)
    }

    /// Product endpoints of a shop.
    #[must_use]
    pub fn products(&self, shop_id: impl ToString) -> ProductsApi<'_, Self> {
        ProductsApi::new(self, shop_id)
    }

    /// Invoice endpoints of a shop.
    #[must_use]
    pub fn invoices(&self, shop_id: impl ToString) -> InvoicesApi<'_, Self> {
        InvoicesApi::new(self, shop_id)
    }

    /// Checkout endpoint of a shop.
    #[must_use]
    pub fn checkout(&self, shop_id: impl ToString) -> CheckoutApi<'_, Self> {
        CheckoutApi::new(self, shop_id)
    }

    /// Customer endpoints of a shop.
    #[must_use]
    pub fn customers(&self, shop_id: impl ToString) -> CustomersApi<'_, Self> {
        CustomersApi::new(self, shop_id)
    }

    /// Blacklist endpoints of a shop.
    #[must_use]
    pub fn blacklist(&self, shop_id: impl ToString) -> BlacklistApi<'_, Self> {
        BlacklistApi::new(self, shop_id)
    }

    /// Analytics endpoints of a shop.
    #[must_use]
    pub fn analytics(&self, shop_id: impl ToString) -> AnalyticsApi<'_, Self> {
        AnalyticsApi::new(self, shop_id)
    }

    /// Crypto wallet payout endpoints of a shop.
    #[must_use]
    pub fn crypto_wallet(&self, shop_id: impl ToString) -> CryptoWalletApi<'_, Self> {
        CryptoWalletApi::new(self, shop_id)
    }

    /// Notification endpoints of a shop.
    #[must_use]
    pub fn notifications(&self, shop_id: impl ToString) -> NotificationsApi<'_, Self> {
        NotificationsApi::new(self, shop_id)
    }
}

#[async_trait]
impl Requester for SellAuthClient {
    async fn request<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, SellAuthError> {
        let data = self.request_data(method, path, options).await?;
        decode(data)
    }
}

fn decode<T: DeserializeOwned>(data: Option<ResponseData>) -> Result<T, SellAuthError> {
    let value = data.map_or(Value::Null, ResponseData::into_value);
    serde_json::from_value(value).map_err(SellAuthError::Decode)
}
