use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::{Middleware, Next};
use crate::clients::errors::SellAuthError;
use crate::clients::http_request::NormalizedRequest;
use crate::clients::http_response::Response;
use crate::config::{ApiKey, AuthConfig, AuthStrategy, Logger};

/// Attaches credentials before the request continues down the chain.
///
/// Missing credentials are not an error here: a warning is logged and the
/// request is sent unauthenticated, leaving the server to answer 401.
pub struct AuthMiddleware {
    api_key: Option<ApiKey>,
    auth: AuthConfig,
    logger: Option<Arc<dyn Logger>>,
}

impl AuthMiddleware {
    /// Creates the middleware. Without an explicit `auth`, the API key is
    /// sent as `Authorization: Bearer <key>`.
    #[must_use]
    pub fn new(
        api_key: Option<ApiKey>,
        auth: Option<AuthConfig>,
        logger: Option<Arc<dyn Logger>>,
    ) -> Self {
        Self {
            api_key,
            auth: auth.unwrap_or_default(),
            logger,
        }
    }

    fn warn_missing(&self, req: &NormalizedRequest) {
        let fields = json!({ "method": req.method().as_str(), "url": req.url() });
        tracing::warn!(
            target: "sellauth",
            method = %req.method(),
            url = %req.url(),
            "no API key configured; sending request without credentials"
        );
        if let Some(logger) = &self.logger {
            logger.warn("No API key configured for SellAuth client", &fields);
        }
    }
}

#[async_trait]
impl Middleware for AuthMiddleware {
    async fn handle(
        &self,
        req: &mut NormalizedRequest,
        next: Next<'_>,
    ) -> Result<Response, SellAuthError> {
        match self.auth.strategy() {
            AuthStrategy::ApiKey => match &self.api_key {
                Some(key) => {
                    req.set_header(self.auth.header(), self.auth.header_value(key.as_ref()));
                }
                None => self.warn_missing(req),
            },
            AuthStrategy::Bearer(token) => {
                req.set_header(self.auth.header(), self.auth.header_value(token.as_ref()));
            }
            AuthStrategy::DynamicBearer(provider) => {
                let token = provider.token().await?;
                if token.trim().is_empty() {
                    self.warn_missing(req);
                } else {
                    req.set_header(self.auth.header(), self.auth.header_value(&token));
                }
            }
            AuthStrategy::Custom(authorizer) => authorizer.authorize(req).await?,
        }

        next.run(req).await
    }
}

impl std::fmt::Debug for AuthMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthMiddleware")
            .field("api_key", &self.api_key)
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}
