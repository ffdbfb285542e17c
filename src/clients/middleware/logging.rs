use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::{Middleware, Next};
use crate::clients::errors::SellAuthError;
use crate::clients::http_request::NormalizedRequest;
use crate::clients::http_response::Response;
use crate::config::Logger;

/// Header names redacted by default (compared case-insensitively).
pub const DEFAULT_SENSITIVE_HEADERS: [&str; 9] = [
    "authorization",
    "proxy-authorization",
    "x-api-key",
    "x-api-token",
    "x-amz-security-token",
    "x-aws-credentials",
    "authentication",
    "cookie",
    "set-cookie",
];

const REDACTED: &str = "[REDACTED]";

/// Values longer than this keep their last four characters for correlation.
const SUFFIX_THRESHOLD: usize = 12;

/// Controls how request headers are redacted before logging.
///
/// # Example
///
/// ```rust
/// use sellauth::clients::middleware::SanitizeOptions;
///
/// let options = SanitizeOptions::default()
///     .sensitive_header("X-Session")
///     .allow_header("cookie");
///
/// assert_eq!(options.sanitize_value("x-session", "short"), "[REDACTED]");
/// assert_eq!(options.sanitize_value("cookie", "a=b"), "a=b");
/// ```
#[derive(Clone, Debug)]
pub struct SanitizeOptions {
    sensitive: HashSet<String>,
    allow: HashSet<String>,
    mask: Option<String>,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            sensitive: DEFAULT_SENSITIVE_HEADERS
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
            allow: HashSet::new(),
            mask: None,
        }
    }
}

impl SanitizeOptions {
    /// Adds a header name to redact.
    #[must_use]
    pub fn sensitive_header(mut self, name: &str) -> Self {
        self.sensitive.insert(name.to_ascii_lowercase());
        self
    }

    /// Exempts a header name from redaction.
    #[must_use]
    pub fn allow_header(mut self, name: &str) -> Self {
        self.allow.insert(name.to_ascii_lowercase());
        self
    }

    /// Replaces every redacted value with a fixed mask.
    #[must_use]
    pub fn mask(mut self, mask: impl Into<String>) -> Self {
        self.mask = Some(mask.into());
        self
    }

    /// Returns the loggable form of a header value.
    #[must_use]
    pub fn sanitize_value(&self, name: &str, value: &str) -> String {
        let name = name.to_ascii_lowercase();
        if self.allow.contains(&name) || !self.sensitive.contains(&name) {
            return value.to_string();
        }
        if let Some(mask) = &self.mask {
            return mask.clone();
        }
        let chars: Vec<char> = value.chars().collect();
        if chars.len() > SUFFIX_THRESHOLD {
            let suffix: String = chars[chars.len() - 4..].iter().collect();
            format!("[REDACTED:{suffix}]")
        } else {
            REDACTED.to_string()
        }
    }

    /// Returns a redacted copy of a header map as a JSON object.
    #[must_use]
    pub fn sanitize_headers(&self, headers: &HashMap<String, String>) -> Value {
        let map: Map<String, Value> = headers
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(self.sanitize_value(name, value))))
            .collect();
        Value::Object(map)
    }
}

/// Logs each request, its outcome and timing through the configured [`Logger`].
///
/// Request headers are sanitized. Response headers and bodies are never
/// logged.
pub struct LoggingMiddleware {
    logger: Arc<dyn Logger>,
    sanitize: SanitizeOptions,
}

impl LoggingMiddleware {
    /// Creates the middleware.
    #[must_use]
    pub fn new(logger: Arc<dyn Logger>, sanitize: SanitizeOptions) -> Self {
        Self { logger, sanitize }
    }
}

#[async_trait]
impl Middleware for LoggingMiddleware {
    async fn handle(
        &self,
        req: &mut NormalizedRequest,
        next: Next<'_>,
    ) -> Result<Response, SellAuthError> {
        let started = Instant::now();
        self.logger.debug(
            "request",
            &json!({
                "method": req.method().as_str(),
                "url": req.url(),
                "headers": self.sanitize.sanitize_headers(&req.headers),
            }),
        );

        let url = req.url().to_string();
        let result = next.run(req).await;
        let ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match &result {
            Ok(res) => self.logger.debug(
                "response",
                &json!({ "url": url, "status": res.status, "ms": ms }),
            ),
            Err(error) => self.logger.error(
                "error",
                &json!({ "url": url, "error": error.to_string(), "ms": ms }),
            ),
        }

        result
    }
}

impl std::fmt::Debug for LoggingMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingMiddleware")
            .field("sanitize", &self.sanitize)
            .finish_non_exhaustive()
    }
}
