//! Retry policy configuration.
//!
//! A [`RetryPolicy`] describes how many times a request is attempted and how
//! long to wait between attempts. It is consumed by
//! [`RetryMiddleware`](crate::clients::middleware::RetryMiddleware).

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::clients::{HttpMethod, NormalizedRequest, Response, SellAuthError};
use crate::error::ConfigError;

/// Symmetric jitter applied to exponential delays (plus or minus 20%).
pub const JITTER_FACTOR: f64 = 0.2;

/// Status codes retried by the default policy.
pub const DEFAULT_RETRY_STATUS_CODES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Methods retried by the default policy. Writes are excluded to avoid
/// duplicate side effects.
pub const DEFAULT_RETRY_METHODS: [HttpMethod; 3] =
    [HttpMethod::Get, HttpMethod::Head, HttpMethod::Options];

/// Delay strategy between attempts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backoff {
    /// Always wait `base_delay`.
    Fixed,
    /// Wait `base_delay * factor^attempt`, capped and jittered.
    #[default]
    Exponential,
}

/// Context handed to a custom [`RetryPredicate`] for one failed attempt.
///
/// In an assembled client the parsing stage sits inside retry, so a non-2xx
/// answer arrives as `error: Some(SellAuthError::Api(..))` rather than as
/// `response`. Use [`status`](Self::status) to read the HTTP status either way.
#[derive(Debug)]
pub struct RetryContext<'a> {
    /// Zero-based index of the attempt that just failed.
    pub attempt: u32,
    /// The request being retried.
    pub request: &'a NormalizedRequest,
    /// A non-ok response that reached retry unparsed. Only set when retry
    /// wraps a stage that returns raw responses.
    pub response: Option<&'a Response>,
    /// The error of the attempt, including API errors carrying a status.
    pub error: Option<&'a SellAuthError>,
}

impl RetryContext<'_> {
    /// Returns the HTTP status of the failed attempt, from the response or
    /// from an [`ApiError`](crate::ApiError). `None` for transport failures.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match (self.response, self.error) {
            (Some(res), _) => Some(res.status),
            (None, Some(SellAuthError::Api(api))) => Some(api.status),
            _ => None,
        }
    }
}

/// Custom retry decision that replaces the built-in method/status rules.
#[async_trait]
pub trait RetryPredicate: Send + Sync {
    /// Returns `true` if the failed attempt should be retried.
    async fn should_retry(&self, ctx: RetryContext<'_>) -> bool;
}

#[async_trait]
impl<F> RetryPredicate for F
where
    F: Fn(&RetryContext<'_>) -> bool + Send + Sync,
{
    async fn should_retry(&self, ctx: RetryContext<'_>) -> bool {
        self(&ctx)
    }
}

/// Retry configuration.
///
/// # Defaults
///
/// - `attempts`: 3 (total tries, including the first)
/// - `backoff`: [`Backoff::Exponential`]
/// - `factor`: 2.0
/// - `base_delay`: 300ms
/// - `max_delay`: none
/// - `methods`: GET, HEAD, OPTIONS
/// - `status_codes`: 408, 429, 500, 502, 503, 504
///
/// # Example
///
/// ```rust
/// use sellauth::{Backoff, RetryPolicy};
/// use std::time::Duration;
///
/// let policy = RetryPolicy::with_attempts(4)
///     .backoff(Backoff::Exponential)
///     .base_delay(Duration::from_millis(200))
///     .max_delay(Duration::from_secs(5));
///
/// assert_eq!(policy.attempts(), 4);
/// ```
#[derive(Clone)]
pub struct RetryPolicy {
    attempts: u32,
    backoff: Backoff,
    factor: f64,
    base_delay: Duration,
    max_delay: Option<Duration>,
    methods: HashSet<HttpMethod>,
    status_codes: HashSet<u16>,
    retry_on: Option<Arc<dyn RetryPredicate>>,
}

impl RetryPolicy {
    /// Creates the default policy with the given total attempt count.
    ///
    /// An attempt count of 0 is treated as 1.
    #[must_use]
    pub fn with_attempts(attempts: u32) -> Self {
        Self {
            attempts: attempts.max(1),
            ..Self::default()
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub fn disabled() -> Self {
        Self::with_attempts(1)
    }

    /// Sets the backoff kind.
    #[must_use]
    pub const fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Sets the exponential multiplier.
    #[must_use]
    pub const fn factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    /// Sets the base delay.
    #[must_use]
    pub const fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Caps exponential delays (before jitter).
    #[must_use]
    pub const fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Replaces the set of methods whose non-ok responses may be retried.
    #[must_use]
    pub fn methods(mut self, methods: impl IntoIterator<Item = HttpMethod>) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    /// Replaces the set of retryable status codes.
    #[must_use]
    pub fn status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.status_codes = codes.into_iter().collect();
        self
    }

    /// Installs a custom predicate whose answer overrides the built-in rules.
    #[must_use]
    pub fn retry_on(mut self, predicate: impl RetryPredicate + 'static) -> Self {
        self.retry_on = Some(Arc::new(predicate));
        self
    }

    /// Returns the total number of attempts.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns the backoff kind.
    #[must_use]
    pub const fn backoff_kind(&self) -> Backoff {
        self.backoff
    }

    /// Returns the retryable methods.
    #[must_use]
    pub const fn retry_methods(&self) -> &HashSet<HttpMethod> {
        &self.methods
    }

    /// Returns the retryable status codes.
    #[must_use]
    pub const fn retry_status_codes(&self) -> &HashSet<u16> {
        &self.status_codes
    }

    /// Checks that the policy can be used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRetryPolicy`] for a non-finite or
    /// negative factor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.factor.is_finite() || self.factor < 0.0 {
            return Err(ConfigError::InvalidRetryPolicy {
                reason: format!("factor must be a finite, non-negative number (got {})", self.factor),
            });
        }
        Ok(())
    }

    /// Decides whether a failed attempt should be retried.
    ///
    /// A custom predicate is authoritative when configured. Otherwise errors
    /// without a status are always retryable, and non-ok responses (or
    /// [`ApiError`](crate::ApiError)s) are retryable only when both the
    /// method and the status are in the configured sets.
    pub async fn should_retry(&self, ctx: RetryContext<'_>) -> bool {
        if let Some(predicate) = &self.retry_on {
            return predicate.should_retry(ctx).await;
        }
        match ctx.status() {
            Some(status) => {
                self.methods.contains(&ctx.request.method()) && self.status_codes.contains(&status)
            }
            None => ctx.error.is_some(),
        }
    }

    /// Returns the pre-jitter delay for a zero-based attempt index.
    #[must_use]
    pub fn base_delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.base_delay,
            Backoff::Exponential => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let millis = self.base_delay.as_secs_f64() * 1000.0 * self.factor.powi(exponent);
                let delay = Duration::try_from_secs_f64(millis / 1000.0).unwrap_or(Duration::MAX);
                self.max_delay.map_or(delay, |cap| delay.min(cap))
            }
        }
    }

    /// Returns the delay to wait after a zero-based attempt index.
    ///
    /// Exponential delays receive uniform jitter in `[-20%, +20%]` and are
    /// never negative. Fixed delays are returned as configured.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = self.base_delay_for(attempt);
        if self.backoff == Backoff::Fixed {
            return delay;
        }
        let jitter = rand::thread_rng().gen_range(-JITTER_FACTOR..=JITTER_FACTOR);
        let millis = (delay.as_secs_f64() * 1000.0 * (1.0 + jitter)).round().max(0.0);
        Duration::try_from_secs_f64(millis / 1000.0).unwrap_or(delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Backoff::Exponential,
            factor: 2.0,
            base_delay: Duration::from_millis(300),
            max_delay: None,
            methods: DEFAULT_RETRY_METHODS.into_iter().collect(),
            status_codes: DEFAULT_RETRY_STATUS_CODES.into_iter().collect(),
            retry_on: None,
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("attempts", &self.attempts)
            .field("backoff", &self.backoff)
            .field("factor", &self.factor)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("methods", &self.methods)
            .field("status_codes", &self.status_codes)
            .field("retry_on", &self.retry_on.as_ref().map(|_| "custom"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn request(method: HttpMethod) -> NormalizedRequest {
        NormalizedRequest::new(method, "https://api.sellauth.com/v1/shops", Duration::from_secs(15))
    }

    #[test]
    fn test_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts(), 3);
        assert_eq!(policy.backoff_kind(), Backoff::Exponential);
        assert!(policy.retry_methods().contains(&HttpMethod::Get));
        assert!(!policy.retry_methods().contains(&HttpMethod::Post));
        for code in DEFAULT_RETRY_STATUS_CODES {
            assert!(policy.retry_status_codes().contains(&code));
        }
    }

    #[test]
    fn test_with_attempts_clamps_zero() {
        assert_eq!(RetryPolicy::with_attempts(0).attempts(), 1);
        assert_eq!(RetryPolicy::disabled().attempts(), 1);
    }

    #[test]
    fn test_exponential_base_delays() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.base_delay_for(0), Duration::from_millis(300));
        assert_eq!(policy.base_delay_for(1), Duration::from_millis(600));
        assert_eq!(policy.base_delay_for(2), Duration::from_millis(1200));
    }

    #[test]
    fn test_jittered_delay_within_twenty_percent() {
        let policy = RetryPolicy::default();
        for attempt in 0..3u32 {
            let expected = 300.0 * 2f64.powi(attempt as i32);
            for _ in 0..50 {
                let millis = policy.delay_for(attempt).as_millis() as f64;
                assert!(millis >= (expected * 0.8).floor(), "{millis} below range");
                assert!(millis <= (expected * 1.2).ceil(), "{millis} above range");
            }
        }
    }

    #[test]
    fn test_max_delay_caps_exponential() {
        let policy = RetryPolicy::default().max_delay(Duration::from_millis(500));
        assert_eq!(policy.base_delay_for(5), Duration::from_millis(500));
    }

    #[test]
    fn test_fixed_backoff_is_constant() {
        let policy = RetryPolicy::default()
            .backoff(Backoff::Fixed)
            .base_delay(Duration::from_millis(250));
        assert_eq!(policy.delay_for(0), Duration::from_millis(250));
        assert_eq!(policy.delay_for(7), Duration::from_millis(250));
    }

    #[test]
    fn test_validate_rejects_bad_factor() {
        assert!(RetryPolicy::default().factor(f64::NAN).validate().is_err());
        assert!(RetryPolicy::default().factor(-1.0).validate().is_err());
        assert!(RetryPolicy::default().validate().is_ok());
    }

    #[tokio::test]
    async fn test_post_with_retryable_status_is_not_retried() {
        let policy = RetryPolicy::default();
        let req = request(HttpMethod::Post);
        let res = Response::from_text(503, HashMap::new(), "");
        let ctx = RetryContext {
            attempt: 0,
            request: &req,
            response: Some(&res),
            error: None,
        };
        assert!(!policy.should_retry(ctx).await);
    }

    #[tokio::test]
    async fn test_get_with_retryable_status_is_retried() {
        let policy = RetryPolicy::default();
        let req = request(HttpMethod::Get);
        let res = Response::from_text(503, HashMap::new(), "");
        let ctx = RetryContext {
            attempt: 0,
            request: &req,
            response: Some(&res),
            error: None,
        };
        assert!(policy.should_retry(ctx).await);
    }

    #[tokio::test]
    async fn test_errors_always_retryable_by_default() {
        let policy = RetryPolicy::default();
        let req = request(HttpMethod::Post);
        let err: SellAuthError = crate::clients::TransportError::Aborted.into();
        let ctx = RetryContext {
            attempt: 0,
            request: &req,
            response: None,
            error: Some(&err),
        };
        assert!(policy.should_retry(ctx).await);
    }

    #[tokio::test]
    async fn test_api_errors_follow_method_and_status_rules() {
        let policy = RetryPolicy::default();
        let unavailable: SellAuthError = crate::clients::ApiError::from_body(503, None).into();
        let missing: SellAuthError = crate::clients::ApiError::from_body(404, None).into();

        for (method, error, expected) in [
            (HttpMethod::Get, &unavailable, true),
            (HttpMethod::Post, &unavailable, false),
            (HttpMethod::Get, &missing, false),
        ] {
            let req = request(method);
            let ctx = RetryContext {
                attempt: 0,
                request: &req,
                response: None,
                error: Some(error),
            };
            assert_eq!(policy.should_retry(ctx).await, expected, "{method} {error}");
        }
    }

    #[tokio::test]
    async fn test_custom_predicate_is_authoritative() {
        let policy = RetryPolicy::default().retry_on(|ctx: &RetryContext<'_>| {
            ctx.response.is_some_and(|r| r.status == 418)
        });
        let req = request(HttpMethod::Post);
        let teapot = Response::from_text(418, HashMap::new(), "");
        let ctx = RetryContext {
            attempt: 0,
            request: &req,
            response: Some(&teapot),
            error: None,
        };
        assert!(policy.should_retry(ctx).await);

        let err: SellAuthError = crate::clients::TransportError::Aborted.into();
        let ctx = RetryContext {
            attempt: 0,
            request: &req,
            response: None,
            error: Some(&err),
        };
        assert!(!policy.should_retry(ctx).await);
    }

    #[test]
    fn test_status_reads_response_or_api_error() {
        let req = request(HttpMethod::Get);
        let res = Response::from_text(503, HashMap::new(), "");
        let ctx = RetryContext {
            attempt: 0,
            request: &req,
            response: Some(&res),
            error: None,
        };
        assert_eq!(ctx.status(), Some(503));

        let api: SellAuthError = crate::clients::ApiError::from_body(429, None).into();
        let ctx = RetryContext {
            attempt: 0,
            request: &req,
            response: None,
            error: Some(&api),
        };
        assert_eq!(ctx.status(), Some(429));

        let aborted: SellAuthError = crate::clients::TransportError::Aborted.into();
        let ctx = RetryContext {
            attempt: 0,
            request: &req,
            response: None,
            error: Some(&aborted),
        };
        assert_eq!(ctx.status(), None);
    }
}
