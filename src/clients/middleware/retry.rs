use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use super::{Middleware, Next};
use crate::clients::errors::SellAuthError;
use crate::clients::http_request::NormalizedRequest;
use crate::clients::http_response::Response;
use crate::config::{Logger, RetryContext, RetryPolicy};

/// Re-invokes the rest of the chain according to a [`RetryPolicy`].
///
/// A numeric `Retry-After` header on the failed response replaces the
/// computed backoff for that wait. Once the attempt budget is spent the last
/// error is returned, or the last non-ok response is passed up unchanged.
/// A cancelled request is never retried.
pub struct RetryMiddleware {
    policy: RetryPolicy,
    logger: Option<Arc<dyn Logger>>,
}

impl RetryMiddleware {
    /// Creates the middleware.
    #[must_use]
    pub fn new(policy: RetryPolicy, logger: Option<Arc<dyn Logger>>) -> Self {
        Self { policy, logger }
    }

    fn log_retry(&self, req: &NormalizedRequest, attempt: u32, delay: Duration, reason: &str) {
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        tracing::debug!(
            target: "sellauth",
            method = %req.method(),
            url = %req.url(),
            attempt = attempt + 1,
            delay_ms,
            reason,
            "retrying request"
        );
        if let Some(logger) = &self.logger {
            logger.debug(
                "retry",
                &json!({
                    "method": req.method().as_str(),
                    "url": req.url(),
                    "attempt": attempt + 1,
                    "delayMs": delay_ms,
                    "reason": reason,
                }),
            );
        }
    }
}

#[async_trait]
impl Middleware for RetryMiddleware {
    async fn handle(
        &self,
        req: &mut NormalizedRequest,
        next: Next<'_>,
    ) -> Result<Response, SellAuthError> {
        let attempts = self.policy.attempts();
        let mut attempt = 0;

        loop {
            let result = next.run(req).await;
            let can_retry = attempt + 1 < attempts && !req.is_cancelled();

            match result {
                Ok(res) if res.is_ok() => return Ok(res),
                Ok(res) => {
                    if !can_retry {
                        return Ok(res);
                    }
                    let ctx = RetryContext {
                        attempt,
                        request: req,
                        response: Some(&res),
                        error: None,
                    };
                    if !self.policy.should_retry(ctx).await {
                        return Ok(res);
                    }
                    let delay = res
                        .retry_after()
                        .unwrap_or_else(|| self.policy.delay_for(attempt));
                    self.log_retry(req, attempt, delay, &format!("HTTP {}", res.status));
                    drop(res);
                    tokio::time::sleep(delay).await;
                }
                Err(error) => {
                    if !can_retry {
                        return Err(error);
                    }
                    let ctx = RetryContext {
                        attempt,
                        request: req,
                        response: None,
                        error: Some(&error),
                    };
                    if !self.policy.should_retry(ctx).await {
                        return Err(error);
                    }
                    let delay = match &error {
                        SellAuthError::Api(api) => api.retry_after,
                        _ => None,
                    }
                    .unwrap_or_else(|| self.policy.delay_for(attempt));
                    self.log_retry(req, attempt, delay, &error.to_string());
                    tokio::time::sleep(delay).await;
                }
            }

            attempt += 1;
        }
    }
}

impl std::fmt::Debug for RetryMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryMiddleware")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::errors::TransportError;
    use crate::clients::http_request::HttpMethod;
    use crate::clients::middleware::Pipeline;
    use crate::clients::transport::Transport;
    use crate::config::Backoff;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails with `status` (or a network error when `None`) until `succeed_on`.
    struct Flaky {
        calls: AtomicU32,
        status: Option<u16>,
        succeed_on: u32,
    }

    impl Flaky {
        fn new(status: Option<u16>, succeed_on: u32) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                status,
                succeed_on,
            })
        }
    }

    #[async_trait]
    impl Transport for Flaky {
        async fn execute(&self, _req: &NormalizedRequest) -> Result<Response, SellAuthError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call >= self.succeed_on {
                return Ok(Response::from_text(200, HashMap::new(), "{}"));
            }
            match self.status {
                Some(status) => Ok(Response::from_text(status, HashMap::new(), "")),
                None => Err(TransportError::Other(format!("failure {call}")).into()),
            }
        }
    }

    fn fast(attempts: u32) -> RetryPolicy {
        RetryPolicy::with_attempts(attempts)
            .backoff(Backoff::Fixed)
            .base_delay(Duration::from_millis(1))
    }

    fn request(method: HttpMethod) -> NormalizedRequest {
        NormalizedRequest::new(method, "https://api.sellauth.com/v1/shops", Duration::from_secs(1))
    }

    async fn run(
        policy: RetryPolicy,
        transport: &Arc<Flaky>,
        method: HttpMethod,
    ) -> Result<Response, SellAuthError> {
        let pipeline = Pipeline::new(
            vec![Arc::new(RetryMiddleware::new(policy, None))],
            Arc::clone(transport) as Arc<dyn Transport>,
        );
        pipeline.execute(&mut request(method)).await
    }

    #[tokio::test]
    async fn test_never_exceeds_attempt_budget() {
        let transport = Flaky::new(None, u32::MAX);
        let error = run(fast(4), &transport, HttpMethod::Get).await.unwrap_err();

        assert_eq!(transport.calls.load(Ordering::SeqCst), 4);
        assert_eq!(error.to_string(), "Transport error: failure 4");
    }

    #[tokio::test]
    async fn test_recovers_after_transient_errors() {
        let transport = Flaky::new(None, 3);
        let res = run(fast(3), &transport, HttpMethod::Get).await.unwrap();
        assert_eq!(res.status, 200);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_post_503_is_not_retried() {
        let transport = Flaky::new(Some(503), u32::MAX);
        let res = run(fast(3), &transport, HttpMethod::Post).await.unwrap();
        assert_eq!(res.status, 503);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_503_returns_last_response_when_exhausted() {
        let transport = Flaky::new(Some(503), u32::MAX);
        let res = run(fast(3), &transport, HttpMethod::Get).await.unwrap();
        assert_eq!(res.status, 503);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_status_is_returned_immediately() {
        let transport = Flaky::new(Some(404), u32::MAX);
        let res = run(fast(3), &transport, HttpMethod::Get).await.unwrap();
        assert_eq!(res.status, 404);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_custom_predicate_is_authoritative() {
        let transport = Flaky::new(Some(503), u32::MAX);
        let policy = fast(3).retry_on(|ctx: &RetryContext<'_>| ctx.attempt == 0);
        let res = run(policy, &transport, HttpMethod::Post).await.unwrap();
        assert_eq!(res.status, 503);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parsed_api_error_honors_retry_after() {
        use crate::clients::middleware::ResponseParsingMiddleware;

        struct Throttled(AtomicU32);

        #[async_trait]
        impl Transport for Throttled {
            async fn execute(&self, _req: &NormalizedRequest) -> Result<Response, SellAuthError> {
                if self.0.fetch_add(1, Ordering::SeqCst) == 0 {
                    let headers = HashMap::from([("Retry-After".to_string(), vec!["2".to_string()])]);
                    return Ok(Response::from_text(429, headers, ""));
                }
                Ok(Response::from_text(200, HashMap::new(), "{}"))
            }
        }

        let transport = Arc::new(Throttled(AtomicU32::new(0)));
        let pipeline = Pipeline::new(
            vec![
                Arc::new(RetryMiddleware::new(RetryPolicy::default(), None)),
                Arc::new(ResponseParsingMiddleware),
            ],
            Arc::clone(&transport) as Arc<dyn Transport>,
        );

        let start = tokio::time::Instant::now();
        let res = pipeline.execute(&mut request(HttpMethod::Get)).await.unwrap();
        assert_eq!(res.status, 200);
        assert_eq!(transport.0.load(Ordering::SeqCst), 2);
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(2) && waited < Duration::from_millis(2100));
    }

    #[tokio::test]
    async fn test_cancelled_request_is_not_retried() {
        let transport = Flaky::new(None, u32::MAX);
        let token = tokio_util::sync::CancellationToken::new();
        token.cancel();

        let pipeline = Pipeline::new(
            vec![Arc::new(RetryMiddleware::new(fast(5), None))],
            Arc::clone(&transport) as Arc<dyn Transport>,
        );
        let mut req = request(HttpMethod::Get);
        req.signal = Some(token);

        assert!(pipeline.execute(&mut req).await.is_err());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }
}
