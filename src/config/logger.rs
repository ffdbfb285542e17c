//! Pluggable logger capability.
//!
//! The SDK never prints on its own. When a [`Logger`] is configured, the
//! logging middleware reports each request through it, and the auth and
//! retry layers report warnings and retries. [`TracingLogger`] forwards
//! everything to the `tracing` ecosystem.

use serde_json::Value;

/// A sink for structured SDK log events.
///
/// Every method has a no-op default, so implementors only override the
/// levels they care about.
pub trait Logger: Send + Sync {
    /// Verbose diagnostics (request started/completed, retries).
    fn debug(&self, message: &str, fields: &Value) {
        let _ = (message, fields);
    }

    /// Informational events.
    fn info(&self, message: &str, fields: &Value) {
        let _ = (message, fields);
    }

    /// Recoverable problems (e.g. missing credentials).
    fn warn(&self, message: &str, fields: &Value) {
        let _ = (message, fields);
    }

    /// Failed requests.
    fn error(&self, message: &str, fields: &Value) {
        let _ = (message, fields);
    }
}

/// Logger that emits `tracing` events under the `sellauth` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, message: &str, fields: &Value) {
        tracing::debug!(target: "sellauth", %fields, "{message}");
    }

    fn info(&self, message: &str, fields: &Value) {
        tracing::info!(target: "sellauth", %fields, "{message}");
    }

    fn warn(&self, message: &str, fields: &Value) {
        tracing::warn!(target: "sellauth", %fields, "{message}");
    }

    fn error(&self, message: &str, fields: &Value) {
        tracing::error!(target: "sellauth", %fields, "{message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Silent;
    impl Logger for Silent {}

    #[test]
    fn test_default_methods_are_no_ops() {
        let logger = Silent;
        logger.debug("request", &json!({}));
        logger.info("request", &json!({}));
        logger.warn("request", &json!({}));
        logger.error("request", &json!({}));
    }

    #[test]
    fn test_tracing_logger_without_subscriber() {
        let logger = TracingLogger;
        logger.debug("request", &json!({"method": "GET"}));
        logger.error("error", &json!({"ms": 3}));
    }
}
