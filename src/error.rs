//! Configuration error types for the SellAuth SDK.
//!
//! Request-time failures live in [`crate::clients::SellAuthError`]; this
//! module only covers problems detected while building a client.
//!
//! # Example
//!
//! ```rust
//! use sellauth::{ApiKey, ConfigError};
//!
//! let result = ApiKey::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyApiKey)));
//! ```

use thiserror::Error;

/// Errors that can occur during SDK configuration.
///
/// Each variant provides a clear, actionable error message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// API key cannot be empty.
    #[error("API key cannot be empty. Please provide a valid SellAuth API key.")]
    EmptyApiKey,

    /// Base URL is invalid.
    #[error("Invalid base URL '{url}'. Please provide an absolute URL with scheme (e.g., 'https://api.sellauth.com/v1').")]
    InvalidBaseUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// The retry policy is unusable.
    #[error("Invalid retry policy: {reason}")]
    InvalidRetryPolicy {
        /// The reason the policy was rejected.
        reason: String,
    },

    /// A default header has an empty name.
    #[error("Header names cannot be empty.")]
    EmptyHeaderName,
}
