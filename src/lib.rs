//! # SellAuth API Rust SDK
//!
//! A Rust SDK for the SellAuth e-commerce REST API, built around a
//! composable middleware pipeline.
//!
//! ## Overview
//!
//! This SDK provides:
//! - Type-safe configuration via [`ClientConfig`] and [`ClientConfigBuilder`]
//! - Validated newtypes for the API key and base URL
//! - A request pipeline: user middleware, authentication, post-auth middleware, logging,
//!   retry with backoff, and response parsing in front of a swappable [`Transport`]
//! - A single error shape, [`SellAuthError`], for every failure
//! - Lazy page-number pagination via [`pagination`]
//! - Thin wrappers for shops, products, invoices, checkout, customers, blacklist,
//!   analytics, crypto wallet payouts and notifications
//!
//! ## Quick Start
//!
//! ```rust
//! use sellauth::{ApiKey, ClientConfig, RetryPolicy, SellAuthClient};
//! use std::time::Duration;
//!
//! let config = ClientConfig::builder()
//!     .api_key(ApiKey::new("your-api-key").unwrap())
//!     .timeout(Duration::from_secs(10))
//!     .retry(RetryPolicy::with_attempts(5))
//!     .build()
//!     .unwrap();
//!
//! let client = SellAuthClient::new(config).unwrap();
//! ```
//!
//! ## Making API Requests
//!
//! ```rust,no_run
//! use sellauth::resources::ProductListParams;
//! use sellauth::SellAuthClient;
//!
//! # async fn run() -> Result<(), sellauth::SellAuthError> {
//! let client = SellAuthClient::from_api_key("your-api-key")?;
//!
//! let shops = client.shops().list().await?;
//! let products = client
//!     .products(shops[0].id)
//!     .list(&ProductListParams::default())
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Handling Errors
//!
//! ```rust,no_run
//! use sellauth::{ErrorCode, SellAuthClient, SellAuthError};
//!
//! # async fn run(client: SellAuthClient) {
//! match client.invoices(42).get(1).await {
//!     Ok(invoice) => println!("{:?}", invoice.status),
//!     Err(SellAuthError::Api(e)) if e.status == 404 => println!("no such invoice"),
//!     Err(e) if e.code() == Some(ErrorCode::Timeout) => println!("timed out"),
//!     Err(e) => println!("failed: {e}"),
//! }
//! # }
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: Configuration is instance-based and passed explicitly
//! - **Fail-fast validation**: All newtypes validate on construction
//! - **Thread-safe**: The client is `Clone + Send + Sync`; the pipeline is
//!   built once and shared
//! - **Async-first**: Designed for use with the Tokio runtime

pub mod clients;
pub mod config;
pub mod error;
pub mod pagination;
pub mod resources;

// Re-export public types at crate root for convenience
pub use config::{
    ApiKey, AuthConfig, AuthStrategy, Authorizer, Backoff, BaseUrl, ClientConfig,
    ClientConfigBuilder, Logger, RetryPolicy, TokenProvider, TracingLogger,
};
pub use error::ConfigError;

// Re-export the client and request types
pub use clients::{
    ApiError, Body, ErrorCode, HttpMethod, MultipartForm, RequestHooks, RequestOptions,
    Requester, Response, ResponseData, ResponseType, SellAuthClient, SellAuthError, Transport,
    TransportError,
};

// Re-export pagination entry points
pub use pagination::{
    fetch_all_pages, fetch_pages, paginate_all, paginate_all_with, PageMeta, PageParams,
    PaginatedResponse, PaginationOptions,
};
