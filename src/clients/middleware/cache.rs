use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{Middleware, Next};
use crate::clients::errors::SellAuthError;
use crate::clients::http_request::{HttpMethod, NormalizedRequest};
use crate::clients::http_response::{Response, ResponseData};

/// Default time-to-live for cached entries.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10);

struct CacheEntry {
    expires: Instant,
    data: ResponseData,
}

/// In-memory cache for successful GET responses.
///
/// Entries are keyed by method, URL and a SHA-256 fingerprint of the
/// credential header (`Authorization` unless changed with
/// [`credential_header`](Self::credential_header)). Different credentials
/// never share entries and the raw token is not stored. A request without
/// the credential header is passed through uncached.
///
/// The credential only exists once authentication has run, so install the
/// cache with
/// [`authenticated_middleware`](crate::ClientConfigBuilder::authenticated_middleware):
///
/// ```rust
/// use sellauth::clients::middleware::CacheMiddleware;
/// use sellauth::{ApiKey, ClientConfig};
/// use std::time::Duration;
///
/// let config = ClientConfig::builder()
///     .api_key(ApiKey::new("key").unwrap())
///     .authenticated_middleware(CacheMiddleware::new(Duration::from_secs(30)))
///     .build()
///     .unwrap();
/// ```
pub struct CacheMiddleware {
    ttl: Duration,
    credential_header: String,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl CacheMiddleware {
    /// Creates a cache with the given time-to-live.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            credential_header: "authorization".to_string(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Sets the header that carries the credential. Match it to a custom
    /// [`AuthConfig::header_name`](crate::AuthConfig::header_name).
    #[must_use]
    pub fn credential_header(mut self, name: impl Into<String>) -> Self {
        self.credential_header = name.into();
        self
    }

    /// Returns the number of stored entries, including expired ones not yet evicted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn key_for(&self, req: &NormalizedRequest) -> Option<String> {
        let credential = req
            .header(&self.credential_header)
            .filter(|value| !value.is_empty())?;
        let fingerprint = Sha256::digest(credential.as_bytes());
        Some(format!("{} {} {fingerprint:x}", req.method(), req.url()))
    }

    fn lookup(&self, key: &str) -> Option<ResponseData> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some(entry) if entry.expires > Instant::now() => Some(entry.data.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn store(&self, key: String, data: ResponseData) {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, entry| entry.expires > now);
        entries.insert(
            key,
            CacheEntry {
                expires: now + self.ttl,
                data,
            },
        );
    }
}

impl Default for CacheMiddleware {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

#[async_trait]
impl Middleware for CacheMiddleware {
    async fn handle(
        &self,
        req: &mut NormalizedRequest,
        next: Next<'_>,
    ) -> Result<Response, SellAuthError> {
        if req.method() != HttpMethod::Get {
            return next.run(req).await;
        }
        let Some(key) = self.key_for(req) else {
            tracing::trace!(target: "sellauth", url = %req.url(), "no credential header, cache skipped");
            return next.run(req).await;
        };

        if let Some(data) = self.lookup(&key) {
            tracing::trace!(target: "sellauth", url = %req.url(), "cache hit");
            let mut res = Response::with_data(200, Some(data));
            res.ok = Some(true);
            return Ok(res);
        }

        let res = next.run(req).await?;
        if res.is_ok() {
            if let Some(data) = &res.data {
                self.store(key, data.clone());
            }
        }
        Ok(res)
    }
}

impl std::fmt::Debug for CacheMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheMiddleware")
            .field("ttl", &self.ttl)
            .field("credential_header", &self.credential_header)
            .field("entries", &self.len())
            .finish()
    }
}
