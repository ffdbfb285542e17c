use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{ResourceId, SuccessResponse};
use crate::clients::{HttpMethod, RequestOptions, Requester, SellAuthError};
use crate::pagination::PageParams;

/// What a blacklist entry matches against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlacklistType {
    Email,
    Ip,
    UserAgent,
    Asn,
    CountryCode,
}

/// How the value of a blacklist entry is compared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlacklistMatchType {
    #[default]
    Exact,
    Regex,
}

/// A blocked email, IP, user agent, ASN or country.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlacklistEntry {
    pub id: ResourceId,
    pub value: String,
    #[serde(rename = "type")]
    pub entry_type: BlacklistType,
    pub match_type: BlacklistMatchType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_id: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Any other fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body for [`BlacklistApi::create`] and [`BlacklistApi::update`].
///
/// Updates replace the whole entry, so every field is sent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BlacklistPayload {
    pub value: String,
    #[serde(rename = "type")]
    pub entry_type: BlacklistType,
    pub match_type: BlacklistMatchType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Blacklist endpoints (`/shops/{shop_id}/blacklist`).
#[derive(Debug)]
pub struct BlacklistApi<'a, R> {
    requester: &'a R,
    shop_id: String,
}

impl<'a, R: Requester> BlacklistApi<'a, R> {
    /// Creates the wrapper for one shop.
    #[must_use]
    pub fn new(requester: &'a R, shop_id: impl ToString) -> Self {
        Self {
            requester,
            shop_id: shop_id.to_string(),
        }
    }

    fn path(&self, suffix: &str) -> String {
        format!("/shops/{}/blacklist{suffix}", self.shop_id)
    }

    /// Lists entries, optionally one page at a time.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn list(&self, page: Option<PageParams>) -> Result<Vec<BlacklistEntry>, SellAuthError> {
        let options = match page {
            Some(page) => RequestOptions::new().try_query(&page)?,
            None => RequestOptions::new(),
        };
        self.requester
            .request(HttpMethod::Get, &self.path(""), options)
            .await
    }

    /// Creates an entry.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn create(&self, entry: &BlacklistPayload) -> Result<BlacklistEntry, SellAuthError> {
        let options = RequestOptions::new().try_json(entry)?;
        self.requester
            .request(HttpMethod::Post, &self.path(""), options)
            .await
    }

    /// Retrieves an entry.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn get(&self, entry_id: impl Display) -> Result<BlacklistEntry, SellAuthError> {
        self.requester
            .request(
                HttpMethod::Get,
                &self.path(&format!("/{entry_id}")),
                RequestOptions::new(),
            )
            .await
    }

    /// Replaces an entry.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn update(
        &self,
        entry_id: impl Display,
        entry: &BlacklistPayload,
    ) -> Result<BlacklistEntry, SellAuthError> {
        let options = RequestOptions::new().try_json(entry)?;
        self.requester
            .request(
                HttpMethod::Put,
                &self.path(&format!("/{entry_id}/update")),
                options,
            )
            .await
    }

    /// Deletes an entry.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn delete(&self, entry_id: impl Display) -> Result<SuccessResponse, SellAuthError> {
        self.requester
            .request(
                HttpMethod::Delete,
                &self.path(&format!("/{entry_id}")),
                RequestOptions::new(),
            )
            .await
    }
}
