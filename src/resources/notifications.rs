use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ResourceId;
use crate::clients::{HttpMethod, RequestOptions, Requester, SellAuthError};

/// A dashboard notification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: ResourceId,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of [`NotificationsApi::latest`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LatestNotifications {
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Notification endpoints (`/shops/{shop_id}/notifications`).
#[derive(Debug)]
pub struct NotificationsApi<'a, R> {
    requester: &'a R,
    shop_id: String,
}

impl<'a, R: Requester> NotificationsApi<'a, R> {
    /// Creates the wrapper for one shop.
    #[must_use]
    pub fn new(requester: &'a R, shop_id: impl ToString) -> Self {
        Self {
            requester,
            shop_id: shop_id.to_string(),
        }
    }

    /// Retrieves the most recent notifications.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn latest(&self) -> Result<LatestNotifications, SellAuthError> {
        self.requester
            .request(
                HttpMethod::Get,
                &format!("/shops/{}/notifications/latest", self.shop_id),
                RequestOptions::new(),
            )
            .await
    }
}
