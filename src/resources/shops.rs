use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::SuccessResponse;
use crate::clients::{HttpMethod, MultipartForm, RequestOptions, Requester, SellAuthError};

/// A SellAuth shop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shop {
    /// Shop id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Subdomain on the SellAuth storefront host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,
    /// Public storefront URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Subscription plan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    /// Any other fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Input for [`ShopsApi::create`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreateShopRequest {
    /// Display name.
    pub name: String,
    /// Desired subdomain.
    pub subdomain: String,
    /// PNG logo bytes, uploaded as `logo.png`.
    pub logo: Option<Vec<u8>>,
}

/// Confirmation required by [`ShopsApi::delete`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeleteShopRequest {
    /// Account password.
    pub password: String,
    /// The shop name, typed out as confirmation.
    pub name: String,
}

/// Shop-level endpoints (`/shops`).
#[derive(Debug)]
pub struct ShopsApi<'a, R> {
    requester: &'a R,
}

impl<'a, R: Requester> ShopsApi<'a, R> {
    /// Creates the wrapper.
    #[must_use]
    pub const fn new(requester: &'a R) -> Self {
        Self { requester }
    }

    /// Lists the shops the API key can access.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn list(&self) -> Result<Vec<Shop>, SellAuthError> {
        self.requester
            .request(HttpMethod::Get, "/shops", RequestOptions::new())
            .await
    }

    /// Retrieves one shop.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn get(&self, shop_id: impl std::fmt::Display) -> Result<Shop, SellAuthError> {
        self.requester
            .request(HttpMethod::Get, &format!("/shops/{shop_id}"), RequestOptions::new())
            .await
    }

    /// Retrieves shop statistics.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn stats(&self, shop_id: impl std::fmt::Display) -> Result<Value, SellAuthError> {
        self.requester
            .request(
                HttpMethod::Get,
                &format!("/shops/{shop_id}/stats"),
                RequestOptions::new(),
            )
            .await
    }

    /// Creates a shop. Sent as a multipart form so a logo can be attached.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn create(&self, shop: CreateShopRequest) -> Result<Shop, SellAuthError> {
        let mut form = MultipartForm::new()
            .text("name", shop.name)
            .text("subdomain", shop.subdomain);
        if let Some(logo) = shop.logo {
            form = form.file_with_type("logo", "logo.png", "image/png", logo);
        }
        self.requester
            .request(
                HttpMethod::Post,
                "/shops/create",
                RequestOptions::new().multipart(form),
            )
            .await
    }

    /// Updates shop settings.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`], including body serialization failures.
    pub async fn update<B: Serialize + Sync + ?Sized>(
        &self,
        shop_id: impl std::fmt::Display,
        changes: &B,
    ) -> Result<Shop, SellAuthError> {
        let options = RequestOptions::new().try_json(changes)?;
        self.requester
            .request(HttpMethod::Put, &format!("/shops/{shop_id}/update"), options)
            .await
    }

    /// Deletes a shop. Irreversible.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn delete(
        &self,
        shop_id: impl std::fmt::Display,
        confirmation: &DeleteShopRequest,
    ) -> Result<SuccessResponse, SellAuthError> {
        let options = RequestOptions::new().try_json(confirmation)?;
        self.requester
            .request(HttpMethod::Delete, &format!("/shops/{shop_id}"), options)
            .await
    }
}
