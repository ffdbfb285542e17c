use std::fmt::Display;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{OrderDirection, ResourceId, SuccessResponse};
use crate::clients::{HttpMethod, RequestOptions, Requester, SellAuthError};
use crate::pagination::{PageParams, PaginatedResponse};

/// A customer record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Customer id; numeric or string depending on the shop.
    pub id: ResourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banned: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Any other fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Filters for [`CustomersApi::list`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CustomerListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Items per page (1-100).
    #[serde(rename = "perPage", skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banned: Option<bool>,
    /// Sort column (`id`, `email`, `created_at`).
    #[serde(rename = "orderColumn", skip_serializing_if = "Option::is_none")]
    pub order_column: Option<String>,
    #[serde(rename = "orderDirection", skip_serializing_if = "Option::is_none")]
    pub order_direction: Option<OrderDirection>,
}

/// Body for [`CustomersApi::create`] and [`CustomersApi::update`].
///
/// `email` is required on create; on update only the set fields change.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CustomerPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banned: Option<bool>,
    /// Any other accepted field.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body for [`CustomersApi::bulk_update_tags`]. Either list may be omitted.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CustomerTagsUpdate {
    /// Selector for the targeted customers, passed through as-is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_ids: Option<Value>,
    /// Tags to add.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add: Option<Vec<String>>,
    /// Tags to remove.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove: Option<Vec<String>>,
}

/// Body for [`CustomersApi::bulk_update_ban`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CustomerBanUpdate {
    /// Selector for the targeted customers, passed through as-is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_ids: Option<Value>,
    /// `true` bans, `false` lifts the ban.
    pub banned: bool,
}

/// Customer endpoints (`/shops/{shop_id}/customers`).
#[derive(Debug)]
pub struct CustomersApi<'a, R> {
    requester: &'a R,
    shop_id: String,
}

impl<'a, R: Requester> CustomersApi<'a, R> {
    /// Creates the wrapper for one shop.
    #[must_use]
    pub fn new(requester: &'a R, shop_id: impl ToString) -> Self {
        Self {
            requester,
            shop_id: shop_id.to_string(),
        }
    }

    fn path(&self, suffix: &str) -> String {
        format!("/shops/{}/customers{suffix}", self.shop_id)
    }

    /// Lists customers.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn list(&self, params: &CustomerListParams) -> Result<Vec<Customer>, SellAuthError> {
        let options = RequestOptions::new().try_query(params)?;
        self.requester
            .request(HttpMethod::Get, &self.path(""), options)
            .await
    }

    /// Fetches one page as `{data, meta}`.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn list_page<T: DeserializeOwned>(
        &self,
        params: PageParams,
    ) -> Result<PaginatedResponse<T>, SellAuthError> {
        let options = RequestOptions::new().try_query(&params)?;
        self.requester
            .request(HttpMethod::Get, &self.path(""), options)
            .await
    }

    /// Creates a customer.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn create(&self, customer: &CustomerPayload) -> Result<Customer, SellAuthError> {
        let options = RequestOptions::new().try_json(customer)?;
        self.requester
            .request(HttpMethod::Post, &self.path(""), options)
            .await
    }

    /// Retrieves a customer.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn get(&self, customer_id: impl Display) -> Result<Customer, SellAuthError> {
        self.requester
            .request(
                HttpMethod::Get,
                &self.path(&format!("/{customer_id}")),
                RequestOptions::new(),
            )
            .await
    }

    /// Partially updates a customer.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn update(
        &self,
        customer_id: impl Display,
        changes: &CustomerPayload,
    ) -> Result<Customer, SellAuthError> {
        let options = RequestOptions::new().try_json(changes)?;
        self.requester
            .request(
                HttpMethod::Put,
                &self.path(&format!("/{customer_id}")),
                options,
            )
            .await
    }

    /// Deletes a customer. Irreversible.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn delete(&self, customer_id: impl Display) -> Result<SuccessResponse, SellAuthError> {
        self.requester
            .request(
                HttpMethod::Delete,
                &self.path(&format!("/{customer_id}")),
                RequestOptions::new(),
            )
            .await
    }

    /// Adds or removes tags on many customers at once.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn bulk_update_tags(
        &self,
        update: &CustomerTagsUpdate,
    ) -> Result<SuccessResponse, SellAuthError> {
        let options = RequestOptions::new().try_json(update)?;
        self.requester
            .request(HttpMethod::Put, &self.path("/bulk-update/tags"), options)
            .await
    }

    /// Bans or unbans many customers at once.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn bulk_update_ban(
        &self,
        update: &CustomerBanUpdate,
    ) -> Result<SuccessResponse, SellAuthError> {
        let options = RequestOptions::new().try_json(update)?;
        self.requester
            .request(HttpMethod::Put, &self.path("/bulk-update/ban"), options)
            .await
    }
}
