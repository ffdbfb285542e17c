use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{OrderDirection, ResourceId};
use crate::clients::{HttpMethod, RequestOptions, Requester, ResponseType, SellAuthError};
use crate::pagination::{PageParams, PaginatedResponse};

/// An invoice. Only the commonly used fields are typed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Invoice id.
    pub id: u64,
    /// Status (`pending`, `completed`, `refunded`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Total in major currency units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    /// ISO currency code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Payment gateway identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    /// Customer email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Applied coupon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    /// Creation timestamp as sent by the API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Completion timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    /// Owning customer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<ResourceId>,
    /// Any other fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Filters for [`InvoicesApi::list`].
///
/// Dates serialize as RFC 3339. Unset fields are left out of the query.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct InvoiceListParams {
    /// Page number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Items per page (1-100).
    #[serde(rename = "perPage", skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    /// Sort column (`id`, `price_usd`, `paid_usd`, `created_at`, `completed_at`).
    #[serde(rename = "orderColumn", skip_serializing_if = "Option::is_none")]
    pub order_column: Option<String>,
    /// Sort direction.
    #[serde(rename = "orderDirection", skip_serializing_if = "Option::is_none")]
    pub order_direction: Option<OrderDirection>,
    /// Exact invoice id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    /// Only these statuses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statuses: Option<Vec<String>>,
    /// Customer email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Only these gateways.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateways: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_end: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at_start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at_end: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discord_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<ResourceId>,
    /// Any other filter the API accepts.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body for [`InvoicesApi::replace_delivered`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReplaceDeliveredRequest {
    /// The invoice item whose deliverables are replaced.
    pub invoice_item_id: u64,
    /// Replacement deliverables (array or object, passed through).
    pub replacements: Value,
}

/// Invoice endpoints (`/shops/{shop_id}/invoices`).
#[derive(Debug)]
pub struct InvoicesApi<'a, R> {
    requester: &'a R,
    shop_id: String,
}

impl<'a, R: Requester> InvoicesApi<'a, R> {
    /// Creates the wrapper for one shop.
    #[must_use]
    pub fn new(requester: &'a R, shop_id: impl ToString) -> Self {
        Self {
            requester,
            shop_id: shop_id.to_string(),
        }
    }

    fn path(&self, suffix: &str) -> String {
        format!("/shops/{}/invoices{suffix}", self.shop_id)
    }

    async fn action(
        &self,
        method: HttpMethod,
        path: String,
        options: RequestOptions,
    ) -> Result<Value, SellAuthError> {
        self.requester.request(method, &path, options).await
    }

    /// Lists invoices matching the filters.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn list(&self, params: &InvoiceListParams) -> Result<Vec<Invoice>, SellAuthError> {
        let options = RequestOptions::new().try_query(params)?;
        self.requester
            .request(HttpMethod::Get, &self.path(""), options)
            .await
    }

    /// Fetches one page as `{data, meta}`, for use with
    /// [`paginate_all`](crate::pagination::paginate_all).
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

    /// Retrieves one invoice.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn get(&self, invoice_id: impl Display) -> Result<Invoice, SellAuthError> {
        self.requester
            .request(
                HttpMethod::Get,
                &self.path(&format!("/{invoice_id}")),
                RequestOptions::new(),
            )
            .await
    }

    /// Archives an invoice. Returns the invoice or an acknowledgement.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn archive(&self, invoice_id: impl Display) -> Result<Value, SellAuthError> {
        self.action(
            HttpMethod::Post,
            self.path(&format!("/{invoice_id}/archive")),
            RequestOptions::new(),
        )
        .await
    }

    /// Restores an archived invoice.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn unarchive(&self, invoice_id: impl Display) -> Result<Value, SellAuthError> {
        self.action(
            HttpMethod::Post,
            self.path(&format!("/{invoice_id}/unarchive")),
            RequestOptions::new(),
        )
        .await
    }

    /// Cancels an invoice.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn cancel(&self, invoice_id: impl Display) -> Result<Value, SellAuthError> {
        self.action(
            HttpMethod::Post,
            self.path(&format!("/{invoice_id}/cancel")),
            RequestOptions::new(),
        )
        .await
    }

    /// Marks an invoice as refunded.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn refund(&self, invoice_id: impl Display) -> Result<Value, SellAuthError> {
        self.action(
            HttpMethod::Post,
            self.path(&format!("/{invoice_id}/refund")),
            RequestOptions::new(),
        )
        .await
    }

    /// Removes the refund mark.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn unrefund(&self, invoice_id: impl Display) -> Result<Value, SellAuthError> {
        self.action(
            HttpMethod::Post,
            self.path(&format!("/{invoice_id}/unrefund")),
            RequestOptions::new(),
        )
        .await
    }

    /// Processes (completes) a pending invoice.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn process(&self, invoice_id: impl Display) -> Result<Value, SellAuthError> {
        self.action(
            HttpMethod::Get,
            self.path(&format!("/{invoice_id}/process")),
            RequestOptions::new(),
        )
        .await
    }

    /// Replaces the delivered items of one invoice item.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn replace_delivered(
        &self,
        invoice_id: impl Display,
        request: &ReplaceDeliveredRequest,
    ) -> Result<Value, SellAuthError> {
        let options = RequestOptions::new().try_json(request)?;
        self.action(
            HttpMethod::Post,
            self.path(&format!("/{invoice_id}/replace-delivered")),
            options,
        )
        .await
    }

    /// Sets the note shown on the dashboard for this invoice.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn set_dashboard_note(
        &self,
        invoice_id: impl Display,
        note: &str,
    ) -> Result<Value, SellAuthError> {
        let options = RequestOptions::new().json(json!({ "note": note }));
        self.action(
            HttpMethod::Put,
            self.path(&format!("/{invoice_id}/dashboard-note")),
            options,
        )
        .await
    }

    /// Downloads the invoice PDF. The body is returned as text, undecoded.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn pdf(&self, invoice_id: impl Display) -> Result<String, SellAuthError> {
        self.requester
            .request(
                HttpMethod::Get,
                &self.path(&format!("/{invoice_id}/pdf")),
                RequestOptions::new().response_type(ResponseType::Text),
            )
            .await
    }
}
