//! Thin wrappers mapping SellAuth endpoints onto [`Requester::request`].
//!
//! Each wrapper borrows a [`Requester`] (normally the
//! [`SellAuthClient`](crate::SellAuthClient)) and, where the endpoint is
//! shop-scoped, a shop id. Wrappers do no retries and no branching; every
//! error propagates unchanged.
//!
//! # Example
//!
//! ```rust,no_run
//! use sellauth::resources::InvoiceListParams;
//! use sellauth::SellAuthClient;
//!
//! # async fn run() -> Result<(), sellauth::SellAuthError> {
//! let client = SellAuthClient::from_api_key("sk_live_123")?;
//!
//! let params = InvoiceListParams {
//!     statuses: Some(vec!["pending".into(), "paid".into()]),
//!     ..Default::default()
//! };
//! let invoices = client.invoices(42).list(&params).await?;
//! let product = client.products(42).get(7).await?;
//! # Ok(())
//! # }
//! ```
//!
//! [`Requester::request`]: crate::Requester::request
//! [`Requester`]: crate::Requester

mod analytics;
mod blacklist;
mod checkout;
mod crypto_wallet;
mod customers;
mod invoices;
mod notifications;
mod products;
mod shops;

pub use analytics::{
    AnalyticsApi, AnalyticsGraph, AnalyticsOverview, GraphPoint, TopCustomer, TopProduct,
};
pub use blacklist::{
    BlacklistApi, BlacklistEntry, BlacklistMatchType, BlacklistPayload, BlacklistType,
};
pub use checkout::{CheckoutApi, CheckoutCartItem, CheckoutSession, CreateCheckoutRequest};
pub use crypto_wallet::{CryptoWalletApi, Payout, PayoutCurrency, PayoutRequest, WalletTransaction};
pub use customers::{
    Customer, CustomerBanUpdate, CustomerListParams, CustomerPayload, CustomerTagsUpdate,
    CustomersApi,
};
pub use invoices::{Invoice, InvoiceListParams, InvoicesApi, ReplaceDeliveredRequest};
pub use notifications::{LatestNotifications, Notification, NotificationsApi};
pub use products::{
    Product, ProductBulkField, ProductListParams, ProductsApi, SortProductsRequest, StockUpdate,
};
pub use shops::{CreateShopRequest, DeleteShopRequest, Shop, ShopsApi};

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An identifier the API returns either as a number or as a string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    /// Numeric id.
    Number(u64),
    /// String id.
    Text(String),
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// The generic acknowledgement returned by action endpoints.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SuccessResponse {
    /// Whether the action succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    /// Optional server message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Any other fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Sort direction for list endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}
