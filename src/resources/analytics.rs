use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ResourceId;
use crate::clients::{HttpMethod, RequestOptions, Requester, SellAuthError};

/// Revenue, order and customer totals with their change over the
/// server's default timeframe.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsOverview {
    #[serde(default)]
    pub revenue: f64,
    #[serde(default)]
    pub orders: u64,
    #[serde(default)]
    pub customers: u64,
    /// Percentage change in revenue.
    #[serde(default)]
    pub revenue_change: f64,
    /// Percentage change in orders.
    #[serde(default)]
    pub orders_change: f64,
    /// Percentage change in customers.
    #[serde(default)]
    pub customers_change: f64,
    /// Any other fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One point of the analytics time series.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphPoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orders: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customers: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The analytics time series.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsGraph {
    #[serde(default)]
    pub points: Vec<GraphPoint>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A best-selling product.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orders: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A top-spending customer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCustomer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orders: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Read-only analytics endpoints (`/shops/{shop_id}/analytics`).
#[derive(Debug)]
pub struct AnalyticsApi<'a, R> {
    requester: &'a R,
    shop_id: String,
}

impl<'a, R: Requester> AnalyticsApi<'a, R> {
    /// Creates the wrapper for one shop.
    #[must_use]
    pub fn new(requester: &'a R, shop_id: impl ToString) -> Self {
        Self {
            requester,
            shop_id: shop_id.to_string(),
        }
    }

    fn path(&self, suffix: &str) -> String {
        format!("/shops/{}/analytics{suffix}", self.shop_id)
    }

    /// Retrieves the overview totals.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn overview(&self) -> Result<AnalyticsOverview, SellAuthError> {
        self.requester
            .request(HttpMethod::Get, &self.path(""), RequestOptions::new())
            .await
    }

    /// Retrieves the time series.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn graph(&self) -> Result<AnalyticsGraph, SellAuthError> {
        self.requester
            .request(HttpMethod::Get, &self.path("/graph"), RequestOptions::new())
            .await
    }

    /// Retrieves the top products by revenue.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn top_products(&self) -> Result<Vec<TopProduct>, SellAuthError> {
        self.requester
            .request(HttpMethod::Get, &self.path("/top-products"), RequestOptions::new())
            .await
    }

    /// Retrieves the top customers by revenue.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn top_customers(&self) -> Result<Vec<TopCustomer>, SellAuthError> {
        self.requester
            .request(HttpMethod::Get, &self.path("/top-customers"), RequestOptions::new())
            .await
    }
}
