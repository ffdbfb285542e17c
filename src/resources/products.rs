use std::fmt::{self, Display};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{OrderDirection, SuccessResponse};
use crate::clients::{HttpMethod, RequestOptions, Requester, SellAuthError};
use crate::pagination::{PageParams, PaginatedResponse};

/// A product in a shop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Product type (`single` or `variant`).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    /// URL path segment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Description (HTML).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// ISO currency code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Visibility (`public`, `on_hold`, `hidden`, `private`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    /// Variants with their own price and stock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variants: Option<Vec<Value>>,
    /// Any other fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Filters for [`ProductsApi::list`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProductListParams {
    /// Page number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Items per page (1-100).
    #[serde(rename = "perPage", skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    /// Sort column (`id`, `name`, `price`, `products_sold`).
    #[serde(rename = "orderColumn", skip_serializing_if = "Option::is_none")]
    pub order_column: Option<String>,
    /// Sort direction.
    #[serde(rename = "orderDirection", skip_serializing_if = "Option::is_none")]
    pub order_direction: Option<OrderDirection>,
    /// Filter by product type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    /// Only these product ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<u64>>,
    /// Filter by name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Filter by variant name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_name: Option<String>,
    /// Only these visibilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibilities: Option<Vec<String>>,
    /// Only these group ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_ids: Option<Vec<u64>>,
}

/// Body for [`ProductsApi::update_stock`]: set an absolute value or apply a delta.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StockUpdate {
    /// New absolute stock.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    /// Relative change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<i64>,
}

/// Body for [`ProductsApi::sort`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SortProductsRequest {
    /// Products and groups in their new order, passed through as-is.
    #[serde(rename = "sortedIds")]
    pub sorted_ids: Vec<Value>,
}

/// The product setting changed by [`ProductsApi::bulk_update`].
///
/// Each variant maps to one `PUT /products/bulk-update/{setting}` endpoint.
/// The body carries a `product_ids` selector plus the setting's fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProductBulkField {
    /// `disabled_payment_method_ids`
    DisabledPaymentMethods,
    /// `custom_field_ids`
    CustomFields,
    /// `discord_required`, `discord_roles`
    DiscordIntegration,
    /// `type` (`overwrite`, `append`, `prepend`), `description`
    Description,
    /// `instructions`
    Instructions,
    /// `out_of_stock_message`
    OutOfStockMessage,
    /// `block_vpn`
    Security,
    /// `type`, `product_badges`
    Badges,
    /// `status_color`, `status_text`
    Status,
    /// `visibility`
    Visibility,
    /// `show_views_count`, `show_sales_count`, `show_sales_notifications`, `sales_count_hours`
    LiveStats,
    /// `feedback_coupon_id`, `feedback_coupon_min_rating`
    FeedbackCoupon,
    /// `volume_discounts`, `disable_volume_discounts_if_coupon`
    VolumeDiscounts,
    /// `redirect_url`
    RedirectUrl,
    /// `deliverables_type`
    DeliverablesType,
    /// `deliverables_label`
    DeliverablesLabel,
}

impl ProductBulkField {
    /// Returns the endpoint's path segment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DisabledPaymentMethods => "disabled-payment-methods",
            Self::CustomFields => "custom-fields",
            Self::DiscordIntegration => "discord-integration",
            Self::Description => "description",
            Self::Instructions => "instructions",
            Self::OutOfStockMessage => "out-of-stock-message",
            Self::Security => "security",
            Self::Badges => "badges",
            Self::Status => "status",
            Self::Visibility => "visibility",
            Self::LiveStats => "live-stats",
            Self::FeedbackCoupon => "feedback-coupon",
            Self::VolumeDiscounts => "volume-discounts",
            Self::RedirectUrl => "redirect-url",
            Self::DeliverablesType => "deliverables-type",
            Self::DeliverablesLabel => "deliverables-label",
        }
    }
}

impl fmt::Display for ProductBulkField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Product endpoints (`/shops/{shop_id}/products`).
#[derive(Debug)]
pub struct ProductsApi<'a, R> {
    requester: &'a R,
    shop_id: String,
}

impl<'a, R: Requester> ProductsApi<'a, R> {
    /// Creates the wrapper for one shop.
    #[must_use]
    pub fn new(requester: &'a R, shop_id: impl ToString) -> Self {
        Self {
            requester,
            shop_id: shop_id.to_string(),
        }
    }

    fn path(&self, suffix: &str) -> String {
        format!("/shops/{}/products{suffix}", self.shop_id)
    }

    // The trailing slash stays even without a variant.
    fn deliverables_path(&self, product_id: impl Display, action: &str, variant_id: Option<u64>) -> String {
        let variant = variant_id.map(|id| id.to_string()).unwrap_or_default();
        self.path(&format!("/{product_id}/deliverables/{action}{variant}"))
    }

    /// Lists products.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn list(&self, params: &ProductListParams) -> Result<Vec<Product>, SellAuthError> {
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

    /// Creates a product.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn create<B: Serialize + Sync + ?Sized>(&self, product: &B) -> Result<Product, SellAuthError> {
        let options = RequestOptions::new().try_json(product)?;
        self.requester
            .request(HttpMethod::Post, &self.path(""), options)
            .await
    }

    /// Retrieves a product.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn get(&self, product_id: impl Display) -> Result<Product, SellAuthError> {
        self.requester
            .request(
                HttpMethod::Get,
                &self.path(&format!("/{product_id}")),
                RequestOptions::new(),
            )
            .await
    }

    /// Updates a product.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn update<B: Serialize + Sync + ?Sized>(
        &self,
        product_id: impl Display,
        product: &B,
    ) -> Result<Product, SellAuthError> {
        let options = RequestOptions::new().try_json(product)?;
        self.requester
            .request(
                HttpMethod::Put,
                &self.path(&format!("/{product_id}/update")),
                options,
            )
            .await
    }

    /// Deletes a product.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn delete(&self, product_id: impl Display) -> Result<SuccessResponse, SellAuthError> {
        self.requester
            .request(
                HttpMethod::Delete,
                &self.path(&format!("/{product_id}")),
                RequestOptions::new(),
            )
            .await
    }

    /// Duplicates a product.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn clone_product(&self, product_id: impl Display) -> Result<Product, SellAuthError> {
        self.requester
            .request(
                HttpMethod::Post,
                &self.path(&format!("/{product_id}/clone")),
                RequestOptions::new(),
            )
            .await
    }

    /// Sets or adjusts the stock of one variant.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn update_stock(
        &self,
        product_id: impl Display,
        variant_id: impl Display,
        update: StockUpdate,
    ) -> Result<Value, SellAuthError> {
        let options = RequestOptions::new().try_json(&update)?;
        self.requester
            .request(
                HttpMethod::Put,
                &self.path(&format!("/{product_id}/stock/{variant_id}")),
                options,
            )
            .await
    }

    /// Lists the deliverables of a product, or of one variant.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn deliverables(
        &self,
        product_id: impl Display,
        variant_id: Option<u64>,
    ) -> Result<Value, SellAuthError> {
        self.requester
            .request(
                HttpMethod::Get,
                &self.deliverables_path(product_id, "", variant_id),
                RequestOptions::new(),
            )
            .await
    }

    /// Appends deliverables to a product or variant.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn append_deliverables<B: Serialize + Sync + ?Sized>(
        &self,
        product_id: impl Display,
        variant_id: Option<u64>,
        deliverables: &B,
    ) -> Result<Value, SellAuthError> {
        let options = RequestOptions::new().try_json(deliverables)?;
        self.requester
            .request(
                HttpMethod::Put,
                &self.deliverables_path(product_id, "append/", variant_id),
                options,
            )
            .await
    }

    /// Replaces the deliverables of a product or variant.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn overwrite_deliverables<B: Serialize + Sync + ?Sized>(
        &self,
        product_id: impl Display,
        variant_id: Option<u64>,
        deliverables: &B,
    ) -> Result<Value, SellAuthError> {
        let options = RequestOptions::new().try_json(deliverables)?;
        self.requester
            .request(
                HttpMethod::Put,
                &self.deliverables_path(product_id, "overwrite/", variant_id),
                options,
            )
            .await
    }

    /// Reorders products and groups in one call.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn sort(&self, order: &SortProductsRequest) -> Result<SuccessResponse, SellAuthError> {
        let options = RequestOptions::new().try_json(order)?;
        self.requester
            .request(HttpMethod::Put, &self.path("/sort"), options)
            .await
    }

    /// Changes one setting on many products at once.
    ///
    /// ```rust,no_run
    /// use sellauth::resources::ProductBulkField;
    /// use serde_json::json;
    ///
    /// # async fn run(client: sellauth::SellAuthClient) -> Result<(), sellauth::SellAuthError> {
    /// let body = json!({"product_ids": {"ids": [1, 2]}, "visibility": "hidden"});
    /// client.products(42).bulk_update(ProductBulkField::Visibility, &body).await?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn bulk_update<B: Serialize + Sync + ?Sized>(
        &self,
        field: ProductBulkField,
        body: &B,
    ) -> Result<SuccessResponse, SellAuthError> {
        let options = RequestOptions::new().try_json(body)?;
        self.requester
            .request(
                HttpMethod::Put,
                &self.path(&format!("/bulk-update/{field}")),
                options,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_field_segments_are_kebab_case() {
        assert_eq!(ProductBulkField::OutOfStockMessage.to_string(), "out-of-stock-message");
        assert_eq!(ProductBulkField::DisabledPaymentMethods.as_str(), "disabled-payment-methods");
        assert_eq!(ProductBulkField::Status.as_str(), "status");
    }

    #[test]
    fn test_sort_request_uses_camel_case_key() {
        let body = serde_json::to_value(SortProductsRequest {
            sorted_ids: vec![serde_json::json!({"id": 3, "type": "product"})],
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"sortedIds": [{"id": 3, "type": "product"}]}));
    }
}
