use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::clients::{HttpMethod, RequestOptions, Requester, SellAuthError};

/// Result of creating a checkout session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Whether the session was created.
    pub success: bool,
    /// The invoice backing the session.
    pub invoice_id: u64,
    /// Shop-hosted invoice URL.
    pub invoice_url: String,
    /// Payment provider URL, when the buyer is redirected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One line of the checkout cart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutCartItem {
    #[serde(rename = "productId")]
    pub product_id: u64,
    #[serde(rename = "variantId")]
    pub variant_id: u64,
    pub quantity: u32,
}

/// Payload for [`CheckoutApi::create`]. Only `cart` is required.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CreateCheckoutRequest {
    /// Items to buy.
    pub cart: Vec<CheckoutCartItem>,
    /// Buyer email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Coupon code to apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coupon: Option<String>,
    /// Gateway to preselect (e.g. `STRIPE`, `PAYPAL`, `BTC`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    /// Buyer IP address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// Two-letter country code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    /// Buyer user agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Subscribe the buyer to the newsletter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newsletter: Option<bool>,
    /// Affiliate code (max 16 characters).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliate: Option<String>,
    /// Any other accepted field (Discord linkage, ASN, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Checkout endpoint (`/shops/{shop_id}/checkout`).
///
/// Must be called server-side; the API key is never meant for browsers.
#[derive(Debug)]
pub struct CheckoutApi<'a, R> {
    requester: &'a R,
    shop_id: String,
}

impl<'a, R: Requester> CheckoutApi<'a, R> {
    /// Creates the wrapper for one shop.
    #[must_use]
    pub fn new(requester: &'a R, shop_id: impl ToString) -> Self {
        Self {
            requester,
            shop_id: shop_id.to_string(),
        }
    }

    /// Creates a checkout session.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn create(
        &self,
        request: &CreateCheckoutRequest,
    ) -> Result<CheckoutSession, SellAuthError> {
        let options = RequestOptions::new().try_json(request)?;
        self.requester
            .request(
                HttpMethod::Post,
                &format!("/shops/{}/checkout", self.shop_id),
                options,
            )
            .await
    }
}
