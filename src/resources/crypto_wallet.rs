use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ResourceId;
use crate::clients::{HttpMethod, RequestOptions, Requester, SellAuthError};

/// Currencies the wallet can pay out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutCurrency {
    Btc,
    Ltc,
}

/// Body for [`CryptoWalletApi::payout`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PayoutRequest {
    pub currency: PayoutCurrency,
    /// Destination wallet address.
    pub address: String,
    pub amount: f64,
}

/// A payout in the wallet history.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// On-chain transaction id, once broadcast.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A deposit, withdrawal or adjustment in the wallet history.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletTransaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Crypto wallet endpoints (`/shops/{shop_id}/payouts`).
#[derive(Debug)]
pub struct CryptoWalletApi<'a, R> {
    requester: &'a R,
    shop_id: String,
}

impl<'a, R: Requester> CryptoWalletApi<'a, R> {
    /// Creates the wrapper for one shop.
    #[must_use]
    pub fn new(requester: &'a R, shop_id: impl ToString) -> Self {
        Self {
            requester,
            shop_id: shop_id.to_string(),
        }
    }

    fn path(&self, suffix: &str) -> String {
        format!("/shops/{}/payouts{suffix}", self.shop_id)
    }

    /// Lists past payouts.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn payouts(&self) -> Result<Vec<Payout>, SellAuthError> {
        self.requester
            .request(HttpMethod::Get, &self.path(""), RequestOptions::new())
            .await
    }

    /// Retrieves current balances.
    ///
    /// The API answers with either one balance object or an array of them,
    /// so the raw JSON is returned.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn balances(&self) -> Result<Value, SellAuthError> {
        self.requester
            .request(HttpMethod::Get, &self.path("/balances"), RequestOptions::new())
            .await
    }

    /// Sends funds from the wallet to an external address.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn payout(&self, request: &PayoutRequest) -> Result<Value, SellAuthError> {
        let options = RequestOptions::new().try_json(request)?;
        self.requester
            .request(HttpMethod::Post, &self.path("/payout"), options)
            .await
    }

    /// Lists wallet transactions.
    ///
    /// # Errors
    ///
    /// Propagates any [`SellAuthError`].
    pub async fn transactions(&self) -> Result<Vec<WalletTransaction>, SellAuthError> {
        self.requester
            .request(HttpMethod::Get, &self.path("/transactions"), RequestOptions::new())
            .await
    }
}
