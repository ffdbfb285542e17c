use async_trait::async_trait;

use super::{Middleware, Next};
use crate::clients::errors::{ApiError, SellAuthError};
use crate::clients::http_request::{NormalizedRequest, ResponseType};
use crate::clients::http_response::{Response, ResponseData};

/// Reads the body once and attaches the decoded [`ResponseData`].
///
/// - 204 responses carry no data.
/// - JSON bodies that fail to decode fall back to raw text.
/// - Non-ok responses become [`ApiError`]s, keeping any `Retry-After` delay.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResponseParsingMiddleware;

impl ResponseParsingMiddleware {
    /// Decodes `text` according to the requested response type.
    #[must_use]
    pub fn decode(status: u16, text: String, response_type: ResponseType) -> Option<ResponseData> {
        if status == 204 {
            return None;
        }
        match response_type {
            ResponseType::Json => {
                if text.is_empty() {
                    return None;
                }
                Some(
                    serde_json::from_str(&text)
                        .map_or_else(|_| ResponseData::Text(text), ResponseData::Json),
                )
            }
            ResponseType::Text | ResponseType::Raw => Some(ResponseData::Text(text)),
        }
    }
}

#[async_trait]
impl Middleware for ResponseParsingMiddleware {
    async fn handle(
        &self,
        req: &mut NormalizedRequest,
        next: Next<'_>,
    ) -> Result<Response, SellAuthError> {
        let mut res = next.run(req).await?;

        // Short-circuiting middleware may already have attached data.
        if res.data.is_none() {
            let text = res.text().await?;
            res.data = Self::decode(res.status, text, req.response_type);
        }

        if !res.is_ok() {
            let details = res.data.clone().map(ResponseData::into_value);
            let error = ApiError::from_body(res.status, details).with_retry_after(res.retry_after());
            return Err(error.into());
        }

        Ok(res)
    }
}
