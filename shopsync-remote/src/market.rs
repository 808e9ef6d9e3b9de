use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;

use shopsync_core::api::{ApiError, MarketplaceApi};
use shopsync_shared::{CancellationReason, Order, OrderStatus};

const LISTING_LIMIT: u32 = 100;

/// Bearer-token REST client for the marketplace seller API.
pub struct MarketplaceClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl MarketplaceClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|err| ApiError::Transport(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn classify_status(status: StatusCode, body: &str) -> ApiError {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            ApiError::Unauthorized
        } else {
            ApiError::Transport(format!("{status}: {body}"))
        }
    }
}

#[async_trait]
impl MarketplaceApi for MarketplaceClient {
    async fn list_orders(
        &self,
        status: OrderStatus,
        cursor: Option<&str>,
    ) -> Result<Vec<Order>, ApiError> {
        let mut params = vec![
            ("limit", LISTING_LIMIT.to_string()),
            ("status", status.as_str().to_string()),
        ];
        if let Some(cursor) = cursor {
            params.push(("last_id", cursor.to_string()));
        }

        let response = self
            .http
            .get(self.url("orders/list"))
            .bearer_auth(&self.token)
            .query(&params)
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, &body));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|err| ApiError::Decode(err.to_string()))?;
        let orders = payload
            .get("orders")
            .cloned()
            .unwrap_or_else(|| serde_json::Value::Array(Vec::new()));

        serde_json::from_value(orders).map_err(|err| ApiError::Decode(err.to_string()))
    }

    async fn set_order_status(
        &self,
        order: &Order,
        status: OrderStatus,
        reason: Option<CancellationReason>,
        text: Option<&str>,
    ) -> Result<(), ApiError> {
        tracing::info!(order = order.id, status = status.as_str(), "setting order status");

        let mut body = json!({
            "ids": [order.id],
            "status": status.as_str(),
        });
        if let Some(reason) = reason {
            body["cancellation_reason"] = json!(reason.as_str());
        }
        if let Some(text) = text {
            body["cancellation_text"] = json!(text);
        }

        let response = self
            .http
            .post(self.url("orders/set_status"))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, &body));
        }
        Ok(())
    }
}
