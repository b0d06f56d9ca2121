//! Fulfillment adapter HTTP client.

use anyhow::Result;
use reqwest_middleware::ClientWithMiddleware;
use std::time::Duration;
use tracing::debug;

use super::config::{AdapterConfig, ADAPTER_API_BASE};
use super::types::{
    AckResponse, AdapterError, CancelResponse, EstimateResponse, ScheduleResponse,
    StatusUpdateRequest, ValidateResponse,
};
use crate::capture::build_client_with_capture;

/// Overall request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Retry cap for 429 responses
const MAX_RETRIES: u32 = 3;

/// Client for the fulfillment adapter's delivery endpoints.
pub struct DeliveryClient {
    http: ClientWithMiddleware,
    pub config: AdapterConfig,
    /// Base URL for API requests (e.g., "https://fulfillment-adapter-v1.snc-api.qa.irb.digital")
    base_url: String,
}

impl DeliveryClient {
    /// Create a client against the QA adapter base URL.
    ///
    /// Enables capture middleware if `CAPTURE_DIR` is set.
    pub fn new(config: AdapterConfig) -> Self {
        Self::new_with_base_url(config, ADAPTER_API_BASE)
    }

    /// Create a client with a custom base URL.
    ///
    /// This is how the test suite points the client at mock servers.
    /// Enables capture middleware if `CAPTURE_DIR` is set.
    pub fn new_with_base_url(config: AdapterConfig, base_url: &str) -> Self {
        let http =
            build_client_with_capture(reqwest::Client::builder().timeout(REQUEST_TIMEOUT));
        Self {
            http,
            config,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Get the base URL for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ========================================================================
    // ENDPOINTS
    // ========================================================================

    /// `POST /brand/{brandId}/delivery` — push a delivery status update.
    pub async fn update_delivery_status(
        &self,
        brand_id: &str,
        update: &StatusUpdateRequest,
    ) -> Result<AckResponse> {
        let path = format!("/brand/{}/delivery", brand_id);
        debug!("[ADAPTER] status update brand={}", brand_id);
        self.post(&path, serde_json::to_string(update)?).await
    }

    /// `POST /brand/{brandId}/delivery/estimate` — fee and time estimate.
    ///
    /// The request body is a canned payload owned by the adapter, so it is
    /// passed through as JSON rather than typed here.
    pub async fn estimate(
        &self,
        brand_id: &str,
        body: &serde_json::Value,
    ) -> Result<EstimateResponse> {
        let path = format!("/brand/{}/delivery/estimate", brand_id);
        debug!("[ADAPTER] estimate brand={}", brand_id);
        self.post(&path, serde_json::to_string(body)?).await
    }

    /// `POST /brand/{brandId}/delivery/validate` — address/location validation.
    pub async fn validate(
        &self,
        brand_id: &str,
        body: &serde_json::Value,
    ) -> Result<ValidateResponse> {
        let path = format!("/brand/{}/delivery/validate", brand_id);
        debug!("[ADAPTER] validate brand={}", brand_id);
        self.post(&path, serde_json::to_string(body)?).await
    }

    /// `POST /brand/{brandId}/location/{locationId}/delivery` — schedule a delivery.
    pub async fn schedule(
        &self,
        brand_id: &str,
        location_id: &str,
        body: &serde_json::Value,
    ) -> Result<ScheduleResponse> {
        let path = format!("/brand/{}/location/{}/delivery", brand_id, location_id);
        debug!("[ADAPTER] schedule brand={} location={}", brand_id, location_id);
        self.post(&path, serde_json::to_string(body)?).await
    }

    /// `POST /brand/{brandId}/delivery/{deliveryId}/cancel` — cancel a delivery.
    pub async fn cancel(
        &self,
        brand_id: &str,
        delivery_id: &str,
        body: &serde_json::Value,
    ) -> Result<CancelResponse> {
        if delivery_id.trim().is_empty() {
            anyhow::bail!("delivery id must not be empty");
        }
        let path = format!("/brand/{}/delivery/{}/cancel", brand_id, delivery_id);
        debug!("[ADAPTER] cancel brand={} delivery={}", brand_id, delivery_id);
        self.post(&path, serde_json::to_string(body)?).await
    }

    /// POST a raw body and hand back the status plus whatever JSON came back.
    ///
    /// Error-path tests use this to inspect 400/500 bodies (`errorMessage`,
    /// `errors`) without the typed methods bailing first.
    pub async fn post_raw(
        &self,
        path: &str,
        body: &str,
    ) -> Result<(reqwest::StatusCode, Option<serde_json::Value>)> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .post(&url)
            .header("channel-id", &self.config.channel_id)
            .header("sub-channel-id", &self.config.sub_channel_id)
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        Ok((status, serde_json::from_str(&text).ok()))
    }

    // ========================================================================
    // TRANSPORT
    // ========================================================================

    /// Generic POST with the channel headers, retrying on rate limit.
    async fn post<T: serde::de::DeserializeOwned>(&self, path: &str, body_json: String) -> Result<T> {
        let mut retries = 0;

        loop {
            let url = format!("{}{}", self.base_url, path);
            let resp = self
                .http
                .post(&url)
                .header("channel-id", &self.config.channel_id)
                .header("sub-channel-id", &self.config.sub_channel_id)
                .header("Content-Type", "application/json")
                .body(body_json.clone())
                .send()
                .await?;

            let status = resp.status();

            // Handle rate limit with exponential backoff
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                retries += 1;
                if retries > MAX_RETRIES {
                    anyhow::bail!("adapter rate limited after {} retries", MAX_RETRIES);
                }
                let backoff_ms = 500 * (1 << retries); // 1s, 2s, 4s
                debug!(
                    "[ADAPTER] Rate limited, backing off {}ms (retry {}/{})",
                    backoff_ms, retries, MAX_RETRIES
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                continue;
            }

            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                // Surface the adapter's own error message when the body has one
                if let Ok(err) = serde_json::from_str::<AdapterError>(&body) {
                    if let Some(message) = err.error_message {
                        anyhow::bail!("adapter error {}: {}", status, message);
                    }
                }
                anyhow::bail!("adapter error {}: {}", status, body);
            }

            let data: T = resp.json().await?;
            return Ok(data);
        }
    }
}
